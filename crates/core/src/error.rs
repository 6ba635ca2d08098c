use crate::store::StoreError;

/// Errors surfaced by record operations.
///
/// Not-found is deliberately absent: lookups that legitimately match zero
/// rows return `Ok(None)` so callers cannot confuse "nothing there" with a
/// failed query.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A storage-boundary failure. The underlying message is passed through
    /// verbatim so the user-visible layer can show exactly what went wrong.
    #[error(transparent)]
    Persistence(#[from] StoreError),
    /// Stored data breaks an invariant the record model relies on, such as
    /// two rows where singleton semantics are assumed.
    #[error("data consistency violation: {0}")]
    Consistency(String),
    #[error("failed to serialise record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialise record: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to store attachment: {0}")]
    Attachment(std::io::Error),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;

impl From<ward_types::TextError> for RecordError {
    fn from(err: ward_types::TextError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<ward_types::AgeError> for RecordError {
    fn from(err: ward_types::AgeError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
