//! Storage boundary for patient records.
//!
//! The hosted database is modelled as an opaque relational service reached
//! through [`QueryClient`]: equality-filtered selects, inserts that assign
//! ids, and full-row updates keyed by id. Rows travel as JSON objects so the
//! boundary stays schema-agnostic; typed record structs encode and decode
//! themselves via [`RecordData`](crate::records::RecordData).
//!
//! Uniqueness lives here, not in callers. Every table declares the key sets
//! the storage layer must enforce, and an insert that collides reports
//! [`StoreError::UniqueViolation`] so the upsert coordinator can recover by
//! retrying as an update.

pub mod memory;

use crate::config::RetryPolicy;
use crate::error::{RecordError, RecordResult};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use uuid::Uuid;

pub use memory::MemoryStore;

/// A record row as it crosses the storage boundary.
pub type Row = serde_json::Map<String, Value>;

/// The closed set of tables this system persists to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Patients,
    PersonalData,
    History,
    Orientation,
    AdmissionDischarge,
}

impl Table {
    /// The table name as the relational service knows it.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Patients => "patients",
            Table::PersonalData => "patient_personal_data",
            Table::History => "patient_history",
            Table::Orientation => "general_patient_orientation",
            Table::AdmissionDischarge => "admissions_discharge",
        }
    }

    /// Column sets that must be unique within this table.
    ///
    /// Singleton record tables key on `patient_id`; the history table keys
    /// on the `(patient_id, section_type)` pair; patients key on the
    /// human-facing number.
    pub fn unique_key_sets(&self) -> &'static [&'static [&'static str]] {
        match self {
            Table::Patients => &[&["patient_number"]],
            Table::PersonalData | Table::Orientation | Table::AdmissionDischarge => {
                &[&["patient_id"]]
            }
            Table::History => &[&["patient_id", "section_type"]],
        }
    }

    /// Constraint name in the `<table>_<columns>_key` convention, matching
    /// what a relational service reports on violation.
    pub fn constraint_name(&self, columns: &[&str]) -> String {
        format!("{}_{}_key", self.name(), columns.join("_"))
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An exact-match equality filter, ANDed with its siblings in a select.
#[derive(Clone, Debug)]
pub struct Filter {
    column: String,
    value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub(crate) fn matches(&self, row: &Row) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

/// Errors reported by the storage boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An insert or update collided with an existing row on a unique key.
    #[error("duplicate key value violates unique constraint \"{constraint}\"")]
    UniqueViolation { constraint: String },
    /// An update referenced an id that no longer exists.
    #[error("no row with id {id} in table {table}")]
    RowNotFound { table: Table, id: Uuid },
    /// The service could not be reached, or did not answer in time.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The service rejected the operation itself.
    #[error("query failure: {0}")]
    Query(String),
}

impl StoreError {
    /// Whether a retry could plausibly change the outcome.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transport(_))
    }
}

/// Generic query client over the relational storage service.
///
/// Implementations must honour the uniqueness declarations of
/// [`Table::unique_key_sets`] and assign `id`, `created_at` and `updated_at`
/// on insert. All operations are whole-row: `update` replaces the payload
/// fields in one shot, never merging field by field elsewhere.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Return every row matching all `filters`.
    async fn select(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, StoreError>;

    /// Store a new row and return it with its assigned id and timestamps.
    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError>;

    /// Replace the payload fields of the row with the given id.
    async fn update(&self, table: Table, id: Uuid, row: Row) -> Result<Row, StoreError>;
}

/// Extract the id a storage implementation assigned to a row.
pub(crate) fn row_id(row: &Row) -> RecordResult<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| RecordError::Consistency("stored row is missing a valid id".into()))
}

/// Run a storage call under the retry policy.
///
/// Each attempt is bounded by the policy's request timeout; a timeout counts
/// as a transport fault. Transient faults back off linearly and retry until
/// the attempt budget is spent; all other errors return immediately.
pub(crate) async fn with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut call: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt: u32 = 1;
    loop {
        let outcome = match tokio::time::timeout(policy.request_timeout(), call()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Transport(format!(
                "{operation} timed out after {}ms",
                policy.request_timeout().as_millis()
            ))),
        };
        match outcome {
            Err(err) if err.is_transient() && attempt < policy.max_attempts() => {
                tracing::warn!(
                    error = %err,
                    attempt,
                    operation,
                    "transient storage failure, backing off before retrying"
                );
                tokio::time::sleep(policy.backoff_delay(attempt)).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}
