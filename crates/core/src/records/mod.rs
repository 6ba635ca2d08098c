//! Typed schemas for every persisted record.
//!
//! Records cross the storage boundary as JSON rows; each schema here knows
//! its table and converts itself both ways. Decoding strips explicit nulls
//! first so the struct-level defaults absorb them: missing and null text
//! both land as `""` in a draft, absent dates stay `None`. Encoding is the
//! mirror image required by the persistence contract: optional text is
//! written as `""`, optional dates and times as explicit JSON `null`.

mod admission;
mod history;
mod orientation;
mod patient;
mod personal_data;

pub use admission::{AdmissionDischarge, DischargeType};
pub use history::{HistorySection, HistorySectionKind};
pub use orientation::{OrientationAssessment, OrientationQuestion};
pub use patient::{Gender, NewPatient, Patient};
pub use personal_data::{MaritalStatus, PersonalData, Sex};

use crate::error::{RecordError, RecordResult};
use crate::store::{Row, Table};
use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::Serialize;
use serde_json::Value;

/// A record schema bound to its storage table.
///
/// `Default` doubles as the empty draft for a patient with no stored row,
/// and `PartialEq` is what dirty tracking compares drafts against snapshots
/// with, so both must cover every field.
pub trait RecordData:
    Clone + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync
{
    /// The table rows of this type live in.
    const TABLE: Table;

    /// Encode the record as a storage row.
    fn to_row(&self) -> RecordResult<Row> {
        match serde_json::to_value(self).map_err(RecordError::Serialization)? {
            Value::Object(map) => Ok(map),
            _ => Err(RecordError::Serialization(serde_json::Error::custom(
                "record did not serialise to an object",
            ))),
        }
    }

    /// Decode a storage row, normalising nulls into field defaults.
    fn from_row(row: &Row) -> RecordResult<Self> {
        let mut record: Self = decode_row(row)?;
        record.normalise();
        Ok(record)
    }

    /// Repair gaps a stored row may legitimately have, such as orientation
    /// questions added to the catalog after the row was written.
    fn normalise(&mut self) {}
}

/// Marker for record types with at most one intended row per patient.
pub trait SingletonRecord: RecordData {}

/// Deserialise any typed value from a row, ignoring envelope columns and
/// treating explicit nulls as absent.
pub(crate) fn decode_row<T: DeserializeOwned>(row: &Row) -> RecordResult<T> {
    let mut cleaned = Row::new();
    for (column, value) in row {
        if !value.is_null() {
            cleaned.insert(column.clone(), value.clone());
        }
    }
    serde_json::from_value(Value::Object(cleaned)).map_err(RecordError::Deserialization)
}

/// Serde codec for optional enums persisted in legacy text columns.
///
/// The columns hold `""` when no choice was made, so `None` must encode as
/// an empty string and both `""` and `null` must decode back to `None`.
pub(crate) mod blank_enum {
    use serde::de::{DeserializeOwned, Error as _, IntoDeserializer};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        let raw = match Option::<String>::deserialize(deserializer)? {
            None => return Ok(None),
            Some(raw) => raw,
        };
        if raw.is_empty() {
            return Ok(None);
        }
        T::deserialize(serde_json::Value::String(raw).into_deserializer())
            .map(Some)
            .map_err(D::Error::custom)
    }
}
