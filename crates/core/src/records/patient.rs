//! Patient identity records.

use crate::error::RecordResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use ward_types::{Age, NonEmptyText};

/// Patient gender as captured at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity root every per-patient record hangs off.
///
/// Created exactly once at registration and never mutated through modelled
/// flows. The `patient_number` is the human-facing identifier staff search
/// by; `id` is what record rows reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    pub id: Uuid,
    /// Unique, immutable, formatted `PT-YYYYMMDD-NNNN`.
    pub patient_number: String,
    #[schema(value_type = String)]
    pub full_name: NonEmptyText,
    #[schema(value_type = u16)]
    pub age: Age,
    pub gender: Gender,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated attributes for registering a new patient.
///
/// Holding [`NonEmptyText`] and [`Age`] means a `NewPatient` cannot exist
/// with an empty name or an out-of-range age, so registration never has to
/// re-check what the constructor already proved.
#[derive(Clone, Debug, Serialize)]
pub struct NewPatient {
    pub full_name: NonEmptyText,
    pub age: Age,
    pub gender: Gender,
}

impl NewPatient {
    /// Validate raw registration input.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidInput`](crate::error::RecordError) when
    /// the name is blank or the age falls outside the accepted range.
    pub fn new(full_name: &str, age: u16, gender: Gender) -> RecordResult<Self> {
        Ok(Self {
            full_name: NonEmptyText::new(full_name)?,
            age: Age::new(age)?,
            gender,
        })
    }
}
