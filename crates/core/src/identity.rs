//! Patient identity resolution.
//!
//! Establishes the active patient, either by registering a new one or by
//! resolving the human-facing patient number staff search with. The
//! resolved [`Patient`] is then handed to
//! [`PatientChart::open`](crate::chart::PatientChart::open), which scopes
//! every record form to that patient's id.

use crate::config::CoreContext;
use crate::error::{RecordError, RecordResult};
use crate::records::{decode_row, NewPatient, Patient};
use crate::store::{Filter, Row, Table};
use serde::ser::Error as _;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Registers patients and resolves them by number or id.
#[derive(Clone)]
pub struct IdentityService {
    ctx: Arc<CoreContext>,
}

impl IdentityService {
    pub fn new(ctx: Arc<CoreContext>) -> Self {
        Self { ctx }
    }

    /// Register a new patient.
    ///
    /// Requests a fresh number from the configured source and inserts the
    /// patient row in one go. The input types already guarantee a non-empty
    /// name and an in-range age.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Persistence`] when number generation or the
    /// insert fails, including the never-expected case of the storage layer
    /// reporting the generated number as already taken.
    pub async fn register(&self, request: NewPatient) -> RecordResult<Patient> {
        let number = self.ctx.next_number().await?;
        let mut row = match serde_json::to_value(&request).map_err(RecordError::Serialization)? {
            Value::Object(map) => map,
            _ => {
                return Err(RecordError::Serialization(serde_json::Error::custom(
                    "registration request did not serialise to an object",
                )))
            }
        };
        row.insert("patient_number".into(), Value::String(number));

        let stored = self.ctx.insert(Table::Patients, row).await?;
        let patient: Patient = decode_row(&stored)?;
        tracing::info!(
            patient_id = %patient.id,
            patient_number = %patient.patient_number,
            "registered patient"
        );
        Ok(patient)
    }

    /// Resolve a patient by the human-facing number.
    ///
    /// The lookup is an exact, case-sensitive match after trimming
    /// surrounding whitespace. Zero matches is a legitimate outcome and
    /// returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// * [`RecordError::InvalidInput`] when the trimmed number is empty.
    /// * [`RecordError::Consistency`] when more than one patient carries the
    ///   number, which the unique constraint should make impossible.
    /// * [`RecordError::Persistence`] on storage failure.
    pub async fn find_by_number(&self, number: &str) -> RecordResult<Option<Patient>> {
        let trimmed = number.trim();
        if trimmed.is_empty() {
            return Err(RecordError::InvalidInput(
                "patient number cannot be empty".into(),
            ));
        }
        let rows = self
            .ctx
            .select(Table::Patients, vec![Filter::eq("patient_number", trimmed)])
            .await?;
        single_patient(rows, &format!("patient number {trimmed}"))
    }

    /// Resolve a patient by row id.
    ///
    /// Stateless boundaries re-establish the active patient per request
    /// with this before touching any record table.
    pub async fn find_by_id(&self, id: Uuid) -> RecordResult<Option<Patient>> {
        let rows = self
            .ctx
            .select(Table::Patients, vec![Filter::eq("id", id.to_string())])
            .await?;
        single_patient(rows, &format!("patient id {id}"))
    }
}

fn single_patient(rows: Vec<Row>, lookup: &str) -> RecordResult<Option<Patient>> {
    match rows.as_slice() {
        [] => Ok(None),
        [row] => Ok(Some(decode_row(row)?)),
        many => Err(RecordError::Consistency(format!(
            "{} patient rows match {lookup}",
            many.len()
        ))),
    }
}
