//! # Ward Core
//!
//! Core business logic for the ward patient record system.
//!
//! This crate contains the record model and the rules that keep it sound:
//! - Patient identity: registration with generated patient numbers and
//!   lookup by number
//! - Per-patient record forms with draft/snapshot dirty tracking
//! - Insert-versus-update coordination, including recovery when a create
//!   race is lost to a concurrent saver
//! - A storage boundary ([`store::QueryClient`]) with uniqueness enforced
//!   per table and bounded retries for transient faults
//!
//! **No API concerns**: HTTP servers, request envelopes and OpenAPI belong
//! in `api-rest`.

pub mod attachments;
pub mod chart;
pub mod config;
pub mod error;
pub mod forms;
pub mod identity;
pub mod numbers;
pub mod records;
pub mod store;

mod upsert;

pub use chart::PatientChart;
pub use config::{CoreContext, RetryPolicy};
pub use error::{RecordError, RecordResult};
pub use forms::{DirtyFlag, HistoryForm, SingletonForm};
pub use identity::IdentityService;
pub use records::{
    AdmissionDischarge, DischargeType, Gender, HistorySection, HistorySectionKind, MaritalStatus,
    NewPatient, OrientationAssessment, OrientationQuestion, Patient, PersonalData, Sex,
};
