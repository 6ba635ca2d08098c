//! The admission and discharge singleton record.

use super::{blank_enum, RecordData, SingletonRecord};
use crate::store::Table;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How a stay ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DischargeType {
    Normal,
    Escape,
    Death,
    Other,
}

/// Admission and discharge metadata, one row per patient.
///
/// Date and time columns persist as explicit null while the stay is still
/// open; the discharge type is a legacy text column holding `""` until a
/// discharge is recorded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AdmissionDischarge {
    pub admission_date: Option<NaiveDate>,
    pub admission_time: Option<NaiveTime>,
    pub admission_reason: String,
    pub admission_department: String,
    pub admission_room: String,
    pub admission_bed: String,
    pub admission_doctor: String,
    pub admission_employee_name: String,
    pub admission_employee_date: Option<NaiveDate>,
    pub discharge_date: Option<NaiveDate>,
    pub discharge_time: Option<NaiveTime>,
    #[serde(with = "blank_enum")]
    pub discharge_type: Option<DischargeType>,
    pub discharge_reason: String,
    pub discharge_diagnosis: String,
    pub discharge_treatment: String,
    pub discharge_condition: String,
    pub discharge_instructions: String,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_location: String,
    pub discharge_doctor: String,
    pub discharge_employee_name: String,
    pub discharge_employee_date: Option<NaiveDate>,
    pub transfer_location: String,
    pub notes: String,
}

impl RecordData for AdmissionDischarge {
    const TABLE: Table = Table::AdmissionDischarge;
}

impl SingletonRecord for AdmissionDischarge {}
