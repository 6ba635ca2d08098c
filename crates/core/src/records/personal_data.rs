//! The personal data singleton record.

use super::{blank_enum, RecordData, SingletonRecord};
use crate::store::Table;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Administrative sex as recorded in the patient file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// Marital status as recorded in the patient file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    Single,
    Married,
}

/// Flat demographic and contact details, one row per patient.
///
/// Text fields default to an empty string so a fresh draft renders without
/// nulls; the two enum-backed columns are legacy text columns that hold `""`
/// when no choice was made, and the date columns persist as explicit null
/// when absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PersonalData {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub file_number: String,
    pub id_number: String,
    #[serde(with = "blank_enum")]
    pub sex: Option<Sex>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: String,
    #[serde(with = "blank_enum")]
    pub marital_status: Option<MaritalStatus>,
    pub city: String,
    pub area: String,
    pub street: String,
    pub home_number: String,
    pub mobile: String,
    pub telephone: String,
    pub registration_date: Option<NaiveDate>,
    pub data_register_name: String,
    pub relative_name: String,
    pub relative_relation: String,
    pub relative_phone: String,
    pub relative_city: String,
    pub relative_area: String,
    pub relative_street: String,
    pub relative_home_number: String,
    pub relative_mobile: String,
}

impl RecordData for PersonalData {
    const TABLE: Table = Table::PersonalData;
}

impl SingletonRecord for PersonalData {}
