//! History section records and their fixed catalog.

use super::RecordData;
use crate::error::RecordError;
use crate::store::Table;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The ten history sections every patient chart presents.
///
/// Declaration order is the catalog order; [`catalog_index`] relies on it,
/// as does the section layout in [`HistoryForm`](crate::forms::HistoryForm).
///
/// [`catalog_index`]: HistorySectionKind::catalog_index
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum HistorySectionKind {
    Complains,
    Examination,
    Investigations,
    TreatmentPlan,
    ServiceRequest,
    Education,
    MedicationRequest,
    MedicalReport,
    LabResults,
    RadiologyReports,
}

impl HistorySectionKind {
    /// Every section, in catalog order.
    pub const CATALOG: [Self; 10] = [
        Self::Complains,
        Self::Examination,
        Self::Investigations,
        Self::TreatmentPlan,
        Self::ServiceRequest,
        Self::Education,
        Self::MedicationRequest,
        Self::MedicalReport,
        Self::LabResults,
        Self::RadiologyReports,
    ];

    /// Stable identifier stored in the `section_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complains => "complains",
            Self::Examination => "examination",
            Self::Investigations => "investigations",
            Self::TreatmentPlan => "treatment_plan",
            Self::ServiceRequest => "service_request",
            Self::Education => "education",
            Self::MedicationRequest => "medication_request",
            Self::MedicalReport => "medical_report",
            Self::LabResults => "lab_results",
            Self::RadiologyReports => "radiology_reports",
        }
    }

    /// Human-facing section title.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Complains => "Complains & Visit Form",
            Self::Examination => "Examination",
            Self::Investigations => "Investigations & Reports",
            Self::TreatmentPlan => "Treatment Plan",
            Self::ServiceRequest => "Service Request",
            Self::Education => "Education",
            Self::MedicationRequest => "Medication Request",
            Self::MedicalReport => "Medical Report",
            Self::LabResults => "Lab Results",
            Self::RadiologyReports => "Radiology Reports",
        }
    }

    /// Position of this section within [`CATALOG`](Self::CATALOG).
    pub(crate) fn catalog_index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for HistorySectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HistorySectionKind {
    type Error = RecordError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::CATALOG
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| RecordError::InvalidInput(format!("unknown history section: {value}")))
    }
}

/// One editable history section: free text plus attachment references.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct HistorySection {
    pub content: String,
    /// References returned by the attachment store, in display order.
    pub image_urls: Vec<String>,
}

impl RecordData for HistorySection {
    const TABLE: Table = Table::History;
}
