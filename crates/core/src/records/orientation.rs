//! The orientation checklist singleton record.

use super::{RecordData, SingletonRecord};
use crate::store::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// The fixed orientation question catalog, in presentation order.
///
/// Ordering of the variants is load-bearing: it drives both the `Ord` used
/// by the questions map and the order assessments are presented in.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum OrientationQuestion {
    OrientedToPerson,
    OrientedToPlace,
    OrientedToTime,
    OrientedToSituation,
    RespondsToVerbalCommands,
    FollowsSimpleInstructions,
    RecognizesFamilyMembers,
    AwareOfMedicalCondition,
    UnderstandsTreatmentPlan,
    AppropriateEmotionalResponse,
}

impl OrientationQuestion {
    /// Every question, in presentation order.
    pub const CATALOG: [Self; 10] = [
        Self::OrientedToPerson,
        Self::OrientedToPlace,
        Self::OrientedToTime,
        Self::OrientedToSituation,
        Self::RespondsToVerbalCommands,
        Self::FollowsSimpleInstructions,
        Self::RecognizesFamilyMembers,
        Self::AwareOfMedicalCondition,
        Self::UnderstandsTreatmentPlan,
        Self::AppropriateEmotionalResponse,
    ];
}

/// One yes/no answer per catalog question, stored as a single JSON column.
///
/// A fresh draft answers every question `false`, and rows written before a
/// question joined the catalog are repaired the same way on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct OrientationAssessment {
    #[schema(value_type = Object)]
    pub questions: BTreeMap<OrientationQuestion, bool>,
}

impl Default for OrientationAssessment {
    fn default() -> Self {
        Self {
            questions: OrientationQuestion::CATALOG
                .iter()
                .map(|question| (*question, false))
                .collect(),
        }
    }
}

impl RecordData for OrientationAssessment {
    const TABLE: Table = Table::Orientation;

    fn normalise(&mut self) {
        for question in OrientationQuestion::CATALOG {
            self.questions.entry(question).or_insert(false);
        }
    }
}

impl SingletonRecord for OrientationAssessment {}
