//! The multi-section patient history form.

use super::DirtyFlag;
use crate::config::CoreContext;
use crate::error::{RecordError, RecordResult};
use crate::records::{HistorySection, HistorySectionKind, RecordData};
use crate::store::{row_id, Filter, Table};
use crate::upsert::save_record;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

const SECTION_COUNT: usize = HistorySectionKind::CATALOG.len();

/// Per-section draft state: the row id once known, the draft being edited
/// and the snapshot last synced from storage.
#[derive(Clone, Debug, Default)]
struct SectionSlot {
    record_id: Option<Uuid>,
    draft: HistorySection,
    snapshot: HistorySection,
}

impl SectionSlot {
    fn diverged(&self) -> bool {
        self.draft != self.snapshot
    }
}

/// Draft state for every history section of one patient.
///
/// Loading materialises the full catalog regardless of which rows exist, so
/// callers can edit any section without probing for its row first. Sections
/// are edited and saved independently: saving one section writes exactly one
/// row and never touches another section's slot. The form-level dirty flag
/// is the OR of every section's divergence.
pub struct HistoryForm {
    ctx: Arc<CoreContext>,
    patient_id: Uuid,
    slots: [SectionSlot; SECTION_COUNT],
    flag: DirtyFlag,
}

impl HistoryForm {
    /// Load every stored history row for the patient into its catalog slot.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Consistency`] when a stored row carries an
    /// unknown `section_type` or when two rows claim the same section, and
    /// [`RecordError::Persistence`] when storage cannot be read.
    pub(crate) async fn load(ctx: Arc<CoreContext>, patient_id: Uuid) -> RecordResult<Self> {
        let rows = ctx
            .select(
                Table::History,
                vec![Filter::eq("patient_id", patient_id.to_string())],
            )
            .await?;

        let mut slots: [SectionSlot; SECTION_COUNT] =
            std::array::from_fn(|_| SectionSlot::default());
        for row in &rows {
            let raw_kind = row.get("section_type").and_then(Value::as_str).ok_or_else(|| {
                RecordError::Consistency(format!(
                    "history row for patient {patient_id} is missing its section_type"
                ))
            })?;
            let kind = HistorySectionKind::try_from(raw_kind).map_err(|_| {
                RecordError::Consistency(format!(
                    "history row for patient {patient_id} has unknown section_type \"{raw_kind}\""
                ))
            })?;

            let slot = &mut slots[kind.catalog_index()];
            if slot.record_id.is_some() {
                return Err(RecordError::Consistency(format!(
                    "patient {patient_id} has more than one {kind} history row"
                )));
            }
            slot.record_id = Some(row_id(row)?);
            slot.draft = HistorySection::from_row(row)?;
            slot.snapshot = slot.draft.clone();
        }

        Ok(Self {
            ctx,
            patient_id,
            slots,
            flag: DirtyFlag::new(),
        })
    }

    pub fn patient_id(&self) -> Uuid {
        self.patient_id
    }

    /// The draft for one section.
    pub fn section(&self, kind: HistorySectionKind) -> &HistorySection {
        &self.slots[kind.catalog_index()].draft
    }

    /// The row id backing one section, once known.
    pub fn record_id(&self, kind: HistorySectionKind) -> Option<Uuid> {
        self.slots[kind.catalog_index()].record_id
    }

    /// Every section draft, in catalog order.
    pub fn sections(&self) -> impl Iterator<Item = (HistorySectionKind, &HistorySection)> + '_ {
        HistorySectionKind::CATALOG
            .iter()
            .map(move |kind| (*kind, self.section(*kind)))
    }

    /// Mutate one section's draft and recompute the form's dirtiness.
    pub fn edit_section(
        &mut self,
        kind: HistorySectionKind,
        mutate: impl FnOnce(&mut HistorySection),
    ) {
        mutate(&mut self.slots[kind.catalog_index()].draft);
        self.flag.set(self.any_diverged());
    }

    /// Whether one section's draft differs from its snapshot.
    pub fn is_section_dirty(&self, kind: HistorySectionKind) -> bool {
        self.slots[kind.catalog_index()].diverged()
    }

    /// Whether any section diverges from its snapshot.
    pub fn is_dirty(&self) -> bool {
        self.flag.is_dirty()
    }

    /// Handle for the hosting shell to watch.
    pub fn dirty_flag(&self) -> DirtyFlag {
        self.flag.clone()
    }

    /// Persist one section, leaving every other section untouched.
    ///
    /// Follows the same insert-or-update rules as a singleton form, keyed by
    /// the `(patient_id, section_type)` pair. On success the section's slot
    /// resets to the persisted copy; other sections keep their drafts,
    /// snapshots and dirtiness exactly as they were.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Persistence`] when storage rejects the save
    /// after retries, and [`RecordError::Consistency`] when conflict
    /// recovery cannot resolve a single existing row.
    pub async fn save_section(&mut self, kind: HistorySectionKind) -> RecordResult<()> {
        let index = kind.catalog_index();
        let (record_id, draft) = {
            let slot = &self.slots[index];
            (slot.record_id, slot.draft.clone())
        };
        let keys = vec![
            Filter::eq("patient_id", self.patient_id.to_string()),
            Filter::eq("section_type", kind.as_str()),
        ];
        let saved = save_record(&self.ctx, record_id, &keys, &draft).await?;

        let slot = &mut self.slots[index];
        slot.record_id = Some(saved.id);
        slot.draft = saved.record.clone();
        slot.snapshot = saved.record;
        self.flag.set(self.any_diverged());
        Ok(())
    }

    fn any_diverged(&self) -> bool {
        self.slots.iter().any(SectionSlot::diverged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::numbers::DailySequenceSource;
    use crate::store::{MemoryStore, QueryClient};
    use serde_json::json;
    use std::time::Duration;

    fn store_and_context() -> (Arc<MemoryStore>, Arc<CoreContext>) {
        let store = Arc::new(MemoryStore::new());
        let ctx = Arc::new(CoreContext::new(
            Arc::clone(&store) as Arc<dyn QueryClient>,
            Arc::new(DailySequenceSource::new()),
            RetryPolicy::new(2, Duration::from_millis(1), Duration::from_secs(1))
                .expect("valid test policy"),
        ));
        (store, ctx)
    }

    async fn seed_history_row(store: &MemoryStore, patient_id: Uuid, body: Value) {
        let Value::Object(row) = body else {
            panic!("seeded row must be an object");
        };
        let mut row = row;
        row.insert("patient_id".into(), json!(patient_id.to_string()));
        store.insert_unchecked(Table::History, row).await;
    }

    #[tokio::test]
    async fn loading_prepopulates_the_full_catalog() {
        let (_, ctx) = store_and_context();
        let form = HistoryForm::load(ctx, Uuid::new_v4())
            .await
            .expect("load should succeed");

        let sections: Vec<_> = form.sections().collect();
        assert_eq!(sections.len(), HistorySectionKind::CATALOG.len());
        for (kind, draft) in sections {
            assert_eq!(draft, &HistorySection::default(), "{kind} starts blank");
            assert_eq!(form.record_id(kind), None);
        }
        assert!(!form.is_dirty());
    }

    #[tokio::test]
    async fn saving_one_section_writes_only_that_row() {
        let (store, ctx) = store_and_context();
        let patient_id = Uuid::new_v4();
        let mut form = HistoryForm::load(ctx, patient_id)
            .await
            .expect("load should succeed");

        form.edit_section(HistorySectionKind::Examination, |section| {
            section.content = "unremarkable".into();
        });
        form.save_section(HistorySectionKind::Examination)
            .await
            .expect("save should insert");

        let rows = store
            .select(
                Table::History,
                &[Filter::eq("patient_id", patient_id.to_string())],
            )
            .await
            .expect("select should succeed");
        assert_eq!(rows.len(), 1, "exactly one section row exists");
        assert_eq!(rows[0].get("section_type"), Some(&json!("examination")));
        assert_eq!(rows[0].get("content"), Some(&json!("unremarkable")));
    }

    #[tokio::test]
    async fn sections_save_independently() {
        let (store, ctx) = store_and_context();
        let patient_id = Uuid::new_v4();
        let mut form = HistoryForm::load(ctx, patient_id)
            .await
            .expect("load should succeed");

        form.edit_section(HistorySectionKind::Examination, |section| {
            section.content = "stable".into();
        });
        form.save_section(HistorySectionKind::Examination)
            .await
            .expect("first section should save");

        form.edit_section(HistorySectionKind::LabResults, |section| {
            section.content = "pending cultures".into();
        });
        form.save_section(HistorySectionKind::LabResults)
            .await
            .expect("second section should save");

        let examination = store
            .select(
                Table::History,
                &[
                    Filter::eq("patient_id", patient_id.to_string()),
                    Filter::eq("section_type", "examination"),
                ],
            )
            .await
            .expect("select should succeed");
        assert_eq!(examination.len(), 1);
        assert_eq!(
            examination[0].get("content"),
            Some(&json!("stable")),
            "saving lab results must not rewrite the examination row"
        );

        let all = store
            .select(
                Table::History,
                &[Filter::eq("patient_id", patient_id.to_string())],
            )
            .await
            .expect("select should succeed");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn dirtiness_is_tracked_per_section_and_for_the_whole_form() {
        let (_, ctx) = store_and_context();
        let mut form = HistoryForm::load(ctx, Uuid::new_v4())
            .await
            .expect("load should succeed");

        form.edit_section(HistorySectionKind::Complains, |section| {
            section.content = "headache for two days".into();
        });
        assert!(form.is_section_dirty(HistorySectionKind::Complains));
        assert!(!form.is_section_dirty(HistorySectionKind::Education));
        assert!(form.is_dirty(), "one dirty section dirties the form");

        form.save_section(HistorySectionKind::Complains)
            .await
            .expect("save should succeed");
        assert!(!form.is_section_dirty(HistorySectionKind::Complains));
        assert!(!form.is_dirty(), "saving the only dirty section cleans it");
    }

    #[tokio::test]
    async fn saving_one_section_keeps_another_dirty() {
        let (_, ctx) = store_and_context();
        let mut form = HistoryForm::load(ctx, Uuid::new_v4())
            .await
            .expect("load should succeed");

        form.edit_section(HistorySectionKind::Complains, |section| {
            section.content = "headache".into();
        });
        form.edit_section(HistorySectionKind::TreatmentPlan, |section| {
            section.content = "rest and fluids".into();
        });
        form.save_section(HistorySectionKind::Complains)
            .await
            .expect("save should succeed");

        assert!(!form.is_section_dirty(HistorySectionKind::Complains));
        assert!(form.is_section_dirty(HistorySectionKind::TreatmentPlan));
        assert!(form.is_dirty(), "unsaved edits elsewhere keep the form dirty");
    }

    #[tokio::test]
    async fn stored_rows_are_loaded_into_their_slots() {
        let (store, ctx) = store_and_context();
        let patient_id = Uuid::new_v4();
        seed_history_row(
            &store,
            patient_id,
            json!({ "section_type": "lab_results", "content": "HbA1c 6.1", "image_urls": [] }),
        )
        .await;

        let form = HistoryForm::load(ctx, patient_id)
            .await
            .expect("load should succeed");
        assert_eq!(form.section(HistorySectionKind::LabResults).content, "HbA1c 6.1");
        assert!(form.record_id(HistorySectionKind::LabResults).is_some());
        assert_eq!(form.section(HistorySectionKind::Complains).content, "");
        assert!(!form.is_dirty());
    }

    #[tokio::test]
    async fn image_references_survive_the_save() {
        let (_, ctx) = store_and_context();
        let patient_id = Uuid::new_v4();
        let mut form = HistoryForm::load(Arc::clone(&ctx), patient_id)
            .await
            .expect("load should succeed");

        form.edit_section(HistorySectionKind::RadiologyReports, |section| {
            section.content = "chest x-ray".into();
            section
                .image_urls
                .push(format!("{patient_id}/scan-frontal.png"));
        });
        form.save_section(HistorySectionKind::RadiologyReports)
            .await
            .expect("save should succeed");

        let reloaded = HistoryForm::load(ctx, patient_id)
            .await
            .expect("reload should succeed");
        assert_eq!(
            reloaded.section(HistorySectionKind::RadiologyReports).image_urls,
            vec![format!("{patient_id}/scan-frontal.png")]
        );
    }

    #[tokio::test]
    async fn duplicate_section_rows_fail_the_load_loudly() {
        let (store, ctx) = store_and_context();
        let patient_id = Uuid::new_v4();
        for _ in 0..2 {
            seed_history_row(
                &store,
                patient_id,
                json!({ "section_type": "examination", "content": "" }),
            )
            .await;
        }

        let result = HistoryForm::load(ctx, patient_id).await;
        assert!(matches!(result, Err(RecordError::Consistency(_))));
    }

    #[tokio::test]
    async fn unknown_section_types_fail_the_load_loudly() {
        let (store, ctx) = store_and_context();
        let patient_id = Uuid::new_v4();
        seed_history_row(
            &store,
            patient_id,
            json!({ "section_type": "surgery", "content": "" }),
        )
        .await;

        let result = HistoryForm::load(ctx, patient_id).await;
        assert!(matches!(result, Err(RecordError::Consistency(_))));
    }
}
