//! Generic form over a singleton-per-patient record.

use super::DirtyFlag;
use crate::config::CoreContext;
use crate::error::{RecordError, RecordResult};
use crate::records::SingletonRecord;
use crate::store::{row_id, Filter};
use crate::upsert::save_record;
use std::sync::Arc;
use uuid::Uuid;

/// Draft state for a record type with at most one row per patient.
///
/// Loading materialises a draft immediately: the stored row when one exists,
/// the type's default otherwise, so a patient with no saved data still gets
/// an editable form. Edits go through [`edit`](Self::edit) so the dirty flag
/// tracks every mutation, and [`save`](Self::save) upserts the draft and
/// resets the snapshot. Saving takes `&mut self`, so a second submission
/// cannot start while one is already in flight.
pub struct SingletonForm<R: SingletonRecord> {
    ctx: Arc<CoreContext>,
    patient_id: Uuid,
    record_id: Option<Uuid>,
    draft: R,
    snapshot: R,
    flag: DirtyFlag,
}

impl<R: SingletonRecord> SingletonForm<R> {
    /// Load the form for one patient.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Consistency`] when the patient has more than
    /// one row in a table meant to hold one, and
    /// [`RecordError::Persistence`] when storage cannot be read.
    pub(crate) async fn load(ctx: Arc<CoreContext>, patient_id: Uuid) -> RecordResult<Self> {
        let rows = ctx
            .select(
                R::TABLE,
                vec![Filter::eq("patient_id", patient_id.to_string())],
            )
            .await?;
        let (record_id, draft) = match rows.as_slice() {
            [] => (None, R::default()),
            [row] => (Some(row_id(row)?), R::from_row(row)?),
            many => {
                return Err(RecordError::Consistency(format!(
                    "expected at most one {} row for patient {patient_id}, found {}",
                    R::TABLE,
                    many.len()
                )))
            }
        };
        Ok(Self {
            ctx,
            patient_id,
            record_id,
            snapshot: draft.clone(),
            draft,
            flag: DirtyFlag::new(),
        })
    }

    pub fn patient_id(&self) -> Uuid {
        self.patient_id
    }

    /// The row id backing this form, once one is known.
    pub fn record_id(&self) -> Option<Uuid> {
        self.record_id
    }

    /// The draft being edited.
    pub fn draft(&self) -> &R {
        &self.draft
    }

    /// Mutate the draft and recompute dirtiness.
    ///
    /// Dirtiness is structural divergence, not edit history: editing a field
    /// back to its snapshot value makes the form clean again.
    pub fn edit(&mut self, mutate: impl FnOnce(&mut R)) {
        mutate(&mut self.draft);
        self.flag.set(self.draft != self.snapshot);
    }

    /// Replace the whole draft, as a boundary layer does when it receives a
    /// full submitted field set.
    pub fn set_draft(&mut self, draft: R) {
        self.edit(|current| *current = draft);
    }

    pub fn is_dirty(&self) -> bool {
        self.flag.is_dirty()
    }

    /// Handle for the hosting shell to watch.
    pub fn dirty_flag(&self) -> DirtyFlag {
        self.flag.clone()
    }

    /// Persist the draft.
    ///
    /// Inserts when no row id is known and updates otherwise; losing a
    /// create race to a concurrent saver is recovered as an update of the
    /// winner's row. On success the captured id is retained, the snapshot
    /// resets to the persisted copy and the form reads clean. On failure the
    /// draft and flag are left untouched so the user can retry.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Persistence`] when storage rejects the save
    /// after retries, and [`RecordError::Consistency`] when conflict
    /// recovery cannot resolve a single existing row.
    pub async fn save(&mut self) -> RecordResult<()> {
        let keys = vec![Filter::eq("patient_id", self.patient_id.to_string())];
        let saved = save_record(&self.ctx, self.record_id, &keys, &self.draft).await?;
        self.record_id = Some(saved.id);
        self.draft = saved.record.clone();
        self.snapshot = saved.record;
        self.flag.set(false);
        Ok(())
    }
}
