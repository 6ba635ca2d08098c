//! The upsert coordinator.
//!
//! Decides INSERT versus UPDATE per record: a known row id always updates,
//! otherwise the record is inserted with its identifying keys. An insert
//! that loses the load-then-insert race fails on the storage layer's unique
//! constraint; the coordinator recovers by re-selecting the winner's row by
//! the same keys and updating it, so racing saves converge on one row
//! instead of duplicating it or failing the user.

use crate::config::CoreContext;
use crate::error::{RecordError, RecordResult};
use crate::records::RecordData;
use crate::store::{row_id, Filter, StoreError};
use uuid::Uuid;

/// Outcome of a successful save.
pub(crate) struct SavedRecord<R> {
    /// Row id now bound to the record.
    pub id: Uuid,
    /// The persisted copy, read back from the stored row.
    pub record: R,
}

/// Persist one record, inserting or updating as the known id dictates.
///
/// `keys` are the identifying columns (patient id, plus section type for
/// history rows). They are merged into the payload so inserts and updates
/// both carry the full field set; updates are whole-row replacements, never
/// field-by-field merges.
pub(crate) async fn save_record<R: RecordData>(
    ctx: &CoreContext,
    record_id: Option<Uuid>,
    keys: &[Filter],
    record: &R,
) -> RecordResult<SavedRecord<R>> {
    let mut row = record.to_row()?;
    for key in keys {
        row.insert(key.column().to_owned(), key.value().clone());
    }

    let id = match record_id {
        Some(id) => id,
        None => match ctx.insert(R::TABLE, row.clone()).await {
            Ok(stored) => {
                return Ok(SavedRecord {
                    id: row_id(&stored)?,
                    record: R::from_row(&stored)?,
                })
            }
            Err(StoreError::UniqueViolation { constraint }) => {
                tracing::warn!(
                    %constraint,
                    table = %R::TABLE,
                    "insert lost a create race, retrying as an update"
                );
                adopt_existing_row::<R>(ctx, keys, &constraint).await?
            }
            Err(other) => return Err(other.into()),
        },
    };

    let stored = ctx.update(R::TABLE, id, row).await?;
    Ok(SavedRecord {
        id,
        record: R::from_row(&stored)?,
    })
}

/// After a unique violation, resolve the row that won the race.
async fn adopt_existing_row<R: RecordData>(
    ctx: &CoreContext,
    keys: &[Filter],
    constraint: &str,
) -> RecordResult<Uuid> {
    let rows = ctx.select(R::TABLE, keys.to_vec()).await?;
    match rows.as_slice() {
        [] => Err(RecordError::Consistency(format!(
            "insert into {} violated {constraint} but no row matches the same keys",
            R::TABLE
        ))),
        [row] => row_id(row),
        many => Err(RecordError::Consistency(format!(
            "{} rows in {} share keys that {constraint} declares unique",
            many.len(),
            R::TABLE
        ))),
    }
}
