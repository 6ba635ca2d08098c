//! In-memory implementation of the storage boundary.
//!
//! `MemoryStore` honours the same contract a hosted relational service
//! would: ids and timestamps are assigned on insert, updates replace the
//! payload fields of one row, and the unique key sets declared by
//! [`Table::unique_key_sets`] are enforced with database-style constraint
//! names. Key columns that are absent or null never conflict, matching SQL
//! null semantics.

use super::{Filter, QueryClient, Row, StoreError, Table};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory storage engine keyed by [`Table`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row without unique-constraint checks.
    ///
    /// Mirrors legacy rows written before the constraints existed. Loaders
    /// must treat the resulting duplicates as integrity violations, and
    /// tests use this to stage that state, which the checked paths make
    /// unreachable.
    pub async fn insert_unchecked(&self, table: Table, mut row: Row) -> Row {
        stamp_new_row(&mut row);
        let mut tables = self.tables.write().await;
        tables.entry(table).or_default().push(row.clone());
        row
    }
}

#[async_trait]
impl QueryClient for MemoryStore {
    async fn select(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables.get(&table).map(Vec::as_slice).unwrap_or(&[]);
        Ok(rows
            .iter()
            .filter(|row| filters.iter().all(|filter| filter.matches(row)))
            .cloned()
            .collect())
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, StoreError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        if let Some(constraint) = unique_conflict(rows, table, &row, None) {
            return Err(StoreError::UniqueViolation { constraint });
        }
        stamp_new_row(&mut row);
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: Uuid, payload: Row) -> Result<Row, StoreError> {
        let id_value = Value::String(id.to_string());
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();
        let position = rows
            .iter()
            .position(|row| row.get("id") == Some(&id_value))
            .ok_or(StoreError::RowNotFound { table, id })?;
        if let Some(constraint) = unique_conflict(rows, table, &payload, Some(&id_value)) {
            return Err(StoreError::UniqueViolation { constraint });
        }
        let row = &mut rows[position];
        for (column, value) in payload {
            // The storage layer owns the id and creation stamp.
            if column == "id" || column == "created_at" {
                continue;
            }
            row.insert(column, value);
        }
        row.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
        Ok(row.clone())
    }
}

fn stamp_new_row(row: &mut Row) {
    if !row.contains_key("id") {
        row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    let now = Value::String(Utc::now().to_rfc3339());
    if !row.contains_key("created_at") {
        row.insert("created_at".into(), now.clone());
    }
    row.insert("updated_at".into(), now);
}

/// Find the first unique key set the candidate row would violate.
fn unique_conflict(
    rows: &[Row],
    table: Table,
    candidate: &Row,
    skip_id: Option<&Value>,
) -> Option<String> {
    for columns in table.unique_key_sets() {
        let Some(candidate_keys) = key_values(candidate, columns) else {
            continue;
        };
        for row in rows {
            if skip_id.is_some() && row.get("id") == skip_id {
                continue;
            }
            if key_values(row, columns).as_ref() == Some(&candidate_keys) {
                return Some(table.constraint_name(columns));
            }
        }
    }
    None
}

/// The values a row holds for a key column set, or `None` when any key is
/// absent or null (null keys never conflict).
fn key_values<'a>(row: &'a Row, columns: &[&str]) -> Option<Vec<&'a Value>> {
    let mut values = Vec::with_capacity(columns.len());
    for column in columns {
        match row.get(*column) {
            Some(value) if !value.is_null() => values.push(value),
            _ => return None,
        }
    }
    Some(values)
}
