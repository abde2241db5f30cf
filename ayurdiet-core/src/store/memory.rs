//! In-process tables behind the [`RemoteStore`] seam.
//!
//! Behaves like the hosted backend for the operations the data-access
//! objects use: inserts get an id and timestamps, selects filter, sort and
//! embed, writes return the affected rows. Failures can be queued to test
//! how callers handle a rejected or unreachable backend.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{Filter, Query, RemoteStore, Select, StoreError};

/// Kind of call recorded by [`MemoryStore::operations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Value>>,
    failures: VecDeque<StoreError>,
    log: Vec<(Operation, String)>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `row` as given, filling in id and timestamps when missing.
    /// Returns the stored row.
    pub fn seed(&self, table: &str, row: Value) -> Value {
        let row = stamp_new_row(row);
        self.lock()
            .rows
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    /// Makes the next call (of any kind) fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        self.lock().failures.push_back(error);
    }

    /// Raw rows of `table`, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().rows.get(table).cloned().unwrap_or_default()
    }

    /// Calls made so far, oldest first.
    pub fn operations(&self) -> Vec<(Operation, String)> {
        self.lock().log.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, operation: Operation, table: &str) -> Result<MutexGuard<'_, Tables>, StoreError> {
        let mut tables = self.lock();
        tables.log.push((operation, table.to_string()));
        match tables.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(tables),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        let tables = self.begin(Operation::Select, table)?;

        let mut rows: Vec<Value> = tables
            .rows
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| embed(&tables, row, &query.select))
            .collect())
    }

    async fn insert(&self, table: &str, row: Value, select: &Select) -> Result<Value, StoreError> {
        let mut tables = self.begin(Operation::Insert, table)?;

        if !row.is_object() {
            return Err(StoreError::rejected("Row must be a JSON object"));
        }
        let row = stamp_new_row(row);
        if let Some(id) = row.get("id") {
            let taken = tables
                .rows
                .get(table)
                .is_some_and(|rows| rows.iter().any(|r| r.get("id") == Some(id)));
            if taken {
                return Err(StoreError::Rejected {
                    message: format!("duplicate key value violates unique constraint \"{}_pkey\"", table),
                    code: Some("23505".to_string()),
                });
            }
        }

        tables
            .rows
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(embed(&tables, row, select))
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
        select: &Select,
    ) -> Result<Vec<Value>, StoreError> {
        let mut tables = self.begin(Operation::Update, table)?;

        let Value::Object(patch) = patch else {
            return Err(StoreError::rejected("Patch must be a JSON object"));
        };
        let now = timestamp();

        let mut updated = Vec::new();
        if let Some(rows) = tables.rows.get_mut(table) {
            for row in rows.iter_mut() {
                if !filters.iter().all(|f| f.matches(&*row)) {
                    continue;
                }
                if let Value::Object(fields) = row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                    fields.insert("updated_at".to_string(), Value::String(now.clone()));
                }
                updated.push(row.clone());
            }
        }

        Ok(updated
            .into_iter()
            .map(|row| embed(&tables, row, select))
            .collect())
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), StoreError> {
        let mut tables = self.begin(Operation::Delete, table)?;

        if let Some(rows) = tables.rows.get_mut(table) {
            rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        }
        Ok(())
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn stamp_new_row(row: Value) -> Value {
    let mut fields = match row {
        Value::Object(fields) => fields,
        other => return other,
    };
    let now = timestamp();
    fields
        .entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    fields
        .entry("created_at")
        .or_insert_with(|| Value::String(now.clone()));
    fields
        .entry("updated_at")
        .or_insert_with(|| Value::String(now));
    Value::Object(fields)
}

fn embed(tables: &Tables, mut row: Value, select: &Select) -> Value {
    for join in &select.embeds {
        let foreign = row
            .get(&join.foreign_key)
            .filter(|key| !key.is_null())
            .and_then(|key| {
                tables
                    .rows
                    .get(&join.table)?
                    .iter()
                    .find(|candidate| candidate.get("id") == Some(key))
                    .cloned()
            })
            .unwrap_or(Value::Null);
        if let Value::Object(fields) = &mut row {
            fields.insert(join.alias.clone(), foreign);
        }
    }
    row
}

/// Sort order for JSON scalars. Nulls sort last in ascending order.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
