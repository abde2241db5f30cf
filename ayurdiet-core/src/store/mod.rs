//! Access to the hosted backend's tables.
//!
//! The backend owns persistence and query execution. This module only
//! describes the small query vocabulary the data-access objects need
//! (equality filters, one sort key, embedded foreign rows) and the
//! [`RemoteStore`] seam they talk through.
//!
//! Two stores are provided:
//! - [`RestStore`]: PostgREST-style HTTP API (`/rest/v1/<table>`)
//! - [`MemoryStore`]: in-process tables for tests and demos

mod error;
mod memory;
mod rest;

pub use error::StoreError;
pub use memory::{MemoryStore, Operation};
pub use rest::RestStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Table-scoped CRUD against the remote backend.
///
/// Rows travel as JSON objects; typed decoding happens in the caller.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns all rows of `table` matching `query`.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError>;

    /// Inserts one row and returns it as stored (generated id, timestamps,
    /// embedded rows per `select`).
    async fn insert(&self, table: &str, row: Value, select: &Select) -> Result<Value, StoreError>;

    /// Applies `patch` to every row matching `filters` and returns the
    /// updated rows.
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
        select: &Select,
    ) -> Result<Vec<Value>, StoreError>;

    /// Removes every row matching `filters`.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), StoreError>;
}

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Filter on the `id` column.
    pub fn id(id: uuid::Uuid) -> Self {
        Self::eq("id", id.to_string())
    }

    /// Operator and operand in PostgREST syntax, e.g. `eq.true`.
    pub fn operand(&self) -> String {
        match &self.value {
            Value::Null => "is.null".to_string(),
            Value::String(s) => format!("eq.{}", s),
            other => format!("eq.{}", other),
        }
    }

    /// Whether `row` satisfies this filter. A missing column reads as null.
    pub fn matches(&self, row: &Value) -> bool {
        row.get(&self.column).unwrap_or(&Value::Null) == &self.value
    }
}

/// Sort key for a select.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }

    pub fn param(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

/// A foreign row embedded under `alias`, joined through `foreign_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub alias: String,
    pub table: String,
    pub foreign_key: String,
}

/// Columns returned by a read or a write: every column of the table plus
/// any embedded rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    pub embeds: Vec<Embed>,
}

impl Select {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn embed(
        mut self,
        alias: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.embeds.push(Embed {
            alias: alias.into(),
            table: table.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }

    /// The `select=` parameter, e.g. `*,profile:profiles!user_id(*)`.
    pub fn param(&self) -> String {
        let mut columns = vec!["*".to_string()];
        for embed in &self.embeds {
            columns.push(format!(
                "{}:{}!{}(*)",
                embed.alias, embed.table, embed.foreign_key
            ));
        }
        columns.join(",")
    }
}

/// A read: columns, conjunctive filters, optional sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub select: Select,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }
}

/// Decodes every row into `T`.
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect()
}

/// Decodes the single row an id-scoped write is expected to return.
pub(crate) fn decode_single<T: DeserializeOwned>(rows: Vec<Value>) -> Result<T, StoreError> {
    let row = rows.into_iter().next().ok_or(StoreError::NotFound)?;
    Ok(serde_json::from_value(row)?)
}
