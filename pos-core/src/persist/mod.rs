//! Persistence collaborator seam
//!
//! The core consumes and produces durable data through one
//! storage-engine-agnostic collaborator with four logical operations.
//! Rows are plain JSON objects; exact column naming is the binding's
//! concern, the core's contract is the field set of the shared models.

mod memory;
pub use memory::MemoryPersistence;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Logical table names referenced by the core
pub mod table_names {
    pub const ORDERS: &str = "orders";
    pub const ORDER_ITEMS: &str = "order_items";
    pub const ORDER_COMBO_SELECTIONS: &str = "order_combo_selections";
    pub const TABLES: &str = "tables";
    pub const PAYMENTS: &str = "payments";
    pub const TABLE_RESERVATIONS: &str = "table_reservations";
}

/// One persisted row
pub type Row = serde_json::Map<String, Value>;

/// Persistence failure
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("backend error: {0}")]
    Backend(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Equality-conjunction filter (`field = value AND …`)
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for the common `id = …` filter
    pub fn by_id(id: &str) -> Self {
        Self::new().eq("id", id)
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| row.get(field) == Some(value))
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }
}

/// Result ordering for `select`
#[derive(Debug, Clone)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: true,
        }
    }
}

/// The external persistence collaborator.
///
/// Calls are asynchronous and non-blocking from the caller's perspective;
/// the core sequences dependent writes itself (header → items →
/// combo-selections → table update) and never retries internally.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Insert rows, returning them with ids assigned where missing
    async fn insert(&self, table: &str, rows: Vec<Row>) -> PersistResult<Vec<Row>>;

    /// Patch every row matching the filter; returns the affected count
    async fn update(&self, table: &str, filter: Filter, patch: Row) -> PersistResult<u64>;

    /// Select rows matching the filter, optionally ordered
    async fn select(
        &self,
        table: &str,
        filter: Filter,
        ordering: Option<Ordering>,
    ) -> PersistResult<Vec<Row>>;

    /// Delete every row matching the filter; returns the affected count
    async fn delete(&self, table: &str, filter: Filter) -> PersistResult<u64>;
}

/// Serialize a model into a persistence row.
///
/// Fails if `T` does not serialize to a JSON object, which would be a
/// programming error for the model types used here.
pub fn to_row<T: Serialize>(value: &T) -> PersistResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PersistError::Backend(format!(
            "model serialized to non-object row: {}",
            other
        ))),
        Err(e) => Err(PersistError::Backend(format!("serialize failed: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches() {
        let mut row = Row::new();
        row.insert("id".to_string(), json!("t1"));
        row.insert("status".to_string(), json!("AVAILABLE"));

        assert!(Filter::by_id("t1").matches(&row));
        assert!(Filter::new().eq("status", "AVAILABLE").matches(&row));
        assert!(
            !Filter::by_id("t1")
                .eq("status", "OCCUPIED")
                .matches(&row)
        );
        assert!(!Filter::by_id("t2").matches(&row));
    }

    #[test]
    fn test_to_row_rejects_non_object() {
        assert!(to_row(&"just a string").is_err());
        assert!(to_row(&json!({"a": 1})).is_ok());
    }
}
