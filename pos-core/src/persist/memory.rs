//! In-memory persistence binding
//!
//! Backs the test suite with the same trait surface as a real store but
//! no I/O. Failure injection lets tests exercise the
//! optimistic-no-rollback and best-effort paths.

use super::{Filter, Ordering, PersistError, PersistResult, Persistence, Row};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct Injected {
    /// Tables whose next operation (any kind) fails once
    fail_table_once: HashSet<String>,
    /// (table, id) pairs whose next matching update fails once
    fail_update_once: HashSet<(String, String)>,
}

/// In-memory [`Persistence`] implementation
#[derive(Default)]
pub struct MemoryPersistence {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    injected: Mutex<Injected>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next operation (of any kind) on `table`, once
    pub fn fail_next_on(&self, table: &str) {
        self.injected
            .lock()
            .fail_table_once
            .insert(table.to_string());
    }

    /// Fail the next update on `table` whose filter targets row `id`, once
    pub fn fail_next_update_of(&self, table: &str, id: &str) {
        self.injected
            .lock()
            .fail_update_once
            .insert((table.to_string(), id.to_string()));
    }

    /// Snapshot of all rows currently in `table`
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }

    /// Row count in `table`
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.lock().get(table).map(|r| r.len()).unwrap_or(0)
    }

    fn take_table_failure(&self, table: &str) -> bool {
        self.injected.lock().fail_table_once.remove(table)
    }

    fn take_update_failure(&self, table: &str, filter: &Filter) -> bool {
        let target = filter.conditions().iter().find_map(|(f, v)| {
            if f == "id" {
                v.as_str().map(str::to_string)
            } else {
                None
            }
        });
        match target {
            Some(id) => self
                .injected
                .lock()
                .fail_update_once
                .remove(&(table.to_string(), id)),
            None => false,
        }
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn insert(&self, table: &str, rows: Vec<Row>) -> PersistResult<Vec<Row>> {
        if self.take_table_failure(table) {
            return Err(PersistError::Backend(format!(
                "injected failure on {}",
                table
            )));
        }

        let mut stored = Vec::with_capacity(rows.len());
        let mut tables = self.tables.lock();
        let entries = tables.entry(table.to_string()).or_default();
        for mut row in rows {
            if !row.contains_key("id") {
                row.insert("id".to_string(), Value::String(shared::util::new_id()));
            }
            entries.push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn update(&self, table: &str, filter: Filter, patch: Row) -> PersistResult<u64> {
        if self.take_table_failure(table) || self.take_update_failure(table, &filter) {
            return Err(PersistError::Backend(format!(
                "injected failure on {}",
                table
            )));
        }

        let mut tables = self.tables.lock();
        let entries = tables
            .get_mut(table)
            .ok_or_else(|| PersistError::NotFound(format!("table {}", table)))?;
        let mut affected = 0;
        for row in entries.iter_mut() {
            if filter.matches(row) {
                for (k, v) in &patch {
                    row.insert(k.clone(), v.clone());
                }
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn select(
        &self,
        table: &str,
        filter: Filter,
        ordering: Option<Ordering>,
    ) -> PersistResult<Vec<Row>> {
        if self.take_table_failure(table) {
            return Err(PersistError::Backend(format!(
                "injected failure on {}",
                table
            )));
        }

        let tables = self.tables.lock();
        let mut rows: Vec<Row> = tables
            .get(table)
            .map(|entries| entries.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = ordering {
            rows.sort_by(|a, b| {
                let av = a.get(&order.field);
                let bv = b.get(&order.field);
                let cmp = compare_values(av, bv);
                if order.descending { cmp.reverse() } else { cmp }
            });
        }
        Ok(rows)
    }

    async fn delete(&self, table: &str, filter: Filter) -> PersistResult<u64> {
        if self.take_table_failure(table) {
            return Err(PersistError::Backend(format!(
                "injected failure on {}",
                table
            )));
        }

        let mut tables = self.tables.lock();
        let Some(entries) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = entries.len();
        entries.retain(|r| !filter.matches(r));
        Ok((before - entries.len()) as u64)
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering as O;
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(O::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => O::Greater,
        (None, Some(_)) => O::Less,
        _ => O::Equal,
    }
}
