//! Table status and merge management
//!
//! Owns table occupancy state, including combining several physical
//! tables into one logical seating unit. Merge is strict on the base
//! table and best-effort on absorbed tables: once the party has a
//! seating record, a failed bookkeeping write on a secondary table must
//! not undo it. Per-table outcomes are reported explicitly so callers
//! can decide whether "mostly succeeded" is acceptable.

use crate::persist::{Filter, PersistError, Persistence, table_names, to_row};
use crate::store::ProjectionStore;
use serde::Serialize;
use shared::models::{Table, TableStatus};
use shared::util::now_millis;
use std::sync::Arc;
use tracing::{info, warn};

/// Table operation failure
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("table not found: {0}")]
    NotFound(String),
    #[error("table already participates in a merge: {0}")]
    AlreadyMerged(String),
    #[error(transparent)]
    Persistence(#[from] PersistError),
}

pub type TableResult<T> = Result<T, TableError>;

/// Outcome of one absorbed/restored table inside a merge or unmerge
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MergeOutcome {
    pub table_id: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a merge or unmerge call
///
/// The base table update is strict (its failure fails the whole call);
/// `outcomes` carries the per-child best-effort results.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub base_id: String,
    pub merged_capacity: i32,
    pub outcomes: Vec<MergeOutcome>,
}

impl MergeReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.succeeded)
    }
}

/// Apply the entry side effects for a status change.
///
/// Statuses without listed side effects get a plain field update. Shared
/// with the order manager, which seats and releases tables as part of
/// order creation and checkout.
pub(crate) fn apply_status_entry(
    table: &mut Table,
    status: TableStatus,
    session_id: Option<&str>,
    now: i64,
) {
    match status {
        TableStatus::Available => {
            table.current_session_id = None;
            table.last_occupied_at = None;
            table.last_cleaned_at = Some(now);
        }
        TableStatus::Occupied => {
            table.last_occupied_at = Some(now);
            if let Some(session) = session_id {
                table.current_session_id = Some(session.to_string());
            }
        }
        TableStatus::Cleaning => {
            table.last_cleaned_at = Some(now);
            table.current_session_id = None;
        }
        TableStatus::Maintenance => {
            table.current_session_id = None;
        }
        TableStatus::Reserved | TableStatus::Inactive => {}
    }
    table.status = status;
    table.updated_at = now;
}

/// Table status and merge manager
pub struct TableManager {
    persistence: Arc<dyn Persistence>,
    store: Arc<ProjectionStore>,
}

impl TableManager {
    pub fn new(persistence: Arc<dyn Persistence>, store: Arc<ProjectionStore>) -> Self {
        Self { persistence, store }
    }

    pub fn store(&self) -> &ProjectionStore {
        &self.store
    }

    /// Change a table's status, applying entry side effects, then persist.
    ///
    /// The projection is updated eagerly; a persistence failure surfaces
    /// to the caller and the local mutation stays pending (no rollback).
    pub async fn set_status(
        &self,
        table_id: &str,
        status: TableStatus,
        session_id: Option<&str>,
    ) -> TableResult<Table> {
        let now = now_millis();
        let updated = self.store.update_table_with(table_id, |table| {
            apply_status_entry(table, status, session_id, now);
        });
        if !updated {
            return Err(TableError::NotFound(table_id.to_string()));
        }
        let table = self
            .store
            .table(table_id)
            .ok_or_else(|| TableError::NotFound(table_id.to_string()))?;

        info!(table_id = %table_id, status = ?status, "Table status changed");
        self.persist_table(&table).await?;
        self.store.confirm_table(table_id);
        Ok(table)
    }

    /// Merge `other_ids` into `base_id` as one logical seating unit.
    ///
    /// Preconditions (checked before any mutation): every id must
    /// reference an existing table, and no participant may already carry
    /// merge linkage in either direction.
    pub async fn merge_tables(&self, base_id: &str, other_ids: &[String]) -> TableResult<MergeReport> {
        let base = self
            .store
            .table(base_id)
            .ok_or_else(|| TableError::NotFound(base_id.to_string()))?;
        if base.metadata.has_merge_linkage() {
            return Err(TableError::AlreadyMerged(base_id.to_string()));
        }

        let mut others = Vec::with_capacity(other_ids.len());
        for id in other_ids {
            let table = self
                .store
                .table(id)
                .ok_or_else(|| TableError::NotFound(id.clone()))?;
            if table.metadata.has_merge_linkage() {
                return Err(TableError::AlreadyMerged(id.clone()));
            }
            others.push(table);
        }

        let merged_capacity = base.capacity + others.iter().map(|t| t.capacity).sum::<i32>();
        let now = now_millis();

        // Base table first, strictly: if this write fails the party has
        // no seating record at all, so the whole operation fails.
        self.store.update_table_with(base_id, |table| {
            table.metadata.merged_with = other_ids.to_vec();
            table.metadata.merged_capacity = Some(merged_capacity);
            table.updated_at = now;
        });
        let base = self
            .store
            .table(base_id)
            .ok_or_else(|| TableError::NotFound(base_id.to_string()))?;
        self.persist_table(&base).await?;
        self.store.confirm_table(base_id);

        // Absorbed tables, best-effort: a failure is logged, recorded in
        // the report, and the remaining tables are still processed.
        let mut outcomes = Vec::with_capacity(other_ids.len());
        for id in other_ids {
            self.store.update_table_with(id, |table| {
                table.metadata.merged_into = Some(base_id.to_string());
                // An absorbed table cannot simultaneously be available,
                // reserved, etc.
                table.status = TableStatus::Inactive;
                table.updated_at = now;
            });
            let outcome = match self.store.table(id) {
                Some(table) => match self.persist_table(&table).await {
                    Ok(()) => {
                        self.store.confirm_table(id);
                        MergeOutcome {
                            table_id: id.clone(),
                            succeeded: true,
                            error: None,
                        }
                    }
                    Err(e) => {
                        warn!(
                            base_id = %base_id,
                            table_id = %id,
                            error = %e,
                            "Absorbed table update failed, continuing merge"
                        );
                        MergeOutcome {
                            table_id: id.clone(),
                            succeeded: false,
                            error: Some(e.to_string()),
                        }
                    }
                },
                None => MergeOutcome {
                    table_id: id.clone(),
                    succeeded: false,
                    error: Some("table vanished from projection".to_string()),
                },
            };
            outcomes.push(outcome);
        }

        info!(
            base_id = %base_id,
            merged_capacity,
            absorbed = other_ids.len(),
            "Tables merged"
        );
        Ok(MergeReport {
            base_id: base_id.to_string(),
            merged_capacity,
            outcomes,
        })
    }

    /// Undo a merge: every absorbed table comes back available with empty
    /// metadata, and the base's `merged_capacity` resets to its own
    /// physical capacity. Calling this on a table with no merge linkage
    /// is a valid, harmless no-op.
    pub async fn unmerge_table(&self, base_id: &str) -> TableResult<MergeReport> {
        let base = self
            .store
            .table(base_id)
            .ok_or_else(|| TableError::NotFound(base_id.to_string()))?;
        let absorbed_ids = base.metadata.merged_with.clone();
        let now = now_millis();

        if absorbed_ids.is_empty() {
            return Ok(MergeReport {
                base_id: base_id.to_string(),
                merged_capacity: base.capacity,
                outcomes: vec![],
            });
        }

        // Base resets to its own physical capacity, strictly.
        self.store.update_table_with(base_id, |table| {
            table.metadata.merged_with.clear();
            table.metadata.merged_capacity = Some(table.capacity);
            table.updated_at = now;
        });
        let base = self
            .store
            .table(base_id)
            .ok_or_else(|| TableError::NotFound(base_id.to_string()))?;
        self.persist_table(&base).await?;
        self.store.confirm_table(base_id);

        let mut outcomes = Vec::with_capacity(absorbed_ids.len());
        for id in &absorbed_ids {
            self.store.update_table_with(id, |table| {
                table.metadata = Default::default();
                table.status = TableStatus::Available;
                table.updated_at = now;
            });
            let outcome = match self.store.table(id) {
                Some(table) => match self.persist_table(&table).await {
                    Ok(()) => {
                        self.store.confirm_table(id);
                        MergeOutcome {
                            table_id: id.clone(),
                            succeeded: true,
                            error: None,
                        }
                    }
                    Err(e) => {
                        warn!(
                            base_id = %base_id,
                            table_id = %id,
                            error = %e,
                            "Restored table update failed, continuing unmerge"
                        );
                        MergeOutcome {
                            table_id: id.clone(),
                            succeeded: false,
                            error: Some(e.to_string()),
                        }
                    }
                },
                None => MergeOutcome {
                    table_id: id.clone(),
                    succeeded: false,
                    error: Some("table vanished from projection".to_string()),
                },
            };
            outcomes.push(outcome);
        }

        info!(base_id = %base_id, restored = absorbed_ids.len(), "Tables unmerged");
        Ok(MergeReport {
            base_id: base_id.to_string(),
            merged_capacity: base.capacity,
            outcomes,
        })
    }

    async fn persist_table(&self, table: &Table) -> Result<(), PersistError> {
        let patch = to_row(table)?;
        self.persistence
            .update(table_names::TABLES, Filter::by_id(&table.id), patch)
            .await?;
        Ok(())
    }
}
