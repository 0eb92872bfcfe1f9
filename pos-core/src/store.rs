//! Projection store
//!
//! Cached, optimistically-updated copies of the durable aggregates.
//! An explicitly owned object with an initialization lifecycle —
//! constructed once per session, torn down on drop — instead of a bare
//! module-level global.
//!
//! Every locally-mutated record carries a sync tag: [`SyncState::Pending`]
//! until the matching remote write settles, then [`SyncState::Confirmed`].
//! The core never rolls a pending record back on remote failure; the tag
//! is what a later reconciler would scan for.

use parking_lot::RwLock;
use shared::models::{Order, Table};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Optimistic synchronization state of a projected record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Locally mutated, remote write not yet confirmed
    Pending,
    /// Matches the last confirmed remote state
    Confirmed,
}

/// A cached record plus its sync tag
#[derive(Debug, Clone)]
pub struct Projected<T> {
    pub record: T,
    pub sync: SyncState,
}

/// Per-session projection of orders and tables
#[derive(Default)]
pub struct ProjectionStore {
    orders: RwLock<Vec<Projected<Order>>>,
    tables: RwLock<HashMap<String, Projected<Table>>>,
    loaded: AtomicBool,
}

impl ProjectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the projection from a fresh remote read.
    ///
    /// Guards redundant reloads: a second call on a loaded store replaces
    /// the contents anyway (explicit re-sync), but `is_loaded` lets hosts
    /// skip the remote round trip.
    pub fn load(&self, orders: Vec<Order>, tables: Vec<Table>) {
        *self.orders.write() = orders
            .into_iter()
            .map(|record| Projected {
                record,
                sync: SyncState::Confirmed,
            })
            .collect();
        *self.tables.write() = tables
            .into_iter()
            .map(|record| {
                (
                    record.id.clone(),
                    Projected {
                        record,
                        sync: SyncState::Confirmed,
                    },
                )
            })
            .collect();
        self.loaded.store(true, Ordering::Release);
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    // ========== Orders ==========

    /// Append or replace an order, tagged pending
    pub fn upsert_order_pending(&self, order: Order) {
        let mut orders = self.orders.write();
        match orders.iter_mut().find(|p| p.record.id == order.id) {
            Some(existing) => {
                existing.record = order;
                existing.sync = SyncState::Pending;
            }
            None => orders.push(Projected {
                record: order,
                sync: SyncState::Pending,
            }),
        }
    }

    /// Mark an order's remote write as settled
    pub fn confirm_order(&self, order_id: &str) {
        if let Some(p) = self
            .orders
            .write()
            .iter_mut()
            .find(|p| p.record.id == order_id)
        {
            p.sync = SyncState::Confirmed;
        }
    }

    pub fn order(&self, order_id: &str) -> Option<Order> {
        self.orders
            .read()
            .iter()
            .find(|p| p.record.id == order_id)
            .map(|p| p.record.clone())
    }

    pub fn order_sync(&self, order_id: &str) -> Option<SyncState> {
        self.orders
            .read()
            .iter()
            .find(|p| p.record.id == order_id)
            .map(|p| p.sync)
    }

    /// Mutate a cached order in place, tagging it pending
    pub fn update_order_with(&self, order_id: &str, f: impl FnOnce(&mut Order)) -> bool {
        let mut orders = self.orders.write();
        match orders.iter_mut().find(|p| p.record.id == order_id) {
            Some(p) => {
                f(&mut p.record);
                p.sync = SyncState::Pending;
                true
            }
            None => false,
        }
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.read().iter().map(|p| p.record.clone()).collect()
    }

    // ========== Tables ==========

    /// Insert or replace a table, tagged confirmed (seed path)
    pub fn insert_table(&self, table: Table) {
        self.tables.write().insert(
            table.id.clone(),
            Projected {
                record: table,
                sync: SyncState::Confirmed,
            },
        );
    }

    pub fn table(&self, table_id: &str) -> Option<Table> {
        self.tables.read().get(table_id).map(|p| p.record.clone())
    }

    pub fn table_sync(&self, table_id: &str) -> Option<SyncState> {
        self.tables.read().get(table_id).map(|p| p.sync)
    }

    /// Mutate a cached table in place, tagging it pending
    pub fn update_table_with(&self, table_id: &str, f: impl FnOnce(&mut Table)) -> bool {
        let mut tables = self.tables.write();
        match tables.get_mut(table_id) {
            Some(p) => {
                f(&mut p.record);
                p.sync = SyncState::Pending;
                true
            }
            None => false,
        }
    }

    /// Mark a table's remote write as settled
    pub fn confirm_table(&self, table_id: &str) {
        if let Some(p) = self.tables.write().get_mut(table_id) {
            p.sync = SyncState::Confirmed;
        }
    }

    pub fn tables(&self) -> Vec<Table> {
        self.tables
            .read()
            .values()
            .map(|p| p.record.clone())
            .collect()
    }
}
