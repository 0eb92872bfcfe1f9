//! Order-composition and lifecycle core
//!
//! The part of the POS with real invariants: cart assembly (single items
//! and rule-governed combo products), derived totals, the order
//! fulfillment state machine with audit timestamps, and table occupancy
//! including merge/unmerge of physical tables into one seating unit.
//!
//! Everything durable flows through one storage-agnostic persistence
//! collaborator ([`persist::Persistence`]); the core keeps a cached,
//! optimistically-updated projection ([`store::ProjectionStore`]) that is
//! never rolled back on remote failure — pending records stay tagged so a
//! reconciler can find them later.

pub mod cart;
pub mod money;
pub mod orders;
pub mod persist;
pub mod store;
pub mod tables;

pub use cart::{CartComposer, CartError};
pub use cart::combo::ComboDraft;
pub use orders::{CheckoutOutcome, OrderError, OrderManager, OrderNumberGenerator};
pub use persist::{MemoryPersistence, Persistence};
pub use store::ProjectionStore;
pub use tables::{MergeOutcome, MergeReport, TableError, TableManager};
