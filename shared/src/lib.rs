//! Shared types for the POS order core
//!
//! Data model used by both the composition core and its hosts:
//! cart types, the order aggregate, the table entity, and small
//! time/id utilities.

pub mod cart;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
