//! Data models
//!
//! Durable aggregates whose canonical copy lives in the persistence
//! collaborator; the core holds a cached, optimistically-updated
//! projection. All IDs are opaque strings, all timestamps Unix millis.

pub mod order;
pub mod table;

// Re-exports
pub use order::*;
pub use table::*;
