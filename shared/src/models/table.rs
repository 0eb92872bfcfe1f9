//! Table entity (桌台)
//!
//! A physical seating unit. Merge linkage lives in the metadata bag:
//! a base table lists the tables it absorbed (`merged_with`), an absorbed
//! table points back at its base (`merged_into`). At most one of the two
//! forms may be present on a table at a time, and an absorbed table is
//! always `Inactive`.

use serde::{Deserialize, Serialize};

/// Table occupancy status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
    Cleaning,
    Maintenance,
    Inactive,
}

/// Merge linkage metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TableMetadata {
    /// Tables absorbed by this base table
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_with: Vec<String>,
    /// Base table this table was absorbed into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_into: Option<String>,
    /// Combined capacity of the merged seating unit (base table only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_capacity: Option<i32>,
}

impl TableMetadata {
    pub fn is_empty(&self) -> bool {
        self.merged_with.is_empty() && self.merged_into.is_none() && self.merged_capacity.is_none()
    }

    /// Whether this table participates in a merge in either role
    pub fn has_merge_linkage(&self) -> bool {
        !self.merged_with.is_empty() || self.merged_into.is_some()
    }
}

/// A physical seating unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub id: String,
    pub table_number: i32,
    /// Positive integer
    pub capacity: i32,
    pub status: TableStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_occupied_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cleaned_at: Option<i64>,
    #[serde(default)]
    pub metadata: TableMetadata,
    pub updated_at: i64,
}

impl Table {
    /// Create a table in its default (available, unlinked) state
    pub fn new(id: impl Into<String>, table_number: i32, capacity: i32) -> Self {
        Self {
            id: id.into(),
            table_number,
            capacity,
            status: TableStatus::Available,
            current_session_id: None,
            last_occupied_at: None,
            last_cleaned_at: None,
            metadata: TableMetadata::default(),
            updated_at: crate::util::now_millis(),
        }
    }
}
