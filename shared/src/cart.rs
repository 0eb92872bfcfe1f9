//! Cart data model
//!
//! Types for the in-progress order: single-item lines, combo lines with
//! their concrete per-group selections, and the rule set a combo product
//! declares. The cart itself lives in `pos-core`; these are the shapes
//! that cross the UI boundary.

use serde::{Deserialize, Serialize};

/// Cart line kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartLineKind {
    /// 单品
    Single,
    /// 套餐
    Combo,
}

/// One row in the customer's in-progress order
///
/// Invariant: `combo_children` is empty iff `kind == Single`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// Opaque line ID, generated client-side
    pub id: String,
    pub kind: CartLineKind,
    /// Catalog product reference (the combo's own id for combo lines)
    pub product_id: String,
    pub name: String,
    /// Display/billing basis before quantity
    pub unit_price: f64,
    /// Positive integer >= 1
    pub quantity: i32,
    /// Free-text note for this line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Concrete selections chosen for each rule group (combo lines only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub combo_children: Vec<ComboChild>,
}

/// One concrete selection inside a confirmed combo line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComboChild {
    pub product_id: String,
    pub name: String,
    /// Rule group this selection was made under
    pub group_key: String,
    /// Price delta added on top of the combo base price
    pub price_delta: f64,
}

/// Selectable item inside a combo rule group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComboGroupItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price_delta: f64,
}

/// Per-group selection rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComboGroupRule {
    /// Display label ("Choose your side")
    pub label: String,
    /// Whether the group minimum must be met to confirm
    pub required: bool,
    /// Minimum picks (before quantity multiplier scaling)
    pub min: i32,
    /// Maximum picks (before quantity multiplier scaling)
    pub max: i32,
    pub items: Vec<ComboGroupItem>,
}

/// A keyed rule group
///
/// Groups are an ordered list, not a map: flattening a confirmed draft
/// must be deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComboGroup {
    pub key: String,
    pub rule: ComboGroupRule,
}

/// Combo product definition as presented to the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComboSpec {
    pub product_id: String,
    pub name: String,
    pub base_price: f64,
    pub groups: Vec<ComboGroup>,
}

impl ComboSpec {
    /// Look up a group by key
    pub fn group(&self, key: &str) -> Option<&ComboGroupRule> {
        self.groups.iter().find(|g| g.key == key).map(|g| &g.rule)
    }
}

/// Derived cart totals
///
/// `total = subtotal + tax` always; recomputed synchronously after every
/// cart mutation so the cart is never left with stale totals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct CartTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// Seating context supplied by the floor UI before order creation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeatingContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<i32>,
    pub party_size: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<String>,
}
