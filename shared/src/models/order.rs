//! Order aggregate
//!
//! The durable record of a placed order, its line items, and payments.
//! Fulfillment status moves along one forward path; each transition gets
//! its own audit timestamp slot.

use serde::{Deserialize, Serialize};

/// 服务类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// 堂食
    #[default]
    DineIn,
    /// 外卖/打包
    Takeout,
}

/// Payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

/// Order fulfillment status
///
/// `Served` and `Completed` are two points on one forward path, never
/// reachable from each other backward. `Cancelled` is only legal from
/// `Pending` or `Confirmed`; later-state cancellation policy is an
/// external business decision, not enforced by this core.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Served,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Position on the forward fulfillment path; `None` for Cancelled.
    pub fn forward_rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Ready => Some(3),
            OrderStatus::Served => Some(4),
            OrderStatus::Completed => Some(5),
            OrderStatus::Cancelled => None,
        }
    }

    /// Whether an order currently in `self` may still be cancelled
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Whether the order has reached a terminal "done" label
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

/// Persisted order line item
///
/// A combo cart line expands into one parent item row (name carries the
/// combo marker prefix) plus one combo-selection row per child.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub name: String,
    pub unit_price: f64,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub is_combo_parent: bool,
}

/// Persisted combo selection row, linked to its parent item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComboSelectionRecord {
    pub id: String,
    pub order_id: String,
    pub parent_item_id: String,
    pub product_id: String,
    pub name: String,
    pub group_key: String,
    pub price_delta: f64,
}

/// Payment input for checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub method: String,
    pub amount: f64,
    /// Cash received (change is computed from this)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tendered: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Persisted payment record, suitable for receipt generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub id: String,
    pub order_id: String,
    pub method: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tendered: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub paid_at: i64,
}

/// The durable order aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    /// Printable order number; dine-in and takeout use disjoint schemes
    pub order_number: String,
    pub restaurant_id: String,
    /// Null for takeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    pub order_type: OrderType,
    /// Linked reservation, completed best-effort at checkout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub combo_selections: Vec<ComboSelectionRecord>,
    pub subtotal: f64,
    pub tax_amount: f64,
    /// Additive extension point, default 0
    #[serde(default)]
    pub service_charge: f64,
    /// Additive extension point, default 0
    #[serde(default)]
    pub discount: f64,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub ordered_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation_started_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    pub updated_at: i64,
}

impl Order {
    /// Read the audit timestamp slot for a status, if that status has one
    pub fn timestamp_for(&self, status: OrderStatus) -> Option<i64> {
        match status {
            OrderStatus::Pending => Some(self.ordered_at),
            OrderStatus::Confirmed => self.confirmed_at,
            OrderStatus::Preparing => self.preparation_started_at,
            OrderStatus::Ready => self.ready_at,
            OrderStatus::Served => self.served_at,
            OrderStatus::Completed => self.completed_at,
            OrderStatus::Cancelled => None,
        }
    }

    /// Stamp the audit slot matching `status` and bump `updated_at`.
    ///
    /// Cancelled has no dedicated slot; only `updated_at` moves.
    pub fn stamp_status(&mut self, status: OrderStatus, now: i64) {
        match status {
            OrderStatus::Confirmed => self.confirmed_at = Some(now),
            OrderStatus::Preparing => self.preparation_started_at = Some(now),
            OrderStatus::Ready => self.ready_at = Some(now),
            OrderStatus::Served => self.served_at = Some(now),
            OrderStatus::Completed => self.completed_at = Some(now),
            OrderStatus::Pending | OrderStatus::Cancelled => {}
        }
        self.status = status;
        self.updated_at = now;
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}
