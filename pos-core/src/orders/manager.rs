//! Order manager
//!
//! Create / advance / checkout. Local projection first, remote writes
//! after, no rollback: a failed write leaves the order (and any seated
//! table) tagged pending for a later reconciler, and the error surfaces
//! to the caller.

use crate::cart::CartComposer;
use crate::money;
use crate::orders::error::{OrderError, OrderResult};
use crate::orders::numbering::OrderNumberGenerator;
use crate::persist::{Filter, PersistError, Persistence, Row, table_names, to_row};
use crate::store::ProjectionStore;
use crate::tables::apply_status_entry;
use serde_json::json;
use shared::cart::{CartLineKind, SeatingContext};
use shared::models::{
    ComboSelectionRecord, Order, OrderItem, OrderStatus, OrderType, PaymentInput, PaymentRecord,
    PaymentStatus, TableStatus,
};
use shared::util::{new_id, now_millis};
use std::sync::Arc;
use tracing::{info, warn};

/// Receipt-visible marker on a combo parent item's name
pub const COMBO_NAME_MARKER: &str = "[COMBO] ";

/// Result of a successful checkout
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub payment: PaymentRecord,
}

/// Order lifecycle manager
pub struct OrderManager {
    persistence: Arc<dyn Persistence>,
    store: Arc<ProjectionStore>,
    numbering: OrderNumberGenerator,
    restaurant_id: String,
}

impl OrderManager {
    pub fn new(
        persistence: Arc<dyn Persistence>,
        store: Arc<ProjectionStore>,
        numbering: OrderNumberGenerator,
        restaurant_id: &str,
    ) -> Self {
        Self {
            persistence,
            store,
            numbering,
            restaurant_id: restaurant_id.to_string(),
        }
    }

    pub fn store(&self) -> &ProjectionStore {
        &self.store
    }

    // ========== Creation ==========

    /// Turn the composed cart into a durable order.
    ///
    /// Dine-in requires a seated table; the table goes Occupied in the
    /// local projection before any remote write lands (accepted transient
    /// inconsistency). Writes are sequenced header → items → combo
    /// selections → table. The cart is cleared only on full success.
    pub async fn create_order(
        &self,
        cart: &mut CartComposer,
        seating: &SeatingContext,
        order_type: OrderType,
    ) -> OrderResult<Order> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        let (table_id, table_number) = match order_type {
            OrderType::DineIn => match (&seating.table_id, seating.table_number) {
                (Some(id), Some(number)) => (Some(id.clone()), Some(number)),
                _ => return Err(OrderError::TableRequired),
            },
            OrderType::Takeout => (None, None),
        };
        // The referenced table must exist before anything is mutated or
        // written; otherwise seating would be skipped silently and the
        // order rows would land without it.
        if let Some(tid) = &table_id {
            if self.store.table(tid).is_none() {
                return Err(OrderError::TableNotFound(tid.clone()));
            }
        }

        let order_number = match order_type {
            OrderType::DineIn => self.numbering.next_dine_in(table_number.unwrap_or(0)),
            OrderType::Takeout => self.numbering.next_takeout(),
        };

        let now = now_millis();
        let order_id = new_id();
        let (items, combo_selections) = expand_cart_lines(&order_id, cart);
        let totals = cart.totals();

        let order = Order {
            id: order_id.clone(),
            order_number,
            restaurant_id: self.restaurant_id.clone(),
            table_id: table_id.clone(),
            order_type,
            reservation_id: seating.reservation_id.clone(),
            items,
            combo_selections,
            subtotal: totals.subtotal,
            tax_amount: totals.tax,
            service_charge: 0.0,
            discount: 0.0,
            total_amount: totals.total,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            ordered_at: now,
            confirmed_at: None,
            preparation_started_at: None,
            ready_at: None,
            served_at: None,
            completed_at: None,
            updated_at: now,
        };

        // Optimistic: projection first, table seated before any remote
        // write settles.
        self.store.upsert_order_pending(order.clone());
        if let Some(tid) = &table_id {
            self.store.update_table_with(tid, |table| {
                apply_status_entry(table, TableStatus::Occupied, Some(&order_id), now);
            });
        }

        info!(
            order_id = %order_id,
            order_number = %order.order_number,
            order_type = ?order_type,
            total = order.total_amount,
            "Order created"
        );

        self.persistence
            .insert(table_names::ORDERS, vec![header_row(&order)?])
            .await?;
        if !order.items.is_empty() {
            let rows = order
                .items
                .iter()
                .map(to_row)
                .collect::<Result<Vec<_>, _>>()?;
            self.persistence
                .insert(table_names::ORDER_ITEMS, rows)
                .await?;
        }
        if !order.combo_selections.is_empty() {
            let rows = order
                .combo_selections
                .iter()
                .map(to_row)
                .collect::<Result<Vec<_>, _>>()?;
            self.persistence
                .insert(table_names::ORDER_COMBO_SELECTIONS, rows)
                .await?;
        }
        if let Some(tid) = &table_id {
            self.persist_table(tid).await?;
            self.store.confirm_table(tid);
        }

        self.store.confirm_order(&order_id);
        cart.clear();
        Ok(order)
    }

    // ========== Status ==========

    /// Move an order to `new_status`, stamping its audit slot.
    ///
    /// Transitions are permissive: a non-forward jump is logged at warn
    /// and applied anyway. Cancellation is the one hard guard — only
    /// legal from Pending or Confirmed.
    pub async fn update_order_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
    ) -> OrderResult<Order> {
        let current = self
            .store
            .order(order_id)
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        if new_status == OrderStatus::Cancelled && !current.status.can_cancel() {
            return Err(OrderError::CancellationNotAllowed(current.status));
        }
        if let (Some(from), Some(to)) = (current.status.forward_rank(), new_status.forward_rank()) {
            if to <= from {
                warn!(
                    order_id = %order_id,
                    from = ?current.status,
                    to = ?new_status,
                    "Non-forward order status transition"
                );
            }
        }

        let now = now_millis();
        self.store.update_order_with(order_id, |order| {
            order.stamp_status(new_status, now);
        });
        let order = self
            .store
            .order(order_id)
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        info!(order_id = %order_id, status = ?new_status, "Order status changed");
        self.persistence
            .update(table_names::ORDERS, Filter::by_id(order_id), header_row(&order)?)
            .await?;
        self.store.confirm_order(order_id);
        Ok(order)
    }

    // ========== Checkout ==========

    /// Settle an order: mark it Completed and Paid, record the payment,
    /// and release the table into Cleaning (never straight to Available).
    ///
    /// A linked reservation is completed best-effort: its failure is
    /// logged but does not fail the checkout.
    pub async fn process_checkout(
        &self,
        order_id: &str,
        table_id: Option<&str>,
        payment: PaymentInput,
    ) -> OrderResult<CheckoutOutcome> {
        let order = self
            .store
            .order(order_id)
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;
        let table_id = table_id
            .map(str::to_string)
            .or_else(|| order.table_id.clone());
        if order.order_type == OrderType::DineIn && table_id.is_none() {
            return Err(OrderError::TableRequired);
        }

        let now = now_millis();
        let change = payment.tendered.map(|tendered| {
            let diff = money::to_decimal(tendered) - money::to_decimal(payment.amount);
            money::to_f64(diff.max(rust_decimal::Decimal::ZERO))
        });
        let record = PaymentRecord {
            id: new_id(),
            order_id: order_id.to_string(),
            method: payment.method,
            amount: payment.amount,
            tendered: payment.tendered,
            change,
            note: payment.note,
            paid_at: now,
        };

        self.store.update_order_with(order_id, |order| {
            order.stamp_status(OrderStatus::Completed, now);
            order.payment_status = PaymentStatus::Paid;
        });
        let order = self
            .store
            .order(order_id)
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        info!(
            order_id = %order_id,
            method = %record.method,
            amount = record.amount,
            "Checkout"
        );

        self.persistence
            .update(table_names::ORDERS, Filter::by_id(order_id), header_row(&order)?)
            .await?;
        self.store.confirm_order(order_id);
        self.persistence
            .insert(table_names::PAYMENTS, vec![to_row(&record)?])
            .await?;

        if let Some(tid) = &table_id {
            self.store.update_table_with(tid, |table| {
                apply_status_entry(table, TableStatus::Cleaning, None, now);
            });
            self.persist_table(tid).await?;
            self.store.confirm_table(tid);
        }

        if let Some(reservation_id) = &order.reservation_id {
            self.complete_reservation(reservation_id, now).await;
        }

        Ok(CheckoutOutcome { order, payment: record })
    }

    /// Best-effort reservation completion
    async fn complete_reservation(&self, reservation_id: &str, now: i64) {
        let mut patch = Row::new();
        patch.insert("status".to_string(), json!("COMPLETED"));
        patch.insert("completed_at".to_string(), json!(now));
        match self
            .persistence
            .update(
                table_names::TABLE_RESERVATIONS,
                Filter::by_id(reservation_id),
                patch,
            )
            .await
        {
            Ok(0) => warn!(reservation_id = %reservation_id, "Linked reservation not found"),
            Ok(_) => info!(reservation_id = %reservation_id, "Reservation completed"),
            Err(e) => warn!(
                reservation_id = %reservation_id,
                error = %e,
                "Reservation completion failed, checkout continues"
            ),
        }
    }

    async fn persist_table(&self, table_id: &str) -> Result<(), PersistError> {
        let table = self
            .store
            .table(table_id)
            .ok_or_else(|| PersistError::NotFound(table_id.to_string()))?;
        let patch = to_row(&table)?;
        self.persistence
            .update(table_names::TABLES, Filter::by_id(table_id), patch)
            .await?;
        Ok(())
    }
}

/// Header portion of the aggregate, items and selections stripped —
/// those live in their own tables.
fn header_row(order: &Order) -> Result<Row, PersistError> {
    let mut row = to_row(order)?;
    row.remove("items");
    row.remove("combo_selections");
    Ok(row)
}

/// Expand cart lines into persisted item and combo-selection rows
fn expand_cart_lines(
    order_id: &str,
    cart: &CartComposer,
) -> (Vec<OrderItem>, Vec<ComboSelectionRecord>) {
    let mut items = Vec::with_capacity(cart.lines().len());
    let mut selections = Vec::new();
    for line in cart.lines() {
        let is_combo = line.kind == CartLineKind::Combo;
        let item_id = new_id();
        let name = if is_combo {
            format!("{}{}", COMBO_NAME_MARKER, line.name)
        } else {
            line.name.clone()
        };
        items.push(OrderItem {
            id: item_id.clone(),
            order_id: order_id.to_string(),
            product_id: line.product_id.clone(),
            name,
            unit_price: line.unit_price,
            quantity: line.quantity,
            note: line.note.clone(),
            is_combo_parent: is_combo,
        });
        for child in &line.combo_children {
            selections.push(ComboSelectionRecord {
                id: new_id(),
                order_id: order_id.to_string(),
                parent_item_id: item_id.clone(),
                product_id: child.product_id.clone(),
                name: child.name.clone(),
                group_key: child.group_key.clone(),
                price_delta: child.price_delta,
            });
        }
    }
    (items, selections)
}
