//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic is done on `Decimal` internally, then converted back to
//! `f64` for storage/serialization, rounded to 2 decimal places half-up.

use rust_decimal::prelude::*;
use shared::cart::{CartLine, CartTotals};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Line total: `unit_price × quantity + Σ combo_children.price_delta`
///
/// Child price deltas are counted once per selected child, not scaled by
/// the line quantity — a ×N combo already carries N sets of selections.
pub fn line_total(line: &CartLine) -> Decimal {
    let base = to_decimal(line.unit_price) * Decimal::from(line.quantity);
    let deltas: Decimal = line
        .combo_children
        .iter()
        .map(|c| to_decimal(c.price_delta))
        .sum();
    (base + deltas).round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute cart totals from the current lines.
///
/// Tax is an extension point and stays at zero in the base design;
/// `total = subtotal + tax` holds regardless.
pub fn compute_cart_totals(lines: &[CartLine]) -> CartTotals {
    let subtotal: Decimal = lines.iter().map(line_total).sum();
    let tax = Decimal::ZERO;
    let total = subtotal + tax;
    CartTotals {
        subtotal: to_f64(subtotal),
        tax: to_f64(tax),
        total: to_f64(total),
    }
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}
