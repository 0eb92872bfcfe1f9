//! Cart composer
//!
//! Owns the in-progress cart: single-item lines, at most one open combo
//! draft, and cached totals recomputed synchronously after every mutating
//! operation. Purely in-memory; persistence happens only when the cart is
//! submitted to the order manager.

pub mod combo;

use crate::money;
use combo::ComboDraft;
use shared::cart::{CartLine, CartLineKind, CartTotals, ComboSpec};
use shared::util::new_id;

/// Cart operation failure
///
/// Combo rule invalidity is deliberately not here — it is a derived
/// predicate ([`ComboDraft::all_valid`]), not an error. These variants
/// cover caller mistakes the UI should never produce.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart line not found: {0}")]
    LineNotFound(String),
    #[error("no combo draft is open")]
    NoDraft,
    #[error("combo draft does not satisfy its group rules")]
    DraftInvalid,
}

/// The in-progress cart for one ordering session
#[derive(Debug, Default)]
pub struct CartComposer {
    lines: Vec<CartLine>,
    draft: Option<ComboDraft>,
    totals: CartTotals,
}

impl CartComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Cached totals; always consistent with the current lines
    pub fn totals(&self) -> CartTotals {
        self.totals
    }

    fn recompute_totals(&mut self) {
        self.totals = money::compute_cart_totals(&self.lines);
    }

    // ========== Single items ==========

    /// Append a new single-item line with a fresh id.
    ///
    /// Identical products are never merged into one line: each add is a
    /// distinct line so notes and quantities stay independent.
    pub fn add_single(
        &mut self,
        product_id: &str,
        name: &str,
        unit_price: f64,
        quantity: i32,
    ) -> &CartLine {
        let line = CartLine {
            id: new_id(),
            kind: CartLineKind::Single,
            product_id: product_id.to_string(),
            name: name.to_string(),
            unit_price,
            quantity: quantity.max(1),
            note: None,
            combo_children: vec![],
        };
        self.lines.push(line);
        self.recompute_totals();
        &self.lines[self.lines.len() - 1]
    }

    // ========== Combo draft lifecycle ==========

    /// Open a combo draft. A draft already open is replaced — there is no
    /// draft stacking.
    pub fn start_combo_draft(&mut self, spec: ComboSpec) -> &mut ComboDraft {
        self.draft.insert(ComboDraft::new(spec))
    }

    pub fn combo_draft(&self) -> Option<&ComboDraft> {
        self.draft.as_ref()
    }

    pub fn combo_draft_mut(&mut self) -> Option<&mut ComboDraft> {
        self.draft.as_mut()
    }

    /// Discard the open draft without touching the cart
    pub fn cancel_combo_draft(&mut self) {
        self.draft = None;
    }

    /// Convert the open draft into a combo cart line.
    ///
    /// Requires the draft to satisfy every group rule. The line's
    /// `quantity` carries the draft's multiplier — the group selections
    /// were already scaled by it, so no separate counter survives.
    pub fn confirm_combo_draft(&mut self) -> Result<&CartLine, CartError> {
        let draft = self.draft.as_ref().ok_or(CartError::NoDraft)?;
        if !draft.all_valid() {
            return Err(CartError::DraftInvalid);
        }

        let spec = draft.spec();
        let line = CartLine {
            id: new_id(),
            kind: CartLineKind::Combo,
            product_id: spec.product_id.clone(),
            name: spec.name.clone(),
            unit_price: spec.base_price,
            quantity: draft.quantity_multiplier(),
            note: None,
            combo_children: draft.flatten_children(),
        };
        self.lines.push(line);
        self.draft = None;
        self.recompute_totals();
        Ok(&self.lines[self.lines.len() - 1])
    }

    // ========== Line mutation ==========

    /// Adjust a line's quantity by `delta`, flooring at 1.
    ///
    /// Decrementing at 1 is a no-op; removal is the separate explicit
    /// [`CartComposer::remove_line`].
    pub fn update_qty(&mut self, line_id: &str, delta: i32) -> Result<i32, CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.to_string()))?;
        line.quantity = (line.quantity + delta).max(1);
        let quantity = line.quantity;
        self.recompute_totals();
        Ok(quantity)
    }

    pub fn remove_line(&mut self, line_id: &str) -> Result<CartLine, CartError> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.to_string()))?;
        let removed = self.lines.remove(idx);
        self.recompute_totals();
        Ok(removed)
    }

    pub fn update_note(&mut self, line_id: &str, note: Option<String>) -> Result<(), CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.to_string()))?;
        line.note = note;
        Ok(())
    }

    /// Drop all lines and any open draft
    pub fn clear(&mut self) {
        self.lines.clear();
        self.draft = None;
        self.recompute_totals();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::cart::{ComboGroup, ComboGroupItem, ComboGroupRule};

    fn combo_spec() -> ComboSpec {
        ComboSpec {
            product_id: "combo-1".to_string(),
            name: "Burger Menu".to_string(),
            base_price: 11.0,
            groups: vec![
                ComboGroup {
                    key: "main".to_string(),
                    rule: ComboGroupRule {
                        label: "Burger".to_string(),
                        required: true,
                        min: 1,
                        max: 1,
                        items: vec![ComboGroupItem {
                            id: "b1".to_string(),
                            name: "Classic".to_string(),
                            price_delta: 0.0,
                        }],
                    },
                },
                ComboGroup {
                    key: "extra".to_string(),
                    rule: ComboGroupRule {
                        label: "Extras".to_string(),
                        required: false,
                        min: 0,
                        max: 2,
                        items: vec![ComboGroupItem {
                            id: "e1".to_string(),
                            name: "Bacon".to_string(),
                            price_delta: 1.2,
                        }],
                    },
                },
            ],
        }
    }

    #[test]
    fn test_add_single_never_merges_lines() {
        let mut cart = CartComposer::new();
        cart.add_single("p1", "Coffee", 2.5, 1);
        cart.add_single("p1", "Coffee", 2.5, 1);
        assert_eq!(cart.lines().len(), 2);
        assert_ne!(cart.lines()[0].id, cart.lines()[1].id);
        assert_eq!(cart.totals().subtotal, 5.0);
    }

    #[test]
    fn test_quantity_floor_at_one() {
        let mut cart = CartComposer::new();
        let id = cart.add_single("p1", "Coffee", 2.5, 2).id.clone();

        assert_eq!(cart.update_qty(&id, -999).unwrap(), 1);
        assert_eq!(cart.lines()[0].quantity, 1);
        // Decrement at 1 is a no-op, not a removal
        assert_eq!(cart.update_qty(&id, -1).unwrap(), 1);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_totals_recomputed_after_every_mutation() {
        let mut cart = CartComposer::new();
        let id = cart.add_single("p1", "Tea", 3.0, 1).id.clone();
        assert_eq!(cart.totals().total, 3.0);

        cart.update_qty(&id, 2).unwrap();
        assert_eq!(cart.totals().total, 9.0);

        cart.remove_line(&id).unwrap();
        assert_eq!(cart.totals().total, 0.0);
    }

    #[test]
    fn test_totals_idempotent_without_mutation() {
        let mut cart = CartComposer::new();
        cart.add_single("p1", "Tea", 3.33, 3);
        let first = cart.totals();
        let second = cart.totals();
        assert_eq!(first, second);
        assert_eq!(first.total, first.subtotal + first.tax);
    }

    #[test]
    fn test_draft_replacement_no_stacking() {
        let mut cart = CartComposer::new();
        let draft = cart.start_combo_draft(combo_spec());
        draft.select("main", "b1").unwrap();

        // Opening a second draft replaces the first
        cart.start_combo_draft(combo_spec());
        assert!(cart.combo_draft().unwrap().selected("main").is_empty());
    }

    #[test]
    fn test_confirm_requires_valid_draft() {
        let mut cart = CartComposer::new();
        cart.start_combo_draft(combo_spec());
        assert_eq!(cart.confirm_combo_draft(), Err(CartError::DraftInvalid));
        assert!(cart.is_empty());
        assert!(cart.combo_draft().is_some(), "failed confirm keeps draft");
    }

    #[test]
    fn test_confirm_flattens_draft_into_combo_line() {
        // One required pick made, optional group left empty
        let mut cart = CartComposer::new();
        let draft = cart.start_combo_draft(combo_spec());
        draft.select("main", "b1").unwrap();
        assert!(draft.all_valid());

        let line = cart.confirm_combo_draft().unwrap();
        assert_eq!(line.kind, CartLineKind::Combo);
        assert_eq!(line.quantity, 1);
        assert_eq!(line.combo_children.len(), 1);
        assert_eq!(line.combo_children[0].product_id, "b1");
        assert!(cart.combo_draft().is_none(), "draft cleared on confirm");
        assert_eq!(cart.totals().subtotal, 11.0);
    }

    #[test]
    fn test_confirm_carries_multiplier_into_quantity() {
        let mut cart = CartComposer::new();
        let draft = cart.start_combo_draft(combo_spec());
        draft.set_quantity_multiplier(2);
        draft.select("main", "b1").unwrap();
        draft.select("main", "b1").unwrap();
        draft.select("extra", "e1").unwrap();

        let line = cart.confirm_combo_draft().unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.combo_children.len(), 3);
        // 11.0 * 2 + 1.2 = 23.2
        assert_eq!(cart.totals().subtotal, 23.2);
    }

    #[test]
    fn test_cancel_draft_leaves_cart_untouched() {
        let mut cart = CartComposer::new();
        cart.add_single("p1", "Tea", 3.0, 1);
        let draft = cart.start_combo_draft(combo_spec());
        draft.select("main", "b1").unwrap();

        cart.cancel_combo_draft();
        assert!(cart.combo_draft().is_none());
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.totals().total, 3.0);
    }

    #[test]
    fn test_note_and_clear() {
        let mut cart = CartComposer::new();
        let id = cart.add_single("p1", "Soup", 4.0, 1).id.clone();
        cart.update_note(&id, Some("no onion".to_string())).unwrap();
        assert_eq!(cart.lines()[0].note.as_deref(), Some("no onion"));

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.totals().total, 0.0);
    }

    #[test]
    fn test_unknown_line_errors() {
        let mut cart = CartComposer::new();
        assert!(matches!(
            cart.update_qty("ghost", 1),
            Err(CartError::LineNotFound(_))
        ));
        assert!(cart.remove_line("ghost").is_err());
        assert!(cart.update_note("ghost", None).is_err());
    }
}
