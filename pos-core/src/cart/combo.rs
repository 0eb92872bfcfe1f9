//! Combo draft and rule validation
//!
//! Scratch state while a customer configures one combo instance. Each
//! rule group holds its selections in a [`SelectionQueue`] — a bounded
//! FIFO multiset. Selecting past the group's effective maximum evicts the
//! oldest pick instead of rejecting, so the customer never hits a dead
//! end; the same primitive serves the toggle path and the quantity
//! multiplier path.
//!
//! Invalidity is never an error: [`ComboDraft::all_valid`] is a derived
//! predicate the UI uses to gate the confirm action, with per-group
//! `selected/max` counts from [`ComboDraft::group_checks`].

use shared::cart::{ComboChild, ComboSpec};
use std::collections::VecDeque;

/// Ordered multiset of item ids with FIFO eviction at a bound.
///
/// Duplicates are allowed ("two of this side"); eviction happens at push
/// time against the bound passed in, so a later bound change does not
/// retroactively trim the queue.
#[derive(Debug, Clone, Default)]
pub struct SelectionQueue {
    entries: VecDeque<String>,
}

impl SelectionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an item id; if the queue already holds `bound` entries, the
    /// oldest one is evicted first and returned.
    ///
    /// A zero bound admits nothing: the push is dropped instead of
    /// growing the queue past an empty quota.
    pub fn push_bounded(&mut self, item_id: &str, bound: usize) -> Option<String> {
        if bound == 0 {
            return None;
        }
        let evicted = if self.entries.len() >= bound {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(item_id.to_string());
        evicted
    }

    /// Remove one occurrence of `item_id` (the oldest). Returns whether
    /// anything was removed.
    pub fn remove_one(&mut self, item_id: &str) -> bool {
        match self.entries.iter().position(|e| e == item_id) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn count_of(&self, item_id: &str) -> usize {
        self.entries.iter().filter(|e| *e == item_id).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Per-group validation summary for the UI (`selected/max` affordance)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCheck {
    pub group_key: String,
    pub label: String,
    pub required: bool,
    pub selected: usize,
    pub effective_min: usize,
    pub effective_max: usize,
    pub satisfied: bool,
}

/// Outcome of one select toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOutcome {
    /// Item evicted to make room, if the group was at its bound
    pub evicted: Option<String>,
}

/// In-progress configuration of one combo instance.
///
/// Created when the customer opens a combo product, mutated by repeated
/// toggles, destroyed by confirmation or cancellation. Never persisted.
#[derive(Debug, Clone)]
pub struct ComboDraft {
    spec: ComboSpec,
    quantity_multiplier: i32,
    /// Parallel to `spec.groups`, same order
    selections: Vec<SelectionQueue>,
}

impl ComboDraft {
    pub fn new(spec: ComboSpec) -> Self {
        let selections = spec.groups.iter().map(|_| SelectionQueue::new()).collect();
        Self {
            spec,
            quantity_multiplier: 1,
            selections,
        }
    }

    pub fn spec(&self) -> &ComboSpec {
        &self.spec
    }

    pub fn quantity_multiplier(&self) -> i32 {
        self.quantity_multiplier
    }

    /// Change the multiplier (clamped to >= 1).
    ///
    /// Existing over-quota selections are NOT trimmed here; the draft may
    /// be transiently invalid mid-edit and is re-validated lazily at
    /// confirmation time.
    pub fn set_quantity_multiplier(&mut self, multiplier: i32) {
        self.quantity_multiplier = multiplier.max(1);
    }

    fn group_index(&self, group_key: &str) -> Option<usize> {
        self.spec.groups.iter().position(|g| g.key == group_key)
    }

    fn effective_bounds(&self, idx: usize) -> (usize, usize) {
        let rule = &self.spec.groups[idx].rule;
        let mult = self.quantity_multiplier.max(1) as usize;
        (
            rule.min.max(0) as usize * mult,
            rule.max.max(0) as usize * mult,
        )
    }

    /// Toggle an item up: add one pick of `item_id` to `group_key`.
    ///
    /// At the group's effective maximum the oldest pick is evicted (FIFO),
    /// never rejected. Unknown group or item is a caller bug and returns
    /// `None` without mutating the draft.
    pub fn select(&mut self, group_key: &str, item_id: &str) -> Option<SelectOutcome> {
        let idx = self.group_index(group_key)?;
        self.spec.groups[idx]
            .rule
            .items
            .iter()
            .find(|i| i.id == item_id)?;
        let (_, effective_max) = self.effective_bounds(idx);
        let evicted = self.selections[idx].push_bounded(item_id, effective_max);
        Some(SelectOutcome { evicted })
    }

    /// Toggle an item down: remove one pick of `item_id` from `group_key`.
    /// At zero the item is gone entirely.
    pub fn deselect(&mut self, group_key: &str, item_id: &str) -> bool {
        match self.group_index(group_key) {
            Some(idx) => self.selections[idx].remove_one(item_id),
            None => false,
        }
    }

    /// Current picks for a group, oldest first
    pub fn selected(&self, group_key: &str) -> Vec<String> {
        match self.group_index(group_key) {
            Some(idx) => self.selections[idx].iter().map(str::to_string).collect(),
            None => vec![],
        }
    }

    /// Validation summary for one group
    pub fn group_check(&self, idx: usize) -> GroupCheck {
        let group = &self.spec.groups[idx];
        let (effective_min, effective_max) = self.effective_bounds(idx);
        let selected = self.selections[idx].len();
        // Count must never exceed the effective max (a shrunk multiplier
        // can leave it over-quota), and required groups must also meet
        // the effective min.
        let satisfied =
            selected <= effective_max && (!group.rule.required || selected >= effective_min);
        GroupCheck {
            group_key: group.key.clone(),
            label: group.rule.label.clone(),
            required: group.rule.required,
            selected,
            effective_min,
            effective_max,
            satisfied,
        }
    }

    /// Per-group summaries in declaration order
    pub fn group_checks(&self) -> Vec<GroupCheck> {
        (0..self.spec.groups.len())
            .map(|idx| self.group_check(idx))
            .collect()
    }

    /// The draft is confirmable iff every group satisfies its constraint;
    /// one failing group blocks confirmation.
    pub fn all_valid(&self) -> bool {
        (0..self.spec.groups.len()).all(|idx| self.group_check(idx).satisfied)
    }

    /// Flatten the selections into combo children: groups in declaration order,
    /// picks in selection order, resolved against the rule's item list.
    pub fn flatten_children(&self) -> Vec<ComboChild> {
        let mut children = Vec::new();
        for (idx, group) in self.spec.groups.iter().enumerate() {
            for item_id in self.selections[idx].iter() {
                if let Some(item) = group.rule.items.iter().find(|i| i.id == item_id) {
                    children.push(ComboChild {
                        product_id: item.id.clone(),
                        name: item.name.clone(),
                        group_key: group.key.clone(),
                        price_delta: item.price_delta,
                    });
                }
            }
        }
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::cart::{ComboGroup, ComboGroupItem, ComboGroupRule};

    fn item(id: &str, delta: f64) -> ComboGroupItem {
        ComboGroupItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            price_delta: delta,
        }
    }

    fn spec() -> ComboSpec {
        ComboSpec {
            product_id: "combo-1".to_string(),
            name: "Lunch Menu".to_string(),
            base_price: 12.5,
            groups: vec![
                ComboGroup {
                    key: "main".to_string(),
                    rule: ComboGroupRule {
                        label: "Main".to_string(),
                        required: true,
                        min: 1,
                        max: 1,
                        items: vec![item("m1", 0.0), item("m2", 2.0)],
                    },
                },
                ComboGroup {
                    key: "side".to_string(),
                    rule: ComboGroupRule {
                        label: "Sides".to_string(),
                        required: false,
                        min: 0,
                        max: 2,
                        items: vec![item("s1", 0.0), item("s2", 1.5)],
                    },
                },
            ],
        }
    }

    #[test]
    fn test_empty_required_group_blocks() {
        let draft = ComboDraft::new(spec());
        assert!(!draft.all_valid());
        let checks = draft.group_checks();
        assert!(!checks[0].satisfied);
        assert!(checks[1].satisfied, "optional empty group is fine");
    }

    #[test]
    fn test_required_group_met_optional_empty_is_valid() {
        // Required {1,1} picked, optional {0,2} left empty
        let mut draft = ComboDraft::new(spec());
        draft.select("main", "m1").unwrap();
        assert!(draft.all_valid());
    }

    #[test]
    fn test_fifo_eviction_preserves_group_size() {
        let mut draft = ComboDraft::new(spec());
        draft.select("side", "s1").unwrap();
        draft.select("side", "s2").unwrap();

        // Group at max (2): third pick evicts the oldest, not rejected
        let outcome = draft.select("side", "s1").unwrap();
        assert_eq!(outcome.evicted.as_deref(), Some("s1"));
        assert_eq!(draft.selected("side"), vec!["s2", "s1"]);
        assert_eq!(draft.selected("side").len(), 2);
    }

    #[test]
    fn test_duplicates_allowed_within_bound() {
        let mut draft = ComboDraft::new(spec());
        draft.select("side", "s2").unwrap();
        draft.select("side", "s2").unwrap();
        assert_eq!(draft.selected("side"), vec!["s2", "s2"]);
        assert!(!draft.all_valid()); // main still empty
        draft.select("main", "m1").unwrap();
        assert!(draft.all_valid());
    }

    #[test]
    fn test_deselect_removes_one_occurrence() {
        let mut draft = ComboDraft::new(spec());
        draft.select("side", "s2").unwrap();
        draft.select("side", "s2").unwrap();
        assert!(draft.deselect("side", "s2"));
        assert_eq!(draft.selected("side"), vec!["s2"]);
        assert!(draft.deselect("side", "s2"));
        assert!(draft.selected("side").is_empty());
        assert!(!draft.deselect("side", "s2"), "already gone");
    }

    #[test]
    fn test_multiplier_scales_bounds() {
        let mut draft = ComboDraft::new(spec());
        draft.set_quantity_multiplier(2);

        // Required group now needs 2 picks
        draft.select("main", "m1").unwrap();
        assert!(!draft.all_valid());
        draft.select("main", "m2").unwrap();
        assert!(draft.all_valid());

        // Sides bound doubles to 4
        for _ in 0..4 {
            let o = draft.select("side", "s1").unwrap();
            assert!(o.evicted.is_none());
        }
        let o = draft.select("side", "s1").unwrap();
        assert!(o.evicted.is_some());
        assert_eq!(draft.selected("side").len(), 4);
    }

    #[test]
    fn test_multiplier_shrink_leaves_over_quota_until_validation() {
        let mut draft = ComboDraft::new(spec());
        draft.set_quantity_multiplier(2);
        draft.select("main", "m1").unwrap();
        draft.select("main", "m2").unwrap();
        assert!(draft.all_valid());

        // Shrinking back does not trim; the draft is transiently invalid
        draft.set_quantity_multiplier(1);
        assert_eq!(draft.selected("main").len(), 2);
        assert!(!draft.all_valid());
        let check = &draft.group_checks()[0];
        assert_eq!(check.selected, 2);
        assert_eq!(check.effective_max, 1);
    }

    #[test]
    fn test_multiplier_floor_at_one() {
        let mut draft = ComboDraft::new(spec());
        draft.set_quantity_multiplier(-3);
        assert_eq!(draft.quantity_multiplier(), 1);
    }

    #[test]
    fn test_zero_max_group_admits_nothing() {
        let mut spec = spec();
        spec.groups[1].rule.max = 0;
        let mut draft = ComboDraft::new(spec);
        draft.select("main", "m1").unwrap();

        // A zero-quota group never grows, even via the eviction path
        let outcome = draft.select("side", "s1").unwrap();
        assert_eq!(outcome.evicted, None);
        assert!(draft.selected("side").is_empty());
        assert!(draft.all_valid());
    }

    #[test]
    fn test_unknown_group_or_item_is_inert() {
        let mut draft = ComboDraft::new(spec());
        assert!(draft.select("dessert", "d1").is_none());
        assert!(draft.select("main", "nope").is_none());
        assert!(draft.group_checks().iter().all(|c| c.selected == 0));
    }

    #[test]
    fn test_flatten_orders_by_group_then_selection() {
        let mut draft = ComboDraft::new(spec());
        draft.select("side", "s2").unwrap();
        draft.select("main", "m2").unwrap();
        draft.select("side", "s1").unwrap();

        let children = draft.flatten_children();
        let keys: Vec<&str> = children.iter().map(|c| c.group_key.as_str()).collect();
        assert_eq!(keys, vec!["main", "side", "side"]);
        assert_eq!(children[0].product_id, "m2");
        assert_eq!(children[1].product_id, "s2");
        assert_eq!(children[1].price_delta, 1.5);
        assert_eq!(children[2].product_id, "s1");
    }
}
