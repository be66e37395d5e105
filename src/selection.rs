//! Selection
//!
//! Local-only checkbox state over cart lines. Never sent to the backend.

use rustc_hash::FxHashSet;

use crate::{cart::Cart, items::LineItemId};

/// Set of selected line item ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: FxHashSet<LineItemId>,
}

impl Selection {
    /// Select every line in `cart`.
    pub fn select_all(&mut self, cart: &Cart) {
        self.ids.extend(cart.item_ids().cloned());
    }

    /// Flip the selection of `id`; returns whether it is now selected.
    pub fn toggle(&mut self, id: &LineItemId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    /// Drop ids no longer present in `cart`; returns how many were dropped.
    pub fn retain_present(&mut self, cart: &Cart) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| cart.contains(id));
        before - self.ids.len()
    }

    /// Check whether `id` is selected.
    pub fn contains(&self, id: &LineItemId) -> bool {
        self.ids.contains(id)
    }

    /// Whether every line of `cart` is selected (false for an empty cart).
    pub fn covers(&self, cart: &Cart) -> bool {
        !cart.is_empty() && cart.item_ids().all(|id| self.ids.contains(id))
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Selected ids, sorted.
    pub fn ids(&self) -> Vec<LineItemId> {
        let mut ids: Vec<_> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Get the number of selected lines.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
