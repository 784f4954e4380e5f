//! In-memory cart.
//!
//! Lines are keyed by `(event, tier)`. Totals are always recomputed from the
//! lines so they cannot drift out of sync with them.

use crate::reducer::{Effects, StorefrontEnvironment};
use crate::types::{EventId, Money, Tier};
use std::collections::BTreeSet;

/// One event and tier in the cart
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartLine {
    /// Event the tickets admit to
    pub event_id: EventId,
    /// Event name for display
    pub event_name: String,
    /// Event date for display
    pub date: String,
    /// Ticket tier
    pub tier: Tier,
    /// Price of one ticket
    pub unit_price: Money,
    /// Number of tickets, at least 1 once in the cart
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price × quantity`
    #[must_use]
    pub const fn subtotal(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    fn matches(&self, event_id: EventId, tier: &Tier) -> bool {
        self.event_id == event_id && self.tier == *tier
    }
}

/// The visitor's cart
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Adds a line, merging quantities into an existing line with the same key
    ///
    /// A merged line keeps its position. Lines with quantity 0 are ignored.
    pub fn add_item(&mut self, line: CartLine) {
        if line.quantity == 0 {
            return;
        }
        match self
            .lines
            .iter_mut()
            .find(|existing| existing.matches(line.event_id, &line.tier))
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            },
            None => self.lines.push(line),
        }
    }

    /// Deletes the line for `(event_id, tier)`, if present
    pub fn remove_item(&mut self, event_id: EventId, tier: &Tier) {
        self.lines.retain(|line| !line.matches(event_id, tier));
    }

    /// Takes `quantity` tickets off the line for `(event_id, tier)`
    ///
    /// The line is deleted once nothing is left on it. Missing lines are a
    /// no-op.
    pub fn deduct(&mut self, event_id: EventId, tier: &Tier, quantity: u32) {
        let Some(index) = self.lines.iter().position(|line| line.matches(event_id, tier)) else {
            return;
        };
        let remaining = self.lines[index].quantity.saturating_sub(quantity);
        if remaining == 0 {
            self.lines.remove(index);
        } else {
            self.lines[index].quantity = remaining;
        }
    }

    /// Removes every line
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `(event_id, tier)`
    #[must_use]
    pub fn line(&self, event_id: EventId, tier: &Tier) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.matches(event_id, tier))
    }

    /// Sum of every line's subtotal
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Sum of every line's quantity
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |total, line| total.saturating_add(line.quantity))
    }

    /// Distinct events in the cart, ordered by id
    #[must_use]
    pub fn event_ids(&self) -> BTreeSet<EventId> {
        self.lines.iter().map(|line| line.event_id).collect()
    }

    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Cart mutations
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartAction {
    /// Add or merge a line
    AddItem(CartLine),
    /// Delete a line
    RemoveItem {
        /// Event of the line
        event_id: EventId,
        /// Tier of the line
        tier: Tier,
    },
    /// Empty the cart
    Clear,
}

pub(crate) fn reduce(cart: &mut Cart, action: CartAction, _env: &StorefrontEnvironment) -> Effects {
    match action {
        CartAction::AddItem(line) => {
            tracing::debug!(event_id = %line.event_id, tier = %line.tier, quantity = line.quantity, "Adding to cart");
            cart.add_item(line);
        },
        CartAction::RemoveItem { event_id, tier } => {
            tracing::debug!(%event_id, %tier, "Removing from cart");
            cart.remove_item(event_id, &tier);
        },
        CartAction::Clear => cart.clear(),
    }
    Effects::new()
}
