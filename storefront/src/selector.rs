//! Per-event tier quantity picker.
//!
//! A selector is opened for one event, adjusted tier by tier, and confirmed
//! into cart lines priced from the event's tier catalog.

use crate::cart::CartLine;
use crate::error::ValidationError;
use crate::notifications::Level;
use crate::reducer::{Effects, StorefrontEnvironment, StorefrontState};
use crate::types::{EventSummary, Money, Tier};

/// Quantities chosen for one event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketSelector {
    event: EventSummary,
    quantities: Vec<(Tier, u32)>,
}

impl TicketSelector {
    /// Starts a selection with every tier at 0
    #[must_use]
    pub fn open(event: EventSummary) -> Self {
        let quantities = event.tiers.iter().map(|(tier, _)| (tier.clone(), 0)).collect();
        Self { event, quantities }
    }

    /// Event being selected for
    #[must_use]
    pub const fn event(&self) -> &EventSummary {
        &self.event
    }

    fn slot(&mut self, tier: &Tier) -> Option<&mut u32> {
        self.quantities
            .iter_mut()
            .find(|(candidate, _)| candidate == tier)
            .map(|(_, quantity)| quantity)
    }

    /// Adds one ticket of `tier`; returns `false` if the event has no such tier
    pub fn increment(&mut self, tier: &Tier) -> bool {
        self.slot(tier)
            .map(|quantity| *quantity = quantity.saturating_add(1))
            .is_some()
    }

    /// Removes one ticket of `tier`, stopping at 0
    pub fn decrement(&mut self, tier: &Tier) -> bool {
        self.slot(tier)
            .map(|quantity| *quantity = quantity.saturating_sub(1))
            .is_some()
    }

    /// Sets the quantity of `tier` directly
    pub fn set_quantity(&mut self, tier: &Tier, quantity: u32) -> bool {
        self.slot(tier).map(|slot| *slot = quantity).is_some()
    }

    /// Chosen quantity of `tier`
    #[must_use]
    pub fn quantity(&self, tier: &Tier) -> u32 {
        self.quantities
            .iter()
            .find(|(candidate, _)| candidate == tier)
            .map_or(0, |(_, quantity)| *quantity)
    }

    /// Tickets chosen across all tiers
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.quantities
            .iter()
            .fold(0u32, |total, (_, quantity)| total.saturating_add(*quantity))
    }

    /// Running price of the selection
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.quantities
            .iter()
            .filter_map(|(tier, quantity)| {
                self.event.tiers.price_of(tier).map(|price| price.times(*quantity))
            })
            .sum()
    }

    /// Whether at least one ticket is chosen
    #[must_use]
    pub fn can_confirm(&self) -> bool {
        self.total_quantity() > 0
    }

    /// One cart line per tier with a non-zero quantity, in catalog order
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoTicketsSelected`] when every tier is at 0.
    pub fn confirm(&self) -> Result<Vec<CartLine>, ValidationError> {
        if !self.can_confirm() {
            return Err(ValidationError::NoTicketsSelected);
        }
        Ok(self
            .quantities
            .iter()
            .filter(|(_, quantity)| *quantity > 0)
            .filter_map(|(tier, quantity)| {
                let unit_price = self.event.tiers.price_of(tier)?;
                Some(CartLine {
                    event_id: self.event.id,
                    event_name: self.event.name.clone(),
                    date: self.event.date.clone(),
                    tier: tier.clone(),
                    unit_price,
                    quantity: *quantity,
                })
            })
            .collect())
    }
}

/// Selector interactions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorAction {
    /// Open (or re-open) the selector for an event
    Open(EventSummary),
    /// One more ticket of a tier
    Increment(Tier),
    /// One fewer ticket of a tier
    Decrement(Tier),
    /// Direct quantity entry
    SetQuantity {
        /// Tier to set
        tier: Tier,
        /// New quantity
        quantity: u32,
    },
    /// Add the selection to the cart
    Confirm,
    /// Discard the selection
    Close,
}

pub(crate) fn reduce(
    state: &mut StorefrontState,
    action: SelectorAction,
    env: &StorefrontEnvironment,
) -> Effects {
    match action {
        SelectorAction::Open(event) => {
            tracing::debug!(event_id = %event.id, "Opening ticket selector");
            state.selector = Some(TicketSelector::open(event));
        },
        SelectorAction::Close => state.selector = None,
        SelectorAction::Increment(tier) => adjust(state, &tier, |s, t| s.increment(t)),
        SelectorAction::Decrement(tier) => adjust(state, &tier, |s, t| s.decrement(t)),
        SelectorAction::SetQuantity { tier, quantity } => {
            adjust(state, &tier, |s, t| s.set_quantity(t, quantity));
        },
        SelectorAction::Confirm => {
            let Some(selector) = state.selector.as_ref() else {
                tracing::warn!("Confirm with no open selector");
                return Effects::new();
            };
            match selector.confirm() {
                Ok(lines) => {
                    let count = selector.total_quantity();
                    let name = selector.event().name.clone();
                    for line in lines {
                        state.cart.add_item(line);
                    }
                    state.selector = None;
                    state.notifications.raise(
                        env.clock.as_ref(),
                        Level::Success,
                        "ADDED_TO_CART",
                        format!("Added {count} ticket(s) for {name} to your cart"),
                    );
                },
                Err(error) => {
                    state.notifications.validation(env.clock.as_ref(), &error);
                },
            }
        },
    }
    Effects::new()
}

fn adjust(state: &mut StorefrontState, tier: &Tier, apply: impl FnOnce(&mut TicketSelector, &Tier) -> bool) {
    match state.selector.as_mut() {
        Some(selector) => {
            if !apply(selector, tier) {
                tracing::warn!(%tier, event_id = %selector.event().id, "Tier not offered for event");
            }
        },
        None => tracing::warn!(%tier, "Selector adjusted while closed"),
    }
}
