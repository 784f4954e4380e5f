//! Contracts consumed from the payment and ticket services.
//!
//! Reducers only ever see these traits through the environment. The HTTP
//! implementation lives in [`http`]; scripted doubles live in
//! [`crate::mocks`].

use crate::cart::Cart;
use crate::error::{ServiceError, ValidationError};
use crate::session::Credential;
use crate::types::{EventId, Money, Ticket, TicketId, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

pub mod http;

/// Boxed future returned by every service call
pub type ServiceFuture<T> = Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send>>;

/// How the visitor pays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Credit or debit card
    Card,
    /// `PayPal` account
    Paypal,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Card => "card",
            Self::Paypal => "paypal",
        })
    }
}

/// Tickets requested for one event and tier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketLine {
    /// Event
    pub event_id: EventId,
    /// Tier
    pub tier: Tier,
    /// Number of tickets
    pub quantity: u32,
}

/// Body of the charge and issuance calls, built from the cart at checkout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Distinct events in the order, ascending
    pub event_ids: BTreeSet<EventId>,
    /// One entry per cart line
    pub ticket_lines: Vec<TicketLine>,
    /// Cart total, in cents
    pub amount: Money,
}

impl PaymentRequest {
    /// Snapshot of the cart
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCart`] when the cart has no lines.
    pub fn from_cart(cart: &Cart) -> Result<Self, ValidationError> {
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        Ok(Self {
            event_ids: cart.event_ids(),
            ticket_lines: cart
                .lines()
                .iter()
                .map(|line| TicketLine {
                    event_id: line.event_id,
                    tier: line.tier.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            amount: cart.total_price(),
        })
    }
}

/// Reply to a ticket listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketListing {
    /// The visitor's tickets
    Tickets(Vec<Ticket>),
    /// The service had nothing to list and explained why
    Warning(String),
}

/// Charges the visitor
///
/// Abstraction over the payment processor. The call is made once; the
/// orchestrator never retries it.
pub trait PaymentGateway: Send + Sync {
    /// Charge `request.amount` with `method`
    ///
    /// # Errors
    ///
    /// Returns an error if the charge was not confirmed.
    fn charge(
        &self,
        credential: Credential,
        method: PaymentMethod,
        request: PaymentRequest,
    ) -> ServiceFuture<()>;
}

/// Issues, lists and cancels tickets
pub trait TicketService: Send + Sync {
    /// Issue the tickets of a paid order, returning how many were created
    ///
    /// # Errors
    ///
    /// Returns an error if issuance failed.
    fn create_tickets(&self, credential: Credential, request: PaymentRequest) -> ServiceFuture<u32>;

    /// List the visitor's tickets
    ///
    /// # Errors
    ///
    /// Returns an error if the listing failed.
    fn user_tickets(&self, credential: Credential) -> ServiceFuture<TicketListing>;

    /// Cancel one ticket, returning the service's confirmation message
    ///
    /// # Errors
    ///
    /// Returns an error if the ticket was not cancelled.
    fn cancel_ticket(&self, credential: Credential, id: TicketId) -> ServiceFuture<String>;
}

/// Resolves the session credential or fails before any call is made
///
/// # Errors
///
/// Returns [`ServiceError::MissingCredential`] when there is none.
pub fn require_credential(credential: Option<&Credential>) -> Result<Credential, ServiceError> {
    credential.cloned().ok_or(ServiceError::MissingCredential)
}
