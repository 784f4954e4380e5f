//! The visitor's issued tickets.
//!
//! The list is owned by the ticket service. The only local change ever made
//! is a speculative `Cancelled` patch after a successful cancel call; it is
//! kept next to the ticket, not written into it, and disappears on the next
//! authoritative fetch.
//!
//! Every fetch and cancel call carries a [`RequestId`]. A result is applied
//! only while its id is still the one recorded in state, so calls started
//! before a sign-out never land in the next session.

use crate::error::{ServiceError, ValidationError};
use crate::notifications::Level;
use crate::reducer::{Effects, StorefrontAction, StorefrontEnvironment, StorefrontState};
use crate::services::{TicketListing, require_credential};
use crate::types::{Ticket, TicketId, TicketStatus};
use boxoffice_core::{effect::Effect, smallvec};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identifies one fetch or cancel call
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Fresh random request id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A local status patch not yet confirmed by a fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpeculativeStatus {
    /// Status shown
    pub status: TicketStatus,
    /// Status the backend last reported
    pub previous: TicketStatus,
}

/// A ticket as displayed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketView {
    /// Ticket as last fetched
    pub ticket: Ticket,
    /// Unconfirmed local patch
    pub speculative: Option<SpeculativeStatus>,
}

impl TicketView {
    /// Status shown to the visitor
    #[must_use]
    pub fn status(&self) -> TicketStatus {
        self.speculative.map_or(self.ticket.status, |patch| patch.status)
    }

    /// Whether the shown status is unconfirmed
    #[must_use]
    pub const fn is_speculative(&self) -> bool {
        self.speculative.is_some()
    }
}

impl From<Ticket> for TicketView {
    fn from(ticket: Ticket) -> Self {
        Self {
            ticket,
            speculative: None,
        }
    }
}

/// Which tickets the list shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TicketFilter {
    /// Every ticket
    #[default]
    All,
    /// Only tickets showing this status
    Status(TicketStatus),
}

/// Number of tickets per shown status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TicketCounts {
    /// Valid
    pub valid: usize,
    /// Used
    pub used: usize,
    /// Cancelled
    pub cancelled: usize,
    /// Expired
    pub expired: usize,
}

/// Ticket list page state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TicketsState {
    /// Tickets in the order the service returned them
    pub tickets: Vec<TicketView>,
    /// Fetch in flight, if any
    pub fetching: Option<RequestId>,
    /// Tickets with a cancel call in flight
    pub in_flight: BTreeMap<TicketId, RequestId>,
    /// Ticket whose cancellation dialog is open
    pub awaiting_confirmation: Option<TicketId>,
    /// Informational message from the last fetch
    pub notice: Option<String>,
    /// Current filter
    pub filter: TicketFilter,
}

impl TicketsState {
    /// The ticket with `id`
    #[must_use]
    pub fn get(&self, id: &TicketId) -> Option<&TicketView> {
        self.tickets.iter().find(|view| view.ticket.id == *id)
    }

    /// Tickets passing the filter
    pub fn visible(&self) -> impl Iterator<Item = &TicketView> {
        self.tickets.iter().filter(move |view| match self.filter {
            TicketFilter::All => true,
            TicketFilter::Status(status) => view.status() == status,
        })
    }

    /// Tickets per shown status
    #[must_use]
    pub fn counts(&self) -> TicketCounts {
        self.tickets
            .iter()
            .fold(TicketCounts::default(), |mut counts, view| {
                match view.status() {
                    TicketStatus::Valid => counts.valid += 1,
                    TicketStatus::Used => counts.used += 1,
                    TicketStatus::Cancelled => counts.cancelled += 1,
                    TicketStatus::Expired => counts.expired += 1,
                }
                counts
            })
    }

    /// Whether a cancel call is in flight for `id`
    #[must_use]
    pub fn is_cancelling(&self, id: &TicketId) -> bool {
        self.in_flight.contains_key(id)
    }

    /// Whether a fetch is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.fetching.is_some()
    }

    /// Replaces the list with an authoritative fetch, dropping every
    /// speculative patch
    fn reconcile(&mut self, fetched: Vec<Ticket>) {
        for view in &self.tickets {
            let Some(patch) = view.speculative else {
                continue;
            };
            match fetched.iter().find(|ticket| ticket.id == view.ticket.id) {
                Some(ticket) if ticket.status == patch.status => {
                    tracing::debug!(ticket_id = %ticket.id, "Speculative status confirmed");
                },
                Some(ticket) => tracing::warn!(
                    ticket_id = %ticket.id,
                    shown = %patch.status,
                    before_cancel = %patch.previous,
                    reported = %ticket.status,
                    "Backend disagrees with speculative status"
                ),
                None => tracing::warn!(
                    ticket_id = %view.ticket.id,
                    before_cancel = %patch.previous,
                    "Speculatively patched ticket missing from fetch"
                ),
            }
        }
        self.tickets = fetched.into_iter().map(TicketView::from).collect();
    }
}

/// Ticket list interactions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketsAction {
    /// Load the visitor's tickets
    Fetch,
    /// The listing call finished
    Loaded {
        /// Fetch the result belongs to
        request: RequestId,
        /// Listing or failure
        result: Result<TicketListing, ServiceError>,
    },
    /// Open the cancellation dialog
    RequestCancellation(TicketId),
    /// Confirm in the dialog
    ConfirmCancellation(TicketId),
    /// Close the dialog
    DismissCancellation,
    /// The cancel call finished
    CancellationSettled {
        /// Ticket
        id: TicketId,
        /// Cancel call the result belongs to
        request: RequestId,
        /// Service message or failure
        result: Result<String, ServiceError>,
    },
    /// Change the filter
    SetFilter(TicketFilter),
}

pub(crate) fn reduce(
    state: &mut StorefrontState,
    action: TicketsAction,
    env: &StorefrontEnvironment,
) -> Effects {
    match action {
        TicketsAction::Fetch => fetch(state, env),
        TicketsAction::Loaded { request, result } => {
            if state.tickets.fetching != Some(request) {
                tracing::debug!(%request, "Ignoring stale ticket listing");
                return Effects::new();
            }
            state.tickets.fetching = None;
            match result {
                Ok(TicketListing::Tickets(tickets)) => {
                    tracing::debug!(count = tickets.len(), "Tickets loaded");
                    state.tickets.notice = None;
                    state.tickets.reconcile(tickets);
                },
                Ok(TicketListing::Warning(message)) => {
                    tracing::info!(%message, "Ticket listing returned a warning");
                    state.tickets.reconcile(Vec::new());
                    state.notifications.raise(
                        env.clock.as_ref(),
                        Level::Info,
                        "NO_TICKETS",
                        message.clone(),
                    );
                    state.tickets.notice = Some(message);
                },
                Err(error) => {
                    tracing::warn!(%error, "Failed to load tickets");
                    state.notifications.service(env.clock.as_ref(), &error);
                },
            }
            Effects::new()
        },
        TicketsAction::RequestCancellation(id) => {
            if let Err(error) = check_cancellable(&state.tickets, &id) {
                tracing::warn!(ticket_id = %id, code = error.code(), "Cancellation refused");
                state.notifications.validation(env.clock.as_ref(), &error);
            } else if state.tickets.is_cancelling(&id) {
                tracing::debug!(ticket_id = %id, "Cancellation already in flight");
            } else {
                state.tickets.awaiting_confirmation = Some(id);
            }
            Effects::new()
        },
        TicketsAction::ConfirmCancellation(id) => confirm_cancellation(state, id, env),
        TicketsAction::DismissCancellation => {
            state.tickets.awaiting_confirmation = None;
            Effects::new()
        },
        TicketsAction::CancellationSettled { id, request, result } => {
            if state.tickets.in_flight.get(&id) != Some(&request) {
                tracing::debug!(ticket_id = %id, %request, "Ignoring stale cancellation result");
                return Effects::new();
            }
            state.tickets.in_flight.remove(&id);
            match result {
                Ok(message) => {
                    tracing::info!(ticket_id = %id, "Ticket cancelled");
                    metrics::counter!("tickets.cancelled").increment(1);
                    if let Some(view) = state.tickets.tickets.iter_mut().find(|v| v.ticket.id == id) {
                        view.speculative = Some(SpeculativeStatus {
                            status: TicketStatus::Cancelled,
                            previous: view.ticket.status,
                        });
                    }
                    state
                        .notifications
                        .raise(env.clock.as_ref(), Level::Success, "TICKET_CANCELLED", message);
                },
                Err(error) => {
                    tracing::warn!(ticket_id = %id, %error, "Cancellation failed");
                    state.notifications.service(env.clock.as_ref(), &error);
                },
            }
            Effects::new()
        },
        TicketsAction::SetFilter(filter) => {
            state.tickets.filter = filter;
            Effects::new()
        },
    }
}

fn check_cancellable(tickets: &TicketsState, id: &TicketId) -> Result<(), ValidationError> {
    let view = tickets
        .get(id)
        .ok_or_else(|| ValidationError::UnknownTicket(id.clone()))?;
    match view.status() {
        TicketStatus::Valid => Ok(()),
        status => Err(ValidationError::NotCancellable { status }),
    }
}

pub(crate) fn fetch(state: &mut StorefrontState, env: &StorefrontEnvironment) -> Effects {
    let credential = match require_credential(state.session.credential()) {
        Ok(credential) => credential,
        Err(error) => {
            tracing::warn!("Ticket fetch skipped: no credential in session");
            state.notifications.service(env.clock.as_ref(), &error);
            return Effects::new();
        },
    };

    let request = RequestId::new();
    state.tickets.fetching = Some(request);
    let tickets = Arc::clone(&env.tickets);
    smallvec![Effect::future(async move {
        let result = tickets.user_tickets(credential).await;
        Some(StorefrontAction::Tickets(TicketsAction::Loaded { request, result }))
    })]
}

fn confirm_cancellation(state: &mut StorefrontState, id: TicketId, env: &StorefrontEnvironment) -> Effects {
    if state.tickets.is_cancelling(&id) {
        tracing::debug!(ticket_id = %id, "Duplicate cancellation confirm ignored");
        return Effects::new();
    }

    if state.tickets.awaiting_confirmation.as_ref() != Some(&id) {
        let error = ValidationError::CancellationNotConfirmed(id);
        tracing::warn!(code = error.code(), "Cancellation confirm without dialog");
        state.notifications.validation(env.clock.as_ref(), &error);
        return Effects::new();
    }
    state.tickets.awaiting_confirmation = None;

    if let Err(error) = check_cancellable(&state.tickets, &id) {
        state.notifications.validation(env.clock.as_ref(), &error);
        return Effects::new();
    }

    let credential = match require_credential(state.session.credential()) {
        Ok(credential) => credential,
        Err(error) => {
            state.notifications.service(env.clock.as_ref(), &error);
            return Effects::new();
        },
    };

    tracing::info!(ticket_id = %id, "Cancelling ticket");
    let request = RequestId::new();
    state.tickets.in_flight.insert(id.clone(), request);
    let tickets = Arc::clone(&env.tickets);
    smallvec![Effect::future(async move {
        let result = tickets.cancel_ticket(credential, id.clone()).await;
        Some(StorefrontAction::Tickets(TicketsAction::CancellationSettled {
            id,
            request,
            result,
        }))
    })]
}
