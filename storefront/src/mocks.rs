//! Scripted service doubles for development, the demo and tests.
//!
//! Each mock answers from a queue of scripted replies (falling back to a
//! default when the queue is empty) and records every call it receives.

use crate::error::ServiceError;
use crate::services::{
    PaymentGateway, PaymentMethod, PaymentRequest, ServiceFuture, TicketListing, TicketService,
};
use crate::session::Credential;
use crate::types::TicketId;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn next<T: Clone>(script: &Mutex<VecDeque<T>>, fallback: &T) -> T {
    lock(script).pop_front().unwrap_or_else(|| fallback.clone())
}

fn reply<T: Send + 'static>(latency: Option<Duration>, result: Result<T, ServiceError>) -> ServiceFuture<T> {
    Box::pin(async move {
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        result
    })
}

/// One recorded charge call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChargeCall {
    /// Token used
    pub credential: Credential,
    /// Method used
    pub method: PaymentMethod,
    /// Body sent
    pub request: PaymentRequest,
}

/// Payment gateway answering from a script (approves by default)
#[derive(Debug)]
pub struct MockPaymentGateway {
    script: Mutex<VecDeque<Result<(), ServiceError>>>,
    fallback: Result<(), ServiceError>,
    latency: Option<Duration>,
    calls: Mutex<Vec<ChargeCall>>,
}

impl MockPaymentGateway {
    /// Gateway approving every charge
    #[must_use]
    pub const fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(()),
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Gateway rejecting every charge with `error`
    #[must_use]
    pub fn declining(error: ServiceError) -> Self {
        Self {
            fallback: Err(error),
            ..Self::new()
        }
    }

    /// Delay every reply
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue a reply for the next unscripted call
    pub fn push_reply(&self, reply: Result<(), ServiceError>) {
        lock(&self.script).push_back(reply);
    }

    /// Approving gateway as a trait object
    #[must_use]
    pub fn shared() -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new())
    }

    /// Every charge received, in order
    #[must_use]
    pub fn calls(&self) -> Vec<ChargeCall> {
        lock(&self.calls).clone()
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn charge(
        &self,
        credential: Credential,
        method: PaymentMethod,
        request: PaymentRequest,
    ) -> ServiceFuture<()> {
        tracing::info!(%method, amount = request.amount.cents(), "Mock charge");
        lock(&self.calls).push(ChargeCall {
            credential,
            method,
            request,
        });
        reply(self.latency, next(&self.script, &self.fallback))
    }
}

/// One recorded ticket service call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketCall {
    /// `create_tickets`
    Create(PaymentRequest),
    /// `user_tickets`
    List,
    /// `cancel_ticket`
    Cancel(TicketId),
}

/// Ticket service answering from scripts
///
/// Defaults: issuance reports one ticket per requested ticket, listing
/// returns no tickets, cancellation succeeds.
#[derive(Debug)]
pub struct MockTicketService {
    issue_script: Mutex<VecDeque<Result<u32, ServiceError>>>,
    listing_script: Mutex<VecDeque<Result<TicketListing, ServiceError>>>,
    cancel_script: Mutex<VecDeque<Result<String, ServiceError>>>,
    latency: Option<Duration>,
    calls: Mutex<Vec<TicketCall>>,
}

impl MockTicketService {
    /// Service with default answers
    #[must_use]
    pub const fn new() -> Self {
        Self {
            issue_script: Mutex::new(VecDeque::new()),
            listing_script: Mutex::new(VecDeque::new()),
            cancel_script: Mutex::new(VecDeque::new()),
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delay every reply
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Default service as a trait object
    #[must_use]
    pub fn shared() -> Arc<dyn TicketService> {
        Arc::new(Self::new())
    }

    /// Queue a reply for the next `create_tickets`
    pub fn push_issue_reply(&self, reply: Result<u32, ServiceError>) {
        lock(&self.issue_script).push_back(reply);
    }

    /// Queue a reply for the next `user_tickets`
    pub fn push_listing_reply(&self, reply: Result<TicketListing, ServiceError>) {
        lock(&self.listing_script).push_back(reply);
    }

    /// Queue a reply for the next `cancel_ticket`
    pub fn push_cancel_reply(&self, reply: Result<String, ServiceError>) {
        lock(&self.cancel_script).push_back(reply);
    }

    /// Every call received, in order
    #[must_use]
    pub fn calls(&self) -> Vec<TicketCall> {
        lock(&self.calls).clone()
    }

    /// Number of `create_tickets` calls received
    #[must_use]
    pub fn create_calls(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, TicketCall::Create(_)))
            .count()
    }

    /// Number of `cancel_ticket` calls received
    #[must_use]
    pub fn cancel_calls(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, TicketCall::Cancel(_)))
            .count()
    }
}

impl Default for MockTicketService {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketService for MockTicketService {
    fn create_tickets(&self, _credential: Credential, request: PaymentRequest) -> ServiceFuture<u32> {
        let requested = request
            .ticket_lines
            .iter()
            .fold(0u32, |total, line| total.saturating_add(line.quantity));
        tracing::info!(requested, "Mock ticket issuance");
        lock(&self.calls).push(TicketCall::Create(request));
        let result = lock(&self.issue_script).pop_front().unwrap_or(Ok(requested));
        reply(self.latency, result)
    }

    fn user_tickets(&self, _credential: Credential) -> ServiceFuture<TicketListing> {
        lock(&self.calls).push(TicketCall::List);
        let result = lock(&self.listing_script)
            .pop_front()
            .unwrap_or_else(|| Ok(TicketListing::Tickets(Vec::new())));
        reply(self.latency, result)
    }

    fn cancel_ticket(&self, _credential: Credential, id: TicketId) -> ServiceFuture<String> {
        tracing::info!(ticket_id = %id, "Mock cancellation");
        lock(&self.calls).push(TicketCall::Cancel(id));
        let result = lock(&self.cancel_script)
            .pop_front()
            .unwrap_or_else(|| Ok("Ticket cancelled successfully".to_string()));
        reply(self.latency, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::types::Money;
    use std::collections::BTreeSet;

    fn request() -> PaymentRequest {
        PaymentRequest {
            event_ids: BTreeSet::new(),
            ticket_lines: Vec::new(),
            amount: Money::from_dollars(10),
        }
    }

    #[tokio::test]
    async fn test_gateway_script_then_fallback() {
        let gateway = MockPaymentGateway::new();
        gateway.push_reply(Err(TransportError::Forbidden.into()));

        let first = gateway
            .charge(Credential::new("t"), PaymentMethod::Card, request())
            .await;
        let second = gateway
            .charge(Credential::new("t"), PaymentMethod::Card, request())
            .await;

        assert_eq!(first, Err(TransportError::Forbidden.into()));
        assert_eq!(second, Ok(()));
        assert_eq!(gateway.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_ticket_service_records_calls() {
        let service = MockTicketService::new();
        service.push_cancel_reply(Err(ServiceError::Business("Already cancelled".into())));

        let cancelled = service.cancel_ticket(Credential::new("t"), TicketId::new("x")).await;
        let listing = service.user_tickets(Credential::new("t")).await;

        assert_eq!(cancelled, Err(ServiceError::Business("Already cancelled".into())));
        assert_eq!(listing, Ok(TicketListing::Tickets(Vec::new())));
        assert_eq!(service.cancel_calls(), 1);
        assert_eq!(
            service.calls(),
            vec![TicketCall::Cancel(TicketId::new("x")), TicketCall::List]
        );
    }
}
