//! Tests for the HTTP backend against a mock server.
//!
//! Run with: `cargo test --test http_backend`

#![allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]

use boxoffice_storefront::{
    Credential, EventId, HttpBackend, Money, PaymentGateway, PaymentMethod, PaymentRequest,
    ServiceError, TicketId, TicketLine, TicketListing, TicketService, TicketStatus, Tier,
    TransportError,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
}

fn credential() -> Credential {
    Credential::new("t")
}

fn request() -> PaymentRequest {
    PaymentRequest {
        event_ids: BTreeSet::from([EventId::new(1)]),
        ticket_lines: vec![TicketLine {
            event_id: EventId::new(1),
            tier: Tier::Standard,
            quantity: 3,
        }],
        amount: Money::from_dollars(135),
    }
}

async fn charge_replying(status: u16, body: serde_json::Value) -> Result<(), ServiceError> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/payments/charge"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    backend(&server)
        .charge(credential(), PaymentMethod::Card, request())
        .await
}

#[tokio::test]
async fn test_charge_sends_bearer_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/payments/charge"))
        .and(header("authorization", "Bearer t"))
        .and(body_json(json!({
            "paymentMethod": "card",
            "eventIds": [1],
            "ticketLines": [{"eventId": 1, "tier": "Standard", "quantity": 3}],
            "amount": 13500
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let result = backend(&server)
        .charge(credential(), PaymentMethod::Card, request())
        .await;

    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn test_charge_error_payload_is_business_error() {
    let result = charge_replying(400, json!({"error": "Card declined"})).await;
    assert_eq!(result, Err(ServiceError::Business("Card declined".to_string())));

    // An error payload wins even on a success status
    let result = charge_replying(200, json!({"error": "Insufficient funds"})).await;
    assert_eq!(result, Err(ServiceError::Business("Insufficient funds".to_string())));
}

#[tokio::test]
async fn test_charge_unsuccessful_flag() {
    let result = charge_replying(200, json!({"success": false})).await;
    assert!(matches!(result, Err(ServiceError::Business(_))));

    let result = charge_replying(200, json!({"status": "ok"})).await;
    assert!(matches!(
        result,
        Err(ServiceError::Transport(TransportError::Decode(_)))
    ));
}

#[tokio::test]
async fn test_status_classes_map_to_transport_errors() {
    let unauthorized = charge_replying(401, json!({"error": "Token expired"})).await;
    assert_eq!(unauthorized, Err(TransportError::Unauthorized.into()));
    assert_eq!(unauthorized.unwrap_err().code(), "AUTH_REQUIRED");

    let forbidden = charge_replying(403, json!({})).await;
    assert_eq!(forbidden, Err(TransportError::Forbidden.into()));

    let unavailable = charge_replying(503, json!({"error": "maintenance"})).await;
    assert!(matches!(
        unavailable,
        Err(ServiceError::Transport(TransportError::Unavailable(_)))
    ));

    let not_found = charge_replying(404, json!({})).await;
    assert_eq!(not_found, Err(TransportError::Status(404).into()));
}

#[tokio::test]
async fn test_unreachable_service_is_unavailable() {
    let server = MockServer::start().await;
    let backend = backend(&server);
    drop(server);

    let result = backend.user_tickets(credential()).await;
    assert!(matches!(
        result,
        Err(ServiceError::Transport(TransportError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn test_create_tickets_accepts_count_or_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tickets"))
        .and(header("authorization", "Bearer t"))
        .and(body_partial_json(json!({"amount": 13500})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ticketsCreated": 3})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tickets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "ticketsCreated": [{"id": "a"}, {"id": "b"}]
        })))
        .mount(&server)
        .await;

    let backend = backend(&server);
    assert_eq!(backend.create_tickets(credential(), request()).await, Ok(3));
    assert_eq!(backend.create_tickets(credential(), request()).await, Ok(2));
}

#[tokio::test]
async fn test_user_tickets_decodes_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tickets/mine"))
        .and(header("authorization", "Bearer t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tickets": [
                {
                    "id": "tk-1",
                    "eventId": 1,
                    "eventName": "Midnight Strings",
                    "location": "Hall A",
                    "date": "2025-07-14",
                    "time": "21:00",
                    "tier": "Standard",
                    "price": 4500,
                    "qrPayload": "QR-1",
                    "status": "valid",
                    "purchaseDate": "2025-06-01T12:00:00Z"
                },
                {
                    "id": 2,
                    "eventId": 1,
                    "tier": "Balcony",
                    "price": 3000,
                    "status": "archived",
                    "purchaseDate": "2025-06-01T12:00:00Z"
                }
            ]
        })))
        .mount(&server)
        .await;

    let listing = backend(&server).user_tickets(credential()).await.unwrap();
    let TicketListing::Tickets(tickets) = listing else {
        panic!("expected a ticket listing");
    };

    assert_eq!(tickets.len(), 2);
    assert_eq!(tickets[0].id, TicketId::new("tk-1"));
    assert_eq!(tickets[0].status, TicketStatus::Valid);
    assert_eq!(tickets[0].price, Money::from_dollars(45));
    assert_eq!(tickets[1].id, TicketId::new("2"));
    assert_eq!(tickets[1].tier, Tier::Other("Balcony".to_string()));
    assert_eq!(tickets[1].status, TicketStatus::Expired);
}

#[tokio::test]
async fn test_user_tickets_warning() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tickets/mine"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"warning": "No tickets found"})),
        )
        .mount(&server)
        .await;

    let listing = backend(&server).user_tickets(credential()).await;
    assert_eq!(listing, Ok(TicketListing::Warning("No tickets found".to_string())));
}

#[tokio::test]
async fn test_cancel_ticket_uses_delete_and_returns_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tickets/tk-9"))
        .and(header("authorization", "Bearer t"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Refund issued"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/tickets/tk-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let backend = backend(&server);
    assert_eq!(
        backend.cancel_ticket(credential(), TicketId::new("tk-9")).await,
        Ok("Refund issued".to_string())
    );
    assert_eq!(
        backend.cancel_ticket(credential(), TicketId::new("tk-10")).await,
        Ok("Ticket cancelled".to_string())
    );
}

#[tokio::test]
async fn test_cancel_ticket_refusal() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tickets/tk-1"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"error": "Ticket already used"})),
        )
        .mount(&server)
        .await;

    let result = backend(&server)
        .cancel_ticket(credential(), TicketId::new("tk-1"))
        .await;
    assert_eq!(result, Err(ServiceError::Business("Ticket already used".to_string())));
}
