//! HTTP implementation of the payment and ticket services.
//!
//! Every call carries the session credential as a bearer token. Replies are
//! JSON; any body of the shape `{"error": "..."}` is a business error, shown
//! verbatim, unless the status already says the credential was rejected or
//! the service is down.

use super::{PaymentGateway, PaymentMethod, PaymentRequest, ServiceFuture, TicketListing, TicketService};
use crate::config::{ConfigError, StorefrontConfig};
use crate::error::{ServiceError, TransportError};
use crate::session::Credential;
use crate::types::{EventId, Money, Ticket, TicketId, TicketStatus, Tier};
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Client for the storefront backend
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a client for `base_url` with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL, or [`ConfigError::HttpClient`] if the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base_url).map_err(|_| ConfigError::InvalidUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// See [`HttpBackend::new`].
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, ConfigError> {
        Self::new(&config.api_url, config.request_timeout)
    }

    /// Wrap in an `Arc` so one client serves as both services
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// `base_url` with `segments` appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChargeBody<'a> {
    payment_method: PaymentMethod,
    #[serde(flatten)]
    request: &'a PaymentRequest,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct ChargeReply {
    success: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CreatedCount {
    Count(u32),
    Created(Vec<serde_json::Value>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueReply {
    tickets_created: CreatedCount,
}

#[derive(Deserialize)]
struct ListingReply {
    tickets: Option<Vec<TicketRecord>>,
    warning: Option<String>,
}

#[derive(Deserialize)]
struct CancelReply {
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(u64),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TicketRecord {
    id: WireId,
    event_id: EventId,
    #[serde(default)]
    event_name: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    time: String,
    tier: Tier,
    price: Money,
    #[serde(default, alias = "qrCode")]
    qr_payload: String,
    #[serde(default)]
    status: String,
    purchase_date: DateTime<Utc>,
}

impl From<TicketRecord> for Ticket {
    fn from(record: TicketRecord) -> Self {
        let id = match record.id {
            WireId::Text(id) => TicketId::new(id),
            WireId::Number(id) => TicketId::new(id.to_string()),
        };
        Self {
            id,
            event_id: record.event_id,
            event_name: record.event_name,
            location: record.location,
            date: record.date,
            time: record.time,
            tier: record.tier,
            price: record.price,
            qr_payload: record.qr_payload,
            status: TicketStatus::from_code(&record.status),
            purchase_date: record.purchase_date,
        }
    }
}

// ============================================================================
// Response handling
// ============================================================================

fn send_failed(error: &reqwest::Error) -> ServiceError {
    tracing::warn!(%error, "Request failed before a response");
    TransportError::Unavailable(error.to_string()).into()
}

/// Maps a response to `T` or to the error taxonomy
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))?;
    let business = serde_json::from_str::<ErrorBody>(&body).ok().map(|b| b.error);

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) || status.is_server_error() {
        tracing::warn!(status = status.as_u16(), "Service rejected request");
        return Err(TransportError::from_status(status.as_u16()).into());
    }

    if let Some(message) = business {
        tracing::debug!(status = status.as_u16(), %message, "Service returned an error payload");
        return Err(ServiceError::Business(message));
    }

    if !status.is_success() {
        return Err(TransportError::from_status(status.as_u16()).into());
    }

    serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()).into())
}

impl PaymentGateway for HttpBackend {
    fn charge(
        &self,
        credential: Credential,
        method: PaymentMethod,
        request: PaymentRequest,
    ) -> ServiceFuture<()> {
        Box::pin(charge(
            self.client.clone(),
            self.endpoint(&["payments", "charge"]),
            credential,
            method,
            request,
        ))
    }
}

impl TicketService for HttpBackend {
    fn create_tickets(&self, credential: Credential, request: PaymentRequest) -> ServiceFuture<u32> {
        Box::pin(create_tickets(
            self.client.clone(),
            self.endpoint(&["tickets"]),
            credential,
            request,
        ))
    }

    fn user_tickets(&self, credential: Credential) -> ServiceFuture<TicketListing> {
        Box::pin(user_tickets(
            self.client.clone(),
            self.endpoint(&["tickets", "mine"]),
            credential,
        ))
    }

    fn cancel_ticket(&self, credential: Credential, id: TicketId) -> ServiceFuture<String> {
        let url = self.endpoint(&["tickets", id.as_str()]);
        Box::pin(cancel_ticket(self.client.clone(), url, credential, id))
    }
}

async fn charge(
    client: Client,
    url: Url,
    credential: Credential,
    method: PaymentMethod,
    request: PaymentRequest,
) -> Result<(), ServiceError> {
    tracing::debug!(%method, amount = request.amount.cents(), "POST payments/charge");
    let response = client
        .post(url)
        .bearer_auth(credential.as_str())
        .json(&ChargeBody {
            payment_method: method,
            request: &request,
        })
        .send()
        .await
        .map_err(|e| send_failed(&e))?;

    match decode::<ChargeReply>(response).await?.success {
        Some(true) => Ok(()),
        Some(false) => Err(ServiceError::Business("Payment was not completed".to_string())),
        None => Err(TransportError::Decode("charge reply has no success flag".to_string()).into()),
    }
}

async fn create_tickets(
    client: Client,
    url: Url,
    credential: Credential,
    request: PaymentRequest,
) -> Result<u32, ServiceError> {
    tracing::debug!(lines = request.ticket_lines.len(), "POST tickets");
    let response = client
        .post(url)
        .bearer_auth(credential.as_str())
        .json(&request)
        .send()
        .await
        .map_err(|e| send_failed(&e))?;

    Ok(match decode::<IssueReply>(response).await?.tickets_created {
        CreatedCount::Count(count) => count,
        CreatedCount::Created(tickets) => u32::try_from(tickets.len()).unwrap_or(u32::MAX),
    })
}

async fn user_tickets(client: Client, url: Url, credential: Credential) -> Result<TicketListing, ServiceError> {
    let response = client
        .get(url)
        .bearer_auth(credential.as_str())
        .send()
        .await
        .map_err(|e| send_failed(&e))?;

    match decode::<ListingReply>(response).await? {
        ListingReply {
            tickets: Some(records),
            ..
        } => Ok(TicketListing::Tickets(records.into_iter().map(Ticket::from).collect())),
        ListingReply {
            warning: Some(warning),
            ..
        } => Ok(TicketListing::Warning(warning)),
        ListingReply { .. } => Err(TransportError::Decode(
            "listing reply has neither tickets nor warning".to_string(),
        )
        .into()),
    }
}

async fn cancel_ticket(
    client: Client,
    url: Url,
    credential: Credential,
    id: TicketId,
) -> Result<String, ServiceError> {
    tracing::debug!(ticket_id = %id, "DELETE tickets/{{id}}");
    let response = client
        .delete(url)
        .bearer_auth(credential.as_str())
        .send()
        .await
        .map_err(|e| send_failed(&e))?;

    let reply = decode::<CancelReply>(response).await?;
    Ok(reply
        .message
        .unwrap_or_else(|| "Ticket cancelled".to_string()))
}
