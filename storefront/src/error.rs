//! Error taxonomy for the storefront.
//!
//! - [`ValidationError`]: a local precondition failed; nothing was sent
//! - [`ServiceError::MissingCredential`] and [`TransportError::Unauthorized`]:
//!   the session must sign in again
//! - [`TransportError`]: the remote call did not complete successfully
//! - [`ServiceError::Business`]: the remote service answered with an error payload
//!
//! None of these escape the store. Reducers turn them into notifications.

use crate::types::{TicketId, TicketStatus};
use thiserror::Error;

/// Category of a failure, as presented to the visitor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local precondition failure
    Validation,
    /// Missing or rejected credential
    Auth,
    /// Non-success response or no response at all
    Transport,
    /// Error payload from the service
    Business,
}

/// A precondition detected before any remote call
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Checkout attempted with no cart lines
    #[error("Your cart is empty")]
    EmptyCart,

    /// Selector confirmed with every tier at zero
    #[error("Select at least one ticket")]
    NoTicketsSelected,

    /// Checkout attempted before choosing card or PayPal
    #[error("Choose a payment method")]
    NoPaymentMethod,

    /// Cancellation requested for a ticket that is not valid
    #[error("Only valid tickets can be cancelled (this ticket is {status})")]
    NotCancellable {
        /// Current display status
        status: TicketStatus,
    },

    /// Cancellation confirmed without a pending confirmation for that ticket
    #[error("Confirm the cancellation of ticket {0} first")]
    CancellationNotConfirmed(TicketId),

    /// Ticket id not in the current list
    #[error("Ticket {0} was not found")]
    UnknownTicket(TicketId),
}

impl ValidationError {
    /// Stable code for notifications
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyCart => "EMPTY_CART",
            Self::NoTicketsSelected => "NO_TICKETS_SELECTED",
            Self::NoPaymentMethod => "NO_PAYMENT_METHOD",
            Self::NotCancellable { .. } => "TICKET_NOT_CANCELLABLE",
            Self::CancellationNotConfirmed(_) => "CANCELLATION_NOT_CONFIRMED",
            Self::UnknownTicket(_) => "UNKNOWN_TICKET",
        }
    }
}

/// A remote call that did not complete with a success status
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    /// 401: the credential was rejected
    #[error("Unauthorized")]
    Unauthorized,

    /// 403: the credential lacks permission
    #[error("Forbidden")]
    Forbidden,

    /// 5xx, connection failure or timeout
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Any other non-success status without an error payload
    #[error("Unexpected status {0}")]
    Status(u16),

    /// The reply could not be understood
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Categorizes an HTTP status code by class
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            500..=599 => Self::Unavailable(format!("status {status}")),
            other => Self::Status(other),
        }
    }
}

/// Failure of a call to the payment or ticket service
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// No bearer credential in the session; the call was never sent
    #[error("No credential available")]
    MissingCredential,

    /// Transport-level failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Error payload returned by the service, shown verbatim
    #[error("{0}")]
    Business(String),
}

impl ServiceError {
    /// Category of this failure
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential | Self::Transport(TransportError::Unauthorized) => {
                ErrorKind::Auth
            },
            Self::Transport(_) => ErrorKind::Transport,
            Self::Business(_) => ErrorKind::Business,
        }
    }

    /// Stable code for notifications
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential | Self::Transport(TransportError::Unauthorized) => {
                "AUTH_REQUIRED"
            },
            Self::Transport(TransportError::Forbidden) => "FORBIDDEN",
            Self::Transport(TransportError::Unavailable(_)) => "SERVICE_UNAVAILABLE",
            Self::Transport(TransportError::Status(_) | TransportError::Decode(_)) => {
                "UNEXPECTED_RESPONSE"
            },
            Self::Business(_) => "BUSINESS_ERROR",
        }
    }

    /// Message shown to the visitor
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential | Self::Transport(TransportError::Unauthorized) => {
                "Your session has expired. Please sign in again.".to_string()
            },
            Self::Transport(TransportError::Forbidden) => {
                "You do not have permission to perform this action.".to_string()
            },
            Self::Transport(TransportError::Unavailable(_)) => {
                "The service is temporarily unavailable. Please try again later.".to_string()
            },
            Self::Transport(TransportError::Status(status)) => {
                format!("Unexpected response from the server (status {status}).")
            },
            Self::Transport(TransportError::Decode(_)) => {
                "Unexpected response from the server.".to_string()
            },
            Self::Business(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(TransportError::from_status(401), TransportError::Unauthorized);
        assert_eq!(TransportError::from_status(403), TransportError::Forbidden);
        assert!(matches!(
            TransportError::from_status(503),
            TransportError::Unavailable(_)
        ));
        assert_eq!(TransportError::from_status(404), TransportError::Status(404));
    }

    #[test]
    fn test_distinct_messages_per_status_class() {
        let unauthorized = ServiceError::from(TransportError::Unauthorized).user_message();
        let forbidden = ServiceError::from(TransportError::Forbidden).user_message();
        let unavailable =
            ServiceError::from(TransportError::Unavailable("timeout".into())).user_message();

        assert_ne!(unauthorized, forbidden);
        assert_ne!(forbidden, unavailable);
        assert_ne!(unauthorized, unavailable);
        assert!(unauthorized.contains("sign in again"));
    }

    #[test]
    fn test_business_errors_are_verbatim() {
        let error = ServiceError::Business("Ticket already cancelled".into());
        assert_eq!(error.user_message(), "Ticket already cancelled");
        assert_eq!(error.kind(), ErrorKind::Business);
        assert_eq!(error.code(), "BUSINESS_ERROR");
    }

    #[test]
    fn test_missing_credential_is_auth() {
        assert_eq!(ServiceError::MissingCredential.kind(), ErrorKind::Auth);
        assert_eq!(
            ServiceError::from(TransportError::Unauthorized).kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            ServiceError::from(TransportError::Forbidden).kind(),
            ErrorKind::Transport
        );
    }
}
