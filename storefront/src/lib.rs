//! # Box Office Storefront
//!
//! The ticket storefront client: a visitor picks tiers for an event, builds
//! a cart and checks out through an external payment service and an
//! external ticket service.
//!
//! ## Features
//!
//! - [`cart`]: cart lines keyed by event and tier, with derived totals
//! - [`selector`]: per-event tier quantity picker
//! - [`checkout`]: two-step saga, charge then issue, with typed outcomes
//! - [`tickets`]: ticket list with speculative cancellation
//! - [`guard`]: route authorization from the session role
//!
//! All of it runs as one reducer inside a [`boxoffice_runtime::Store`]:
//!
//! ```ignore
//! use boxoffice_storefront::{StorefrontEnvironment, StorefrontReducer, StorefrontState};
//! use boxoffice_runtime::Store;
//!
//! let backend = HttpBackend::from_config(&config)?.shared();
//! let env = StorefrontEnvironment::new(backend.clone(), backend);
//! let store = Store::new(StorefrontState::default(), StorefrontReducer::new(), env);
//!
//! store.send(StorefrontAction::Checkout(CheckoutAction::PlaceOrder)).await?;
//! ```

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod guard;
pub mod mocks;
pub mod notifications;
pub mod reducer;
pub mod selector;
pub mod services;
pub mod session;
pub mod tickets;
pub mod types;

pub use cart::{Cart, CartAction, CartLine};
pub use checkout::{
    AttemptId, CheckoutAction, CheckoutFailure, CheckoutState, CheckoutStep, IssuanceOutcome,
    PaymentOutcome,
};
pub use config::{ConfigError, StorefrontConfig};
pub use error::{ErrorKind, ServiceError, TransportError, ValidationError};
pub use guard::{Access, Route, RouteGuard, authorize, private_route, public_route};
pub use notifications::{Level, Notification, NotificationAction, Notifications};
pub use reducer::{
    CheckoutSettings, StorefrontAction, StorefrontEnvironment, StorefrontReducer, StorefrontState,
    StorefrontStore,
};
pub use selector::{SelectorAction, TicketSelector};
pub use services::http::HttpBackend;
pub use services::{
    PaymentGateway, PaymentMethod, PaymentRequest, TicketLine, TicketListing, TicketService,
};
pub use session::{Credential, Role, Session, SessionAction};
pub use tickets::{RequestId, TicketFilter, TicketView, TicketsAction, TicketsState};
pub use types::{EventId, EventSummary, Money, Ticket, TicketId, TicketStatus, Tier, TierCatalog};
