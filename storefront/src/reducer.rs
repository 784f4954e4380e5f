//! The storefront's root state, action, environment and reducer.
//!
//! Each feature owns a slice of [`StorefrontState`] and a `reduce` function;
//! [`StorefrontReducer`] only routes actions to them and handles the two
//! cross-cutting inputs, session changes and navigation.

use crate::cart::{self, Cart, CartAction};
use crate::checkout::{self, CheckoutAction, CheckoutState};
use crate::config::StorefrontConfig;
use crate::guard::{self, Access, Route};
use crate::notifications::{self, Level, NotificationAction, Notifications};
use crate::selector::{self, SelectorAction, TicketSelector};
use crate::services::{PaymentGateway, TicketService};
use crate::session::{Session, SessionAction};
use crate::tickets::{self, TicketsAction, TicketsState};
use boxoffice_core::environment::{Clock, SystemClock};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer};
use boxoffice_runtime::Store;
use std::sync::Arc;
use std::time::Duration;

/// Effects returned by every storefront reducer
pub type Effects = SmallVec<[Effect<StorefrontAction>; 4]>;

/// Store type used by the application
pub type StorefrontStore =
    Store<StorefrontState, StorefrontAction, StorefrontEnvironment, StorefrontReducer>;

/// Everything the storefront knows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorefrontState {
    /// Who is signed in
    pub session: Session,
    /// Cart lines
    pub cart: Cart,
    /// Open ticket selector, if any
    pub selector: Option<TicketSelector>,
    /// Checkout saga
    pub checkout: CheckoutState,
    /// Issued tickets page
    pub tickets: TicketsState,
    /// Page on screen
    pub location: Route,
    /// Messages for the visitor
    pub notifications: Notifications,
}

/// Every input the storefront handles
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorefrontAction {
    /// Identity provider results
    Session(SessionAction),
    /// Cart mutations
    Cart(CartAction),
    /// Ticket selector interactions
    Selector(SelectorAction),
    /// Checkout saga
    Checkout(CheckoutAction),
    /// Ticket list
    Tickets(TicketsAction),
    /// Navigation request, resolved through the route guard
    Navigate(Route),
    /// Notification list
    Notifications(NotificationAction),
}

/// Timing of the checkout flow
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// How long the success screen stays before moving to the ticket list
    pub success_display: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            success_display: Duration::from_millis(3000),
        }
    }
}

impl From<&StorefrontConfig> for CheckoutSettings {
    fn from(config: &StorefrontConfig) -> Self {
        Self {
            success_display: config.success_display,
        }
    }
}

/// Injected dependencies
#[derive(Clone)]
pub struct StorefrontEnvironment {
    /// Payment service
    pub payments: Arc<dyn PaymentGateway>,
    /// Ticket service
    pub tickets: Arc<dyn TicketService>,
    /// Time source for notifications and checkout timestamps
    pub clock: Arc<dyn Clock>,
    /// Checkout timing
    pub settings: CheckoutSettings,
}

impl StorefrontEnvironment {
    /// Environment with the system clock and default settings
    #[must_use]
    pub fn new(payments: Arc<dyn PaymentGateway>, tickets: Arc<dyn TicketService>) -> Self {
        Self {
            payments,
            tickets,
            clock: Arc::new(SystemClock),
            settings: CheckoutSettings::default(),
        }
    }

    /// Replaces the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the checkout settings
    #[must_use]
    pub const fn with_settings(mut self, settings: CheckoutSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl std::fmt::Debug for StorefrontEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontEnvironment")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Root reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct StorefrontReducer;

impl StorefrontReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for StorefrontReducer {
    type State = StorefrontState;
    type Action = StorefrontAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            StorefrontAction::Session(action) => reduce_session(state, action, env),
            StorefrontAction::Cart(action) => cart::reduce(&mut state.cart, action, env),
            StorefrontAction::Selector(action) => selector::reduce(state, action, env),
            StorefrontAction::Checkout(action) => checkout::reduce(state, action, env),
            StorefrontAction::Tickets(action) => tickets::reduce(state, action, env),
            StorefrontAction::Navigate(route) => navigate(state, route, env),
            StorefrontAction::Notifications(action) => {
                notifications::reduce(&mut state.notifications, action)
            },
        }
    }
}

fn reduce_session(state: &mut StorefrontState, action: SessionAction, env: &StorefrontEnvironment) -> Effects {
    match action {
        SessionAction::SignedIn { role, credential } => {
            tracing::info!(%role, "Signed in");
            state.session = Session::Authenticated { role, credential };
            // The login page is public, so it now resolves elsewhere
            let location = state.location;
            navigate(state, location, env)
        },
        SessionAction::SignedOut => {
            if state.checkout.is_processing() {
                tracing::warn!("Sign-out refused while checkout is processing");
                state.notifications.raise(
                    env.clock.as_ref(),
                    Level::Error,
                    "CHECKOUT_IN_PROGRESS",
                    "Please wait for your payment to finish before signing out.",
                );
                return Effects::new();
            }

            tracing::info!("Signed out");
            state.session = Session::Anonymous;
            state.cart.clear();
            state.selector = None;
            state.checkout = CheckoutState::Idle;
            state.tickets = TicketsState::default();
            let location = state.location;
            navigate(state, location, env)
        },
    }
}

fn navigate(state: &mut StorefrontState, requested: Route, env: &StorefrontEnvironment) -> Effects {
    let access = guard::authorize(&state.session, requested);
    let destination = access.destination();
    let arriving = state.location != destination;
    state.location = destination;

    if destination != Route::Checkout && state.checkout.is_success() {
        state.checkout = CheckoutState::Idle;
    }

    match access {
        Access::Render(Route::MyTickets) if arriving => tickets::fetch(state, env),
        _ => Effects::new(),
    }
}
