//! Checkout saga: charge, then issue.
//!
//! ```text
//! Idle ──SelectPaymentMethod──► MethodChosen ──PlaceOrder──► Processing{Charging}
//!                                                               │
//!                          PaymentSettled(Declined) ◄───────────┤
//!                          → Failed(PaymentDeclined)            │ PaymentSettled(Charged)
//!                                                               ▼
//!                                                       Processing{Issuing}
//!                                                               │
//!          IssuanceSettled(Failed)                              │ IssuanceSettled(Issued)
//!          → Failed(ChargedNotTicketed) ◄───────────────────────┴──► Success
//!                                                                     (paid lines removed,
//!                                                                      delayed Navigate(MyTickets))
//! ```
//!
//! The issuance call is only created by the reducer arm that handles an
//! explicit `Charged`, so the two calls can never overlap. Every settlement
//! carries the [`AttemptId`] of the attempt that produced it and is ignored
//! if that attempt is no longer current.

use crate::error::{ServiceError, ValidationError};
use crate::guard::Route;
use crate::notifications::Level;
use crate::reducer::{Effects, StorefrontAction, StorefrontEnvironment, StorefrontState};
use crate::services::{PaymentMethod, PaymentRequest, require_credential};
use crate::session::Credential;
use crate::types::Money;
use boxoffice_core::environment::Clock;
use boxoffice_core::{DateTime, Utc, effect::Effect, smallvec};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identifies one checkout attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Fresh random attempt id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote call currently awaited
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutStep {
    /// Waiting for the payment service
    Charging,
    /// Payment confirmed, waiting for the ticket service
    Issuing,
}

/// Result of the charge call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The payment service confirmed the charge
    Charged,
    /// Anything else
    Declined(ServiceError),
}

/// Result of the issuance call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssuanceOutcome {
    /// Tickets were created
    Issued {
        /// How many the service reported
        tickets_created: u32,
    },
    /// No tickets were created
    Failed(ServiceError),
}

/// Why a checkout attempt ended in `Failed`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutFailure {
    /// The charge was not made; nothing happened
    PaymentDeclined(ServiceError),
    /// The visitor was charged but holds no tickets
    ///
    /// Nothing is refunded or retried from here. The cart is kept so support
    /// can see what was ordered.
    ChargedNotTicketed {
        /// Amount that was charged
        amount: Money,
        /// Why issuance failed
        error: ServiceError,
    },
}

impl CheckoutFailure {
    /// Notification code for this failure
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PaymentDeclined(error) => error.code(),
            Self::ChargedNotTicketed { .. } => "CHARGED_NOT_TICKETED",
        }
    }

    /// Step of the saga that failed
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::PaymentDeclined(_) => "payment",
            Self::ChargedNotTicketed { .. } => "issuance",
        }
    }

    /// Message shown to the visitor
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::PaymentDeclined(error) => error.user_message(),
            Self::ChargedNotTicketed { amount, error } => format!(
                "Your payment of {amount} was taken but your tickets could not be issued ({}). \
                 Please contact support; do not pay again.",
                error.user_message()
            ),
        }
    }
}

/// Where the checkout page is
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckoutState {
    /// Cart view, no payment method chosen
    #[default]
    Idle,
    /// Ready to place the order
    MethodChosen(PaymentMethod),
    /// A remote call is in flight; checkout controls are inert
    Processing {
        /// Current attempt
        attempt: AttemptId,
        /// Chosen method
        method: PaymentMethod,
        /// Snapshot of the cart sent to both services
        request: PaymentRequest,
        /// Credential captured when the order was placed
        credential: Credential,
        /// Call being awaited
        step: CheckoutStep,
    },
    /// Tickets issued; navigation to the ticket list is scheduled
    Success {
        /// How many tickets were created
        tickets_created: u32,
        /// When issuance was confirmed
        completed_at: DateTime<Utc>,
    },
    /// Back to the cart view with the reason the attempt failed
    Failed {
        /// Why
        failure: CheckoutFailure,
    },
}

impl CheckoutState {
    /// No method chosen and no failure on screen
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// A remote call is in flight
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    /// Tickets were issued
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Chosen payment method, if any
    #[must_use]
    pub const fn method(&self) -> Option<PaymentMethod> {
        match self {
            Self::MethodChosen(method) | Self::Processing { method, .. } => Some(*method),
            _ => None,
        }
    }

    /// Failure on screen, if any
    #[must_use]
    pub const fn failure(&self) -> Option<&CheckoutFailure> {
        match self {
            Self::Failed { failure } => Some(failure),
            _ => None,
        }
    }

    /// Current attempt, while processing
    #[must_use]
    pub const fn attempt(&self) -> Option<AttemptId> {
        match self {
            Self::Processing { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }

    /// Call awaited, while processing
    #[must_use]
    pub const fn step(&self) -> Option<CheckoutStep> {
        match self {
            Self::Processing { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Checkout inputs: visitor intents and remote call results
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutAction {
    /// Card or `PayPal` chosen
    SelectPaymentMethod(PaymentMethod),
    /// "Pay" pressed
    PlaceOrder,
    /// The charge call finished
    PaymentSettled {
        /// Attempt the call belonged to
        attempt: AttemptId,
        /// What happened
        outcome: PaymentOutcome,
    },
    /// The issuance call finished
    IssuanceSettled {
        /// Attempt the call belonged to
        attempt: AttemptId,
        /// What happened
        outcome: IssuanceOutcome,
    },
    /// Dismiss a failure or start over
    Reset,
}

pub(crate) fn reduce(
    state: &mut StorefrontState,
    action: CheckoutAction,
    env: &StorefrontEnvironment,
) -> Effects {
    match action {
        CheckoutAction::SelectPaymentMethod(method) => {
            select_method(state, method, env);
            Effects::new()
        },
        CheckoutAction::PlaceOrder => place_order(state, env),
        CheckoutAction::PaymentSettled { attempt, outcome } => {
            payment_settled(state, attempt, outcome, env)
        },
        CheckoutAction::IssuanceSettled { attempt, outcome } => {
            issuance_settled(state, attempt, outcome, env)
        },
        CheckoutAction::Reset => {
            if state.checkout.is_processing() {
                tracing::warn!("Reset ignored while checkout is processing");
            } else {
                state.checkout = CheckoutState::Idle;
            }
            Effects::new()
        },
    }
}

fn select_method(state: &mut StorefrontState, method: PaymentMethod, env: &StorefrontEnvironment) {
    if state.checkout.is_processing() {
        tracing::warn!(%method, "Payment method change ignored while processing");
        return;
    }

    if let Some(failure @ CheckoutFailure::ChargedNotTicketed { .. }) = state.checkout.failure() {
        tracing::warn!(%method, "New checkout blocked until the charged-not-ticketed failure is dismissed");
        let message = failure.user_message();
        state.notifications.raise(
            env.clock.as_ref(),
            Level::Error,
            "CHARGED_NOT_TICKETED",
            message,
        );
        return;
    }

    tracing::debug!(%method, "Payment method selected");
    state.checkout = CheckoutState::MethodChosen(method);
}

fn place_order(state: &mut StorefrontState, env: &StorefrontEnvironment) -> Effects {
    if state.checkout.is_processing() {
        tracing::warn!("PlaceOrder ignored: checkout already processing");
        return Effects::new();
    }

    let request = match PaymentRequest::from_cart(&state.cart) {
        Ok(request) => request,
        Err(error) => return reject(state, &error, env),
    };

    let CheckoutState::MethodChosen(method) = state.checkout else {
        return reject(state, &ValidationError::NoPaymentMethod, env);
    };

    let credential = match require_credential(state.session.credential()) {
        Ok(credential) => credential,
        Err(error) => {
            tracing::warn!("PlaceOrder rejected: no credential in session");
            state.notifications.service(env.clock.as_ref(), &error);
            return Effects::new();
        },
    };

    let attempt = AttemptId::new();
    tracing::info!(
        %attempt,
        %method,
        amount = request.amount.cents(),
        lines = request.ticket_lines.len(),
        "Checkout started, charging"
    );

    state.checkout = CheckoutState::Processing {
        attempt,
        method,
        request: request.clone(),
        credential: credential.clone(),
        step: CheckoutStep::Charging,
    };

    let payments = Arc::clone(&env.payments);
    smallvec![Effect::future(async move {
        let outcome = match payments.charge(credential, method, request).await {
            Ok(()) => PaymentOutcome::Charged,
            Err(error) => PaymentOutcome::Declined(error),
        };
        Some(StorefrontAction::Checkout(CheckoutAction::PaymentSettled {
            attempt,
            outcome,
        }))
    })]
}

fn reject(state: &mut StorefrontState, error: &ValidationError, env: &StorefrontEnvironment) -> Effects {
    tracing::warn!(code = error.code(), "PlaceOrder rejected");
    state.notifications.validation(env.clock.as_ref(), error);
    Effects::new()
}

/// Current `(credential, request)` if `attempt` is the attempt awaiting `step`
fn current(state: &CheckoutState, attempt: AttemptId, step: CheckoutStep) -> Option<(Credential, PaymentRequest)> {
    match state {
        CheckoutState::Processing {
            attempt: current,
            step: current_step,
            credential,
            request,
            ..
        } if *current == attempt && *current_step == step => {
            Some((credential.clone(), request.clone()))
        },
        _ => None,
    }
}

fn payment_settled(
    state: &mut StorefrontState,
    attempt: AttemptId,
    outcome: PaymentOutcome,
    env: &StorefrontEnvironment,
) -> Effects {
    let Some((credential, request)) = current(&state.checkout, attempt, CheckoutStep::Charging) else {
        tracing::warn!(%attempt, "Ignoring stale payment result");
        return Effects::new();
    };

    match outcome {
        PaymentOutcome::Charged => {
            tracing::info!(%attempt, amount = request.amount.cents(), "Payment confirmed, issuing tickets");
            if let CheckoutState::Processing { step, .. } = &mut state.checkout {
                *step = CheckoutStep::Issuing;
            }

            let tickets = Arc::clone(&env.tickets);
            smallvec![Effect::future(async move {
                let outcome = match tickets.create_tickets(credential, request).await {
                    Ok(tickets_created) => IssuanceOutcome::Issued { tickets_created },
                    Err(error) => IssuanceOutcome::Failed(error),
                };
                Some(StorefrontAction::Checkout(CheckoutAction::IssuanceSettled {
                    attempt,
                    outcome,
                }))
            })]
        },
        PaymentOutcome::Declined(error) => {
            tracing::warn!(%attempt, %error, "Payment failed, cart kept");
            fail(state, CheckoutFailure::PaymentDeclined(error), env);
            Effects::new()
        },
    }
}

fn issuance_settled(
    state: &mut StorefrontState,
    attempt: AttemptId,
    outcome: IssuanceOutcome,
    env: &StorefrontEnvironment,
) -> Effects {
    let Some((_, request)) = current(&state.checkout, attempt, CheckoutStep::Issuing) else {
        tracing::warn!(%attempt, "Ignoring stale issuance result");
        return Effects::new();
    };

    match outcome {
        IssuanceOutcome::Issued { tickets_created } => {
            tracing::info!(%attempt, tickets_created, "Checkout completed");
            metrics::counter!("checkout.completed").increment(1);

            // Only what was paid for leaves the cart; lines added meanwhile stay
            for line in &request.ticket_lines {
                state.cart.deduct(line.event_id, &line.tier, line.quantity);
            }
            state.checkout = CheckoutState::Success {
                tickets_created,
                completed_at: env.clock.now(),
            };
            state.notifications.raise(
                env.clock.as_ref(),
                Level::Success,
                "CHECKOUT_COMPLETED",
                format!("Payment successful! {tickets_created} ticket(s) issued."),
            );

            smallvec![Effect::Delay {
                duration: env.settings.success_display,
                action: Box::new(StorefrontAction::Navigate(Route::MyTickets)),
            }]
        },
        IssuanceOutcome::Failed(error) => {
            tracing::error!(
                %attempt,
                amount = request.amount.cents(),
                %error,
                "Charged but tickets were not issued; manual remediation required"
            );
            fail(
                state,
                CheckoutFailure::ChargedNotTicketed {
                    amount: request.amount,
                    error,
                },
                env,
            );
            Effects::new()
        },
    }
}

fn fail(state: &mut StorefrontState, failure: CheckoutFailure, env: &StorefrontEnvironment) {
    metrics::counter!("checkout.failed", "stage" => failure.stage()).increment(1);
    state
        .notifications
        .raise(env.clock.as_ref(), Level::Error, failure.code(), failure.user_message());
    state.checkout = CheckoutState::Failed { failure };
}
