//! Storefront demo binary
//!
//! Drives one scripted visit: sign in, pick tickets, check out, land on the
//! ticket list. Uses the mock services unless `--http` is passed, in which
//! case it talks to `STOREFRONT_API_URL`.

use anyhow::Context;
use boxoffice_runtime::Store;
use boxoffice_storefront::mocks::{MockPaymentGateway, MockTicketService};
use boxoffice_storefront::{
    CheckoutAction, CheckoutSettings, Credential, EventId, EventSummary, HttpBackend,
    IssuanceOutcome, PaymentMethod, PaymentOutcome, Role, Route, SelectorAction, SessionAction,
    StorefrontAction, StorefrontConfig, StorefrontEnvironment, StorefrontReducer, StorefrontState,
    TicketsAction, Tier, TierCatalog,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = StorefrontConfig::from_env().context("loading configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let env = if std::env::args().any(|arg| arg == "--http") {
        tracing::info!(api_url = %config.api_url, "Using HTTP backend");
        let backend = HttpBackend::from_config(&config)
            .context("building HTTP backend")?
            .shared();
        StorefrontEnvironment::new(backend.clone(), backend)
    } else {
        tracing::info!("Using mock services");
        StorefrontEnvironment::new(
            Arc::new(MockPaymentGateway::new().with_latency(Duration::from_millis(100))),
            Arc::new(MockTicketService::new().with_latency(Duration::from_millis(100))),
        )
    }
    .with_settings(CheckoutSettings::from(&config));

    let store = Store::new(StorefrontState::default(), StorefrontReducer::new(), env);
    let patience = config.request_timeout.saturating_mul(2) + config.success_display;

    println!("=== Box Office Storefront ===\n");

    store
        .send(StorefrontAction::Navigate(Route::Cart))
        .await?;
    let location = store.state(|s| s.location).await;
    println!("Anonymous visit to {} lands on {location}", Route::Cart);

    let token = std::env::var("STOREFRONT_DEMO_TOKEN").unwrap_or_else(|_| "demo-token".to_string());
    store
        .send(StorefrontAction::Session(SessionAction::SignedIn {
            role: Role::Customer,
            credential: Some(Credential::new(token)),
        }))
        .await?;

    let event = EventSummary {
        id: EventId::new(1),
        name: "Midnight Strings".to_string(),
        date: "2025-07-14".to_string(),
        tiers: TierCatalog::default(),
    };

    for quantity in [2, 1] {
        store
            .send(StorefrontAction::Selector(SelectorAction::Open(event.clone())))
            .await?;
        store
            .send(StorefrontAction::Selector(SelectorAction::SetQuantity {
                tier: Tier::Standard,
                quantity,
            }))
            .await?;
        store
            .send(StorefrontAction::Selector(SelectorAction::Confirm))
            .await?;
    }

    let (items, total) = store
        .state(|s| (s.cart.total_items(), s.cart.total_price()))
        .await;
    println!("Cart: {items} ticket(s), {total}");

    store.send(StorefrontAction::Navigate(Route::Checkout)).await?;
    store
        .send(StorefrontAction::Checkout(CheckoutAction::SelectPaymentMethod(
            PaymentMethod::Card,
        )))
        .await?;

    let mut actions = store.subscribe_actions();
    let settled = store
        .send_and_wait_for(
            StorefrontAction::Checkout(CheckoutAction::PlaceOrder),
            |action| {
                matches!(
                    action,
                    StorefrontAction::Checkout(
                        CheckoutAction::PaymentSettled { .. } | CheckoutAction::IssuanceSettled { .. }
                    )
                )
            },
            patience,
        )
        .await;
    if settled.is_err() {
        let notice = store.state(|s| s.notifications.latest().cloned()).await;
        println!("Checkout did not start: {notice:?}");
        return Ok(());
    }

    let arrived = tokio::time::timeout(patience, async {
        while let Ok(action) = actions.recv().await {
            match action {
                StorefrontAction::Tickets(TicketsAction::Loaded { .. }) => return true,
                StorefrontAction::Checkout(CheckoutAction::PaymentSettled {
                    outcome: PaymentOutcome::Declined(_),
                    ..
                })
                | StorefrontAction::Checkout(CheckoutAction::IssuanceSettled {
                    outcome: IssuanceOutcome::Failed(_),
                    ..
                }) => return false,
                StorefrontAction::Checkout(CheckoutAction::PaymentSettled { .. }) => {
                    println!("Payment settled, issuing tickets");
                },
                _ => {},
            }
        }
        false
    })
    .await
    .unwrap_or(false);

    let (checkout, location, cart_empty, notices) = store
        .state(|s| {
            (
                s.checkout.clone(),
                s.location,
                s.cart.is_empty(),
                s.notifications.items().to_vec(),
            )
        })
        .await;

    println!("Checkout state: {checkout:?}");
    println!("Location: {location}, cart empty: {cart_empty}, tickets loaded: {arrived}");
    for notice in notices {
        println!("  [{:?}] {}: {}", notice.level, notice.code, notice.message);
    }

    store
        .shutdown(Duration::from_secs(5))
        .await
        .context("shutting down store")?;
    Ok(())
}
