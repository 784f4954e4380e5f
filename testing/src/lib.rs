//! # Box Office Testing
//!
//! Testing utilities for Box Office reducers and stores.
//!
//! This crate provides:
//! - A fixed clock so timestamps in state are deterministic
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Effect assertion helpers
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(StorefrontReducer::new())
//!     .with_env(test_environment())
//!     .given_state(StorefrontState::default())
//!     .when_action(StorefrontAction::Checkout(CheckoutAction::PlaceOrder))
//!     .then_state(|s| assert!(s.checkout.is_idle()))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use boxoffice_core::environment::Clock;

mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use boxoffice_testing::mocks::FixedClock;
    /// use boxoffice_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }
}

pub use mocks::{FixedClock, test_clock};
