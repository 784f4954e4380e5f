//! Ergonomic testing utilities for reducers
//!
//! A fluent Given-When-Then API: set up state, apply one or more actions,
//! then assert on the resulting state and on the effects of the last action.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use boxoffice_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// ReducerTest::new(StorefrontReducer::new())
///     .with_env(test_environment())
///     .given_state(StorefrontState::default())
///     .when_action(StorefrontAction::Cart(CartAction::AddItem(line)))
///     .then_state(|state| assert_eq!(state.cart.total_items(), 2))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to apply (When); actions run in the order given
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects returned for the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test harness
    #[allow(clippy::expect_used)] // Test harness
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use boxoffice_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` is present.
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain a Delay dispatching an action matching `predicate`
    ///
    /// # Panics
    ///
    /// Panics if no matching Delay effect is found.
    pub fn assert_has_delayed_action<A, F>(effects: &[Effect<A>], predicate: F)
    where
        F: Fn(&A) -> bool,
    {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Delay { action, .. } if predicate(action))),
            "Expected a Delay effect with a matching action, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::{SmallVec, smallvec};
    use std::time::Duration;

    #[derive(Clone, Debug)]
    struct TurnstileState {
        admitted: u32,
        locked: bool,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TurnstileAction {
        Admit,
        Lock,
        Unlock,
        ScanRemotely,
    }

    struct TurnstileReducer;

    impl Reducer for TurnstileReducer {
        type State = TurnstileState;
        type Action = TurnstileAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TurnstileAction::Admit if !state.locked => {
                    state.admitted += 1;
                    smallvec![Effect::None]
                },
                TurnstileAction::Admit => SmallVec::new(),
                TurnstileAction::Lock => {
                    state.locked = true;
                    smallvec![Effect::Delay {
                        duration: Duration::from_secs(1),
                        action: Box::new(TurnstileAction::Unlock),
                    }]
                },
                TurnstileAction::Unlock => {
                    state.locked = false;
                    SmallVec::new()
                },
                TurnstileAction::ScanRemotely => {
                    smallvec![Effect::future(async { Some(TurnstileAction::Admit) })]
                },
            }
        }
    }

    fn open() -> TurnstileState {
        TurnstileState {
            admitted: 0,
            locked: false,
        }
    }

    #[test]
    fn test_single_action() {
        ReducerTest::new(TurnstileReducer)
            .with_env(())
            .given_state(open())
            .when_action(TurnstileAction::Admit)
            .then_state(|state| assert_eq!(state.admitted, 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_action_sequence() {
        ReducerTest::new(TurnstileReducer)
            .with_env(())
            .given_state(open())
            .when_action(TurnstileAction::Admit)
            .when_action(TurnstileAction::Lock)
            .when_action(TurnstileAction::Admit)
            .then_state(|state| {
                assert_eq!(state.admitted, 1);
                assert!(state.locked);
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 0))
            .run();
    }

    #[test]
    fn test_delay_assertion() {
        ReducerTest::new(TurnstileReducer)
            .with_env(())
            .given_state(open())
            .when_action(TurnstileAction::Lock)
            .then_effects(|effects| {
                assertions::assert_has_delayed_action(effects, |a| {
                    *a == TurnstileAction::Unlock
                });
            })
            .run();
    }

    #[test]
    fn test_future_assertion() {
        ReducerTest::new(TurnstileReducer)
            .with_env(())
            .given_state(open())
            .when_action(TurnstileAction::ScanRemotely)
            .then_state(|state| assert_eq!(state.admitted, 0))
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }
}
