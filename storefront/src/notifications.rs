//! Visitor-facing notifications.
//!
//! Reducers never return errors to the caller; every outcome worth telling
//! the visitor about is appended here instead.

use crate::error::{ServiceError, ValidationError};
use boxoffice_core::{DateTime, SmallVec, Utc, effect::Effect};
use boxoffice_core::environment::Clock;

/// Severity of a notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Neutral information
    Info,
    /// Something completed
    Success,
    /// Something failed
    Error,
}

/// A message raised by a reducer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Severity
    pub level: Level,
    /// Stable machine-readable code
    pub code: String,
    /// Message shown to the visitor
    pub message: String,
    /// When it was raised
    pub raised_at: DateTime<Utc>,
}

/// Notifications currently on screen, oldest first
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Notifications {
    items: Vec<Notification>,
}

impl Notifications {
    /// Appends a notification stamped with the clock's current time
    pub fn raise(
        &mut self,
        clock: &dyn Clock,
        level: Level,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.items.push(Notification {
            level,
            code: code.into(),
            message: message.into(),
            raised_at: clock.now(),
        });
    }

    /// Surfaces a failed precondition
    pub fn validation(&mut self, clock: &dyn Clock, error: &ValidationError) {
        self.raise(clock, Level::Error, error.code(), error.to_string());
    }

    /// Surfaces a failed remote call
    pub fn service(&mut self, clock: &dyn Clock, error: &ServiceError) {
        self.raise(clock, Level::Error, error.code(), error.user_message());
    }

    /// All notifications, oldest first
    #[must_use]
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// Most recent notification
    #[must_use]
    pub fn latest(&self) -> Option<&Notification> {
        self.items.last()
    }

    /// Whether any notification carries `code`
    #[must_use]
    pub fn contains_code(&self, code: &str) -> bool {
        self.items.iter().any(|n| n.code == code)
    }

    /// Number of notifications
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is on screen
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes the notification at `index`; out-of-range indexes are ignored
    pub fn dismiss(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    /// Removes every notification
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Actions on the notification list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationAction {
    /// Remove one notification by position
    Dismiss(usize),
    /// Remove all notifications
    Clear,
}

pub(crate) fn reduce<A>(
    notifications: &mut Notifications,
    action: NotificationAction,
) -> SmallVec<[Effect<A>; 4]> {
    match action {
        NotificationAction::Dismiss(index) => notifications.dismiss(index),
        NotificationAction::Clear => notifications.clear(),
    }
    SmallVec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_testing::test_clock;

    #[test]
    fn test_raise_uses_clock() {
        let clock = test_clock();
        let mut notifications = Notifications::default();
        notifications.raise(&clock, Level::Info, "HELLO", "Welcome");

        let latest = notifications.latest().cloned();
        assert_eq!(latest.as_ref().map(|n| n.raised_at), Some(clock.now()));
        assert_eq!(latest.map(|n| n.code), Some("HELLO".to_string()));
    }

    #[test]
    fn test_dismiss_and_clear() {
        let clock = test_clock();
        let mut notifications = Notifications::default();
        notifications.validation(&clock, &ValidationError::EmptyCart);
        notifications.service(&clock, &ServiceError::Business("Sold out".into()));

        let _ = reduce::<()>(&mut notifications, NotificationAction::Dismiss(7));
        assert_eq!(notifications.len(), 2);

        let _ = reduce::<()>(&mut notifications, NotificationAction::Dismiss(0));
        assert_eq!(notifications.len(), 1);
        assert!(notifications.contains_code("BUSINESS_ERROR"));
        assert_eq!(
            notifications.latest().map(|n| n.message.as_str()),
            Some("Sold out")
        );

        let _ = reduce::<()>(&mut notifications, NotificationAction::Clear);
        assert!(notifications.is_empty());
    }
}
