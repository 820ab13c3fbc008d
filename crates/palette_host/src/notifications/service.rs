//! Notification service contracts and adapters.

use std::{cell::RefCell, rc::Rc};

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Completed operation.
    Success,
    /// Failed operation.
    Error,
}

/// Host service for toast-style notifications.
///
/// The palette only supplies the text; rendering belongs to the host.
pub trait NotificationService {
    /// Raises one notification.
    fn notify(&self, level: NotificationLevel, message: &str);

    /// Raises a success notification.
    fn success(&self, message: &str) {
        self.notify(NotificationLevel::Success, message);
    }

    /// Raises an error notification.
    fn error(&self, message: &str) {
        self.notify(NotificationLevel::Error, message);
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op notification service for hosts without a toast surface.
pub struct NoopNotificationService;

impl NotificationService for NoopNotificationService {
    fn notify(&self, _level: NotificationLevel, _message: &str) {}
}

#[derive(Debug, Clone, Default)]
/// Notification service that records every notification in order.
pub struct MemoryNotificationService {
    inner: Rc<RefCell<Vec<(NotificationLevel, String)>>>,
}

impl MemoryNotificationService {
    /// Returns all recorded notifications.
    pub fn entries(&self) -> Vec<(NotificationLevel, String)> {
        self.inner.borrow().clone()
    }

    /// Returns recorded messages of one level.
    pub fn messages(&self, level: NotificationLevel) -> Vec<String> {
        self.inner
            .borrow()
            .iter()
            .filter(|(entry_level, _)| *entry_level == level)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl NotificationService for MemoryNotificationService {
    fn notify(&self, level: NotificationLevel, message: &str) {
        self.inner.borrow_mut().push((level, message.to_string()));
    }
}
