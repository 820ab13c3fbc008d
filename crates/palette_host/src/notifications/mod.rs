//! Notification service contracts and adapters.

mod service;

pub use service::{
    MemoryNotificationService, NoopNotificationService, NotificationLevel, NotificationService,
};
