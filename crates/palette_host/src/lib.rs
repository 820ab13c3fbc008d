//! Typed host-service contracts consumed by the command palette.
//!
//! This crate is the API-first boundary for everything the palette treats as an external
//! collaborator: toast notifications, event-loop delays, routing, theme, the admin session, and
//! the admin directory. Each contract has a no-op adapter, and in-memory adapters for hosts and
//! tests that need observable behavior.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod directory;
pub mod host;
pub mod navigation;
pub mod notifications;
pub mod session;
pub mod timer;

pub use directory::{AdminDirectory, DirectoryFuture, MemoryAdminDirectory, NoopAdminDirectory};
pub use host::PaletteHostServices;
pub use navigation::{
    MemoryNavigationService, NavigationService, NoopNavigationService, ThemeService,
};
pub use notifications::{
    MemoryNotificationService, NoopNotificationService, NotificationLevel, NotificationService,
};
pub use session::{
    MemorySessionService, NoopSessionService, SessionCall, SessionFuture, SessionService,
};
pub use timer::{DelayService, ImmediateDelayService, ManualDelayService};
