//! Host service bundle injected into the command palette.

use std::rc::Rc;

use crate::{
    AdminDirectory, DelayService, ImmediateDelayService, NavigationService, NoopAdminDirectory,
    NoopNavigationService, NoopNotificationService, NoopSessionService, NotificationService,
    SessionService, ThemeService,
};

/// Runtime-selected host service bundle shared by the palette engine and command actions.
///
/// All environment-specific adapter selection happens before this bundle reaches the palette,
/// which keeps the engine decoupled from router, toast, and REST client details.
#[derive(Clone)]
pub struct PaletteHostServices {
    /// Toast delivery.
    pub notifications: Rc<dyn NotificationService>,
    /// Event-loop delays for debounce and close timing.
    pub delays: Rc<dyn DelayService>,
    /// Client-side routing.
    pub navigation: Rc<dyn NavigationService>,
    /// Color scheme application.
    pub theme: Rc<dyn ThemeService>,
    /// Signed-in admin session.
    pub session: Rc<dyn SessionService>,
    /// Admin REST lookups.
    pub directory: Rc<dyn AdminDirectory>,
}

impl PaletteHostServices {
    /// Bundle of no-op adapters with immediate delays.
    pub fn noop() -> Self {
        Self {
            notifications: Rc::new(NoopNotificationService),
            delays: Rc::new(ImmediateDelayService),
            navigation: Rc::new(NoopNavigationService),
            theme: Rc::new(NoopNavigationService),
            session: Rc::new(NoopSessionService),
            directory: Rc::new(NoopAdminDirectory),
        }
    }

    /// Replaces the notification service.
    pub fn with_notifications(mut self, service: Rc<dyn NotificationService>) -> Self {
        self.notifications = service;
        self
    }

    /// Replaces the delay service.
    pub fn with_delays(mut self, service: Rc<dyn DelayService>) -> Self {
        self.delays = service;
        self
    }

    /// Replaces the navigation service.
    pub fn with_navigation(mut self, service: Rc<dyn NavigationService>) -> Self {
        self.navigation = service;
        self
    }

    /// Replaces the theme service.
    pub fn with_theme(mut self, service: Rc<dyn ThemeService>) -> Self {
        self.theme = service;
        self
    }

    /// Replaces the session service.
    pub fn with_session(mut self, service: Rc<dyn SessionService>) -> Self {
        self.session = service;
        self
    }

    /// Replaces the admin directory.
    pub fn with_directory(mut self, service: Rc<dyn AdminDirectory>) -> Self {
        self.directory = service;
        self
    }
}

impl Default for PaletteHostServices {
    fn default() -> Self {
        Self::noop()
    }
}
