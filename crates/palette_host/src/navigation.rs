//! Client-side navigation and theme host-service contracts.

use std::{cell::RefCell, rc::Rc};

use palette_contract::ThemeMode;

/// Host service for in-application route changes.
pub trait NavigationService {
    /// Navigates to an application path such as `/users`.
    fn navigate(&self, path: &str);
}

/// Host service for applying the color scheme.
pub trait ThemeService {
    /// Applies and stores the theme preference.
    fn set_theme(&self, theme: ThemeMode);
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op navigation and theme service for hosts without a router.
pub struct NoopNavigationService;

impl NavigationService for NoopNavigationService {
    fn navigate(&self, _path: &str) {}
}

impl ThemeService for NoopNavigationService {
    fn set_theme(&self, _theme: ThemeMode) {}
}

#[derive(Debug, Clone, Default)]
/// Navigation and theme service that records requests.
pub struct MemoryNavigationService {
    paths: Rc<RefCell<Vec<String>>>,
    themes: Rc<RefCell<Vec<ThemeMode>>>,
}

impl MemoryNavigationService {
    /// Paths navigated to, in order.
    pub fn paths(&self) -> Vec<String> {
        self.paths.borrow().clone()
    }

    /// Last applied theme.
    pub fn theme(&self) -> Option<ThemeMode> {
        self.themes.borrow().last().copied()
    }
}

impl NavigationService for MemoryNavigationService {
    fn navigate(&self, path: &str) {
        self.paths.borrow_mut().push(path.to_string());
    }
}

impl ThemeService for MemoryNavigationService {
    fn set_theme(&self, theme: ThemeMode) {
        self.themes.borrow_mut().push(theme);
    }
}
