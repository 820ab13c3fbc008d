//! Drop-based registration handles shared by the command and search registries.

use std::cell::RefCell;

use palette_contract::ProviderToken;

/// Scoped registration of a provider or listener.
///
/// Unregistering is idempotent, and dropping the handle unregisters. UI regions keep the handle
/// for as long as they are mounted so their providers stop contributing once they are gone.
pub struct ScopedRegistration {
    token: ProviderToken,
    release: RefCell<Option<Box<dyn FnOnce()>>>,
}

/// Handle returned by provider registration.
pub type ProviderRegistration = ScopedRegistration;

/// Handle returned by listener subscription.
pub type Subscription = ScopedRegistration;

impl ScopedRegistration {
    pub(crate) fn new(token: ProviderToken, release: impl FnOnce() + 'static) -> Self {
        Self {
            token,
            release: RefCell::new(Some(Box::new(release))),
        }
    }

    /// Token identifying this registration in change notifications.
    pub fn token(&self) -> ProviderToken {
        self.token
    }

    /// Whether the registration is still live.
    pub fn is_active(&self) -> bool {
        self.release.borrow().is_some()
    }

    /// Removes the registration. Further calls do nothing.
    pub fn unregister(&self) {
        let release = self.release.borrow_mut().take();
        if let Some(release) = release {
            release();
        }
    }

    /// Keeps the registration alive for the lifetime of its registry.
    pub fn leak(self) {
        self.release.borrow_mut().take();
    }
}

impl Drop for ScopedRegistration {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl std::fmt::Debug for ScopedRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedRegistration")
            .field("token", &self.token)
            .field("active", &self.is_active())
            .finish()
    }
}
