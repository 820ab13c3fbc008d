//! Admin directory host-service contracts for user and feature-flag lookup.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use palette_contract::{AdminUser, FeatureFlag};

/// Object-safe boxed future used by [`AdminDirectory`].
pub type DirectoryFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service backed by the admin REST API.
pub trait AdminDirectory {
    /// Looks up users whose name or email matches `query`.
    fn search_users<'a>(&'a self, query: &'a str)
        -> DirectoryFuture<'a, Result<Vec<AdminUser>, String>>;

    /// Looks up feature flags whose key or name matches `query`.
    fn search_flags<'a>(
        &'a self,
        query: &'a str,
    ) -> DirectoryFuture<'a, Result<Vec<FeatureFlag>, String>>;

    /// Sets a flag's state and returns the updated record.
    fn set_flag_enabled<'a>(
        &'a self,
        key: &'a str,
        enabled: bool,
    ) -> DirectoryFuture<'a, Result<FeatureFlag, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Directory for hosts without an admin API; lookups return nothing.
pub struct NoopAdminDirectory;

impl AdminDirectory for NoopAdminDirectory {
    fn search_users<'a>(
        &'a self,
        _query: &'a str,
    ) -> DirectoryFuture<'a, Result<Vec<AdminUser>, String>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn search_flags<'a>(
        &'a self,
        _query: &'a str,
    ) -> DirectoryFuture<'a, Result<Vec<FeatureFlag>, String>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn set_flag_enabled<'a>(
        &'a self,
        key: &'a str,
        _enabled: bool,
    ) -> DirectoryFuture<'a, Result<FeatureFlag, String>> {
        Box::pin(async move { Err(format!("feature flag `{key}` not found")) })
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: Vec<AdminUser>,
    flags: Vec<FeatureFlag>,
    failure: Option<String>,
}

#[derive(Debug, Clone, Default)]
/// In-memory directory with case-insensitive substring lookup.
pub struct MemoryAdminDirectory {
    inner: Rc<RefCell<DirectoryState>>,
}

impl MemoryAdminDirectory {
    /// Creates a directory seeded with users and flags.
    pub fn new(users: Vec<AdminUser>, flags: Vec<FeatureFlag>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DirectoryState {
                users,
                flags,
                failure: None,
            })),
        }
    }

    /// Makes every following call fail with `message`, or succeed again with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        self.inner.borrow_mut().failure = message.map(str::to_string);
    }

    /// Returns the current record of a flag.
    pub fn flag(&self, key: &str) -> Option<FeatureFlag> {
        self.inner
            .borrow()
            .flags
            .iter()
            .find(|flag| flag.key == key)
            .cloned()
    }

    fn check_failure(&self) -> Result<(), String> {
        match &self.inner.borrow().failure {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl AdminDirectory for MemoryAdminDirectory {
    fn search_users<'a>(
        &'a self,
        query: &'a str,
    ) -> DirectoryFuture<'a, Result<Vec<AdminUser>, String>> {
        Box::pin(async move {
            self.check_failure()?;
            Ok(self
                .inner
                .borrow()
                .users
                .iter()
                .filter(|user| contains_ci(&user.name, query) || contains_ci(&user.email, query))
                .cloned()
                .collect())
        })
    }

    fn search_flags<'a>(
        &'a self,
        query: &'a str,
    ) -> DirectoryFuture<'a, Result<Vec<FeatureFlag>, String>> {
        Box::pin(async move {
            self.check_failure()?;
            Ok(self
                .inner
                .borrow()
                .flags
                .iter()
                .filter(|flag| contains_ci(&flag.key, query) || contains_ci(&flag.name, query))
                .cloned()
                .collect())
        })
    }

    fn set_flag_enabled<'a>(
        &'a self,
        key: &'a str,
        enabled: bool,
    ) -> DirectoryFuture<'a, Result<FeatureFlag, String>> {
        Box::pin(async move {
            self.check_failure()?;
            let mut state = self.inner.borrow_mut();
            let flag = state
                .flags
                .iter_mut()
                .find(|flag| flag.key == key)
                .ok_or_else(|| format!("feature flag `{key}` not found"))?;
            flag.enabled = enabled;
            Ok(flag.clone())
        })
    }
}
