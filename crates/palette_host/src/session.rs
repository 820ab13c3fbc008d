//! Authentication session host-service contracts.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

/// Object-safe boxed future used by [`SessionService`].
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service for the signed-in admin session.
pub trait SessionService {
    /// Starts impersonating the given user.
    fn impersonate<'a>(&'a self, user_id: &'a str) -> SessionFuture<'a, Result<(), String>>;

    /// Ends an impersonation session and restores the admin identity.
    fn stop_impersonating<'a>(&'a self) -> SessionFuture<'a, Result<(), String>>;

    /// Signs the admin out.
    fn sign_out<'a>(&'a self) -> SessionFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Session service for hosts without authentication; every call fails.
pub struct NoopSessionService;

impl SessionService for NoopSessionService {
    fn impersonate<'a>(&'a self, _user_id: &'a str) -> SessionFuture<'a, Result<(), String>> {
        Box::pin(async { Err("session service unavailable".to_string()) })
    }

    fn stop_impersonating<'a>(&'a self) -> SessionFuture<'a, Result<(), String>> {
        Box::pin(async { Err("session service unavailable".to_string()) })
    }

    fn sign_out<'a>(&'a self) -> SessionFuture<'a, Result<(), String>> {
        Box::pin(async { Err("session service unavailable".to_string()) })
    }
}

/// One recorded session call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    /// `impersonate(user_id)`.
    Impersonate(String),
    /// `stop_impersonating()`.
    StopImpersonating,
    /// `sign_out()`.
    SignOut,
}

#[derive(Debug, Clone, Default)]
/// In-memory session service that records calls and can be told to fail.
pub struct MemorySessionService {
    calls: Rc<RefCell<Vec<SessionCall>>>,
    failure: Rc<RefCell<Option<String>>>,
}

impl MemorySessionService {
    /// Recorded calls in order.
    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.borrow().clone()
    }

    /// Makes every following call fail with `message`, or succeed again with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.borrow_mut() = message.map(str::to_string);
    }

    fn record(&self, call: SessionCall) -> Result<(), String> {
        self.calls.borrow_mut().push(call);
        match self.failure.borrow().as_ref() {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}

impl SessionService for MemorySessionService {
    fn impersonate<'a>(&'a self, user_id: &'a str) -> SessionFuture<'a, Result<(), String>> {
        Box::pin(async move { self.record(SessionCall::Impersonate(user_id.to_string())) })
    }

    fn stop_impersonating<'a>(&'a self) -> SessionFuture<'a, Result<(), String>> {
        Box::pin(async move { self.record(SessionCall::StopImpersonating) })
    }

    fn sign_out<'a>(&'a self) -> SessionFuture<'a, Result<(), String>> {
        Box::pin(async move { self.record(SessionCall::SignOut) })
    }
}
