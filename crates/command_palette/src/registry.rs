//! Process-wide command provider registry with ordered change notifications.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashSet},
    rc::{Rc, Weak},
};

use leptos::logging;
use palette_contract::{PaletteError, ProviderToken};

use crate::{
    handle::{ProviderRegistration, Subscription},
    model::{Command, CommandContext},
};

/// Stateless function contributing commands for a context.
pub type CommandProvider = Rc<dyn Fn(&CommandContext) -> Result<Vec<Command>, PaletteError>>;

/// Listener invoked on every provider mutation.
pub type RegistryListener = Rc<dyn Fn(RegistryChange)>;

/// Provider collection mutation delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryChange {
    /// A provider was added.
    Registered(ProviderToken),
    /// A provider was removed.
    Unregistered(ProviderToken),
}

#[derive(Default)]
struct RegistryState {
    next_token: u64,
    providers: BTreeMap<ProviderToken, CommandProvider>,
    next_listener: u64,
    listeners: BTreeMap<u64, RegistryListener>,
}

/// Shared command registry.
///
/// One instance lives for the lifetime of the application and is handed to the UI regions that
/// contribute commands. Cloning shares the same provider collection.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    state: Rc<RefCell<RegistryState>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a provider and returns its scoped registration.
    pub fn register_provider<F>(&self, provider: F) -> ProviderRegistration
    where
        F: Fn(&CommandContext) -> Result<Vec<Command>, PaletteError> + 'static,
    {
        let token = {
            let mut state = self.state.borrow_mut();
            state.next_token = state.next_token.saturating_add(1);
            let token = ProviderToken(state.next_token);
            state.providers.insert(token, Rc::new(provider));
            token
        };
        notify(&self.state, RegistryChange::Registered(token));

        let weak = Rc::downgrade(&self.state);
        ProviderRegistration::new(token, move || remove_provider(&weak, token))
    }

    /// Registers a change listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(RegistryChange) + 'static,
    {
        let id = {
            let mut state = self.state.borrow_mut();
            state.next_listener = state.next_listener.saturating_add(1);
            let id = state.next_listener;
            state.listeners.insert(id, Rc::new(listener));
            id
        };

        let weak = Rc::downgrade(&self.state);
        Subscription::new(ProviderToken(id), move || {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().listeners.remove(&id);
            }
        })
    }

    /// Aggregates every provider's commands for `context` in registration order.
    ///
    /// Nothing is cached. A failing provider contributes nothing. When two commands share an id,
    /// the first one aggregated is kept.
    pub fn commands(&self, context: &CommandContext) -> Vec<Command> {
        let providers = self
            .state
            .borrow()
            .providers
            .iter()
            .map(|(token, provider)| (*token, provider.clone()))
            .collect::<Vec<_>>();

        let mut seen = HashSet::new();
        let mut commands = Vec::new();
        for (token, provider) in providers {
            match provider(context) {
                Ok(contributed) => {
                    for command in contributed {
                        if seen.insert(command.descriptor.id.clone()) {
                            commands.push(command);
                        } else {
                            logging::warn!(
                                "command palette: provider {} repeats command id `{}`; keeping the first",
                                token.0,
                                command.descriptor.id
                            );
                        }
                    }
                }
                Err(err) => {
                    logging::warn!("command palette: provider {} failed: {err}", token.0)
                }
            }
        }
        commands
    }

    /// Number of registered providers.
    pub fn provider_count(&self) -> usize {
        self.state.borrow().providers.len()
    }
}

fn remove_provider(state: &Weak<RefCell<RegistryState>>, token: ProviderToken) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let removed = state.borrow_mut().providers.remove(&token).is_some();
    if removed {
        notify(&state, RegistryChange::Unregistered(token));
    }
}

fn notify(state: &Rc<RefCell<RegistryState>>, change: RegistryChange) {
    let listeners = state
        .borrow()
        .listeners
        .values()
        .cloned()
        .collect::<Vec<_>>();
    for listener in listeners {
        listener(change);
    }
}
