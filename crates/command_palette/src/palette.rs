//! Palette controller owning the state signal, the command registry, and the search orchestrator.
//!
//! Every state change goes through [`reduce_palette`]; the controller applies the new state to the
//! signal and then runs the returned effects in order.

use std::{future::Future, rc::Rc};

use leptos::{create_rw_signal, logging, ReadSignal, RwSignal, SignalGetUntracked, SignalSet};
use palette_contract::{PaletteError, PaletteMode, SearchDomain};
use palette_host::{DelayService, NotificationService, PaletteHostServices};

use crate::{
    config::PaletteConfig,
    execution::SelectOutcome,
    handle::ProviderRegistration,
    model::{Command, CommandContext, PaletteItem, PaletteState, SearchResult},
    reducer::{reduce_palette, PaletteAction, PaletteEffect, ReducerError},
    registry::CommandRegistry,
    runtime::Spawner,
    search::SearchOrchestrator,
    view::{build_view, visible_items, PaletteKey, PaletteView},
};

pub(crate) struct PaletteInner {
    pub(crate) config: PaletteConfig,
    pub(crate) host: PaletteHostServices,
    pub(crate) registry: CommandRegistry,
    pub(crate) search: SearchOrchestrator,
    pub(crate) state: RwSignal<PaletteState>,
    pub(crate) spawner: Spawner,
}

/// One command palette instance.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CommandPalette {
    pub(crate) inner: Rc<PaletteInner>,
}

impl CommandPalette {
    /// Creates a closed palette in the default mode.
    pub fn new(config: PaletteConfig, host: PaletteHostServices, spawner: Spawner) -> Self {
        let search = SearchOrchestrator::new(&config, &host, spawner.clone());
        Self {
            inner: Rc::new(PaletteInner {
                config,
                host,
                registry: CommandRegistry::default(),
                search,
                state: create_rw_signal(PaletteState::default()),
                spawner,
            }),
        }
    }

    /// Shared command registry.
    pub fn registry(&self) -> CommandRegistry {
        self.inner.registry.clone()
    }

    /// Search orchestrator for the palette's modes.
    pub fn search(&self) -> SearchOrchestrator {
        self.inner.search.clone()
    }

    /// Active configuration.
    pub fn config(&self) -> &PaletteConfig {
        &self.inner.config
    }

    /// Host services the palette was built with.
    pub fn host(&self) -> &PaletteHostServices {
        &self.inner.host
    }

    /// Reactive palette state.
    pub fn state(&self) -> ReadSignal<PaletteState> {
        self.inner.state.read_only()
    }

    /// Current palette state without tracking.
    pub fn state_untracked(&self) -> PaletteState {
        self.inner.state.get_untracked()
    }

    /// Registers a command provider with the shared registry.
    pub fn register_provider<F>(&self, provider: F) -> ProviderRegistration
    where
        F: Fn(&CommandContext) -> Result<Vec<Command>, PaletteError> + 'static,
    {
        self.inner.registry.register_provider(provider)
    }

    /// Registers the search provider for `domain`.
    pub fn register_search_provider<F, Fut>(
        &self,
        domain: SearchDomain,
        provider: F,
    ) -> ProviderRegistration
    where
        F: Fn(String) -> Fut + 'static,
        Fut: Future<Output = Result<Vec<SearchResult>, PaletteError>> + 'static,
    {
        self.inner.search.register_search_provider(domain, provider)
    }

    /// Shows the palette.
    pub fn open(&self) {
        let _ = self.dispatch(PaletteAction::Open);
    }

    /// Hides the palette and resets it to the default mode.
    pub fn close(&self) {
        let _ = self.dispatch(PaletteAction::Close);
    }

    /// Global shortcut handler.
    pub fn toggle(&self) {
        let _ = self.dispatch(PaletteAction::Toggle);
    }

    /// Replaces the input text.
    pub fn set_search(&self, search: impl Into<String>) {
        let _ = self.dispatch(PaletteAction::SetSearch(search.into()));
    }

    /// Switches into a search mode.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::InvalidModeTransition`] outside the default mode.
    pub fn enter_mode(&self, mode: PaletteMode) -> Result<(), ReducerError> {
        self.dispatch(PaletteAction::EnterMode(mode))
    }

    /// Returns to the default mode.
    pub fn back(&self) {
        let _ = self.dispatch(PaletteAction::Back);
    }

    /// Escape key: back one mode level, or close.
    pub fn escape(&self) {
        let _ = self.dispatch(PaletteAction::Escape);
    }

    /// Registry commands for `context`.
    pub fn commands(&self, context: &CommandContext) -> Vec<Command> {
        self.inner.registry.commands(context)
    }

    /// Selectable entries in display order.
    pub fn items(&self, context: &CommandContext) -> Vec<Rc<dyn PaletteItem>> {
        let state = self.inner.state.get_untracked();
        let commands = self.commands_for(&state, context);
        visible_items(&state, &commands, &self.inner.search.snapshot_untracked())
    }

    /// Render model for `context`.
    pub fn view(&self, context: &CommandContext) -> PaletteView {
        let state = self.inner.state.get_untracked();
        let commands = self.commands_for(&state, context);
        build_view(
            &state,
            &commands,
            &self.inner.search.snapshot_untracked(),
            &self.inner.config,
        )
    }

    /// Handles an in-palette key; `Enter` reports what selection did.
    pub fn handle_key(&self, key: PaletteKey, context: &CommandContext) -> Option<SelectOutcome> {
        match key {
            PaletteKey::Up | PaletteKey::Down => {
                let delta = if key == PaletteKey::Up { -1 } else { 1 };
                let items = self.items(context);
                let _ = self.dispatch(PaletteAction::MoveHighlight {
                    delta,
                    item_count: items.len(),
                });
                let state = self.inner.state.get_untracked();
                if let Some(armed) = &state.confirming_action_id {
                    let on_armed_row = items
                        .get(state.highlighted)
                        .is_some_and(|item| item.id() == armed);
                    if !on_armed_row {
                        let _ = self.dispatch(PaletteAction::Disarm);
                    }
                }
                None
            }
            PaletteKey::Enter => {
                let highlighted = self.inner.state.get_untracked().highlighted;
                let item = self.items(context).into_iter().nth(highlighted)?;
                Some(self.select_item(item, context))
            }
            PaletteKey::Escape => {
                self.escape();
                None
            }
        }
    }

    /// Selects the visible entry with `id`.
    pub fn select(&self, id: &str, context: &CommandContext) -> SelectOutcome {
        match self
            .items(context)
            .into_iter()
            .find(|item| item.id().as_str() == id)
        {
            Some(item) => self.select_item(item, context),
            None => {
                logging::warn!("command palette: no visible item `{id}`");
                SelectOutcome::Ignored
            }
        }
    }

    fn commands_for(&self, state: &PaletteState, context: &CommandContext) -> Vec<Command> {
        if state.mode == PaletteMode::Default {
            self.inner.registry.commands(context)
        } else {
            Vec::new()
        }
    }

    pub(crate) fn dispatch(&self, action: PaletteAction) -> Result<(), ReducerError> {
        let previous = self.inner.state.get_untracked();
        let mut next = previous.clone();
        let effects = match reduce_palette(&mut next, action) {
            Ok(effects) => effects,
            Err(err) => {
                logging::warn!("command palette reducer error: {err}");
                return Err(err);
            }
        };
        if next != previous {
            self.inner.state.set(next);
        }
        for effect in effects {
            self.run_effect(effect);
        }
        Ok(())
    }

    fn run_effect(&self, effect: PaletteEffect) {
        match effect {
            PaletteEffect::ResetSearch => self.inner.search.reset(),
            PaletteEffect::QueueSearch { mode, query } => {
                let domains = mode.search_domain().into_iter().collect::<Vec<_>>();
                self.inner.search.input(&domains, &query);
            }
            PaletteEffect::NotifySuccess(message) => self.inner.host.notifications.success(&message),
            PaletteEffect::NotifyError(message) => self.inner.host.notifications.error(&message),
            PaletteEffect::ScheduleClose { execution_id } => {
                let this = self.clone();
                let wait = self.inner.host.delays.delay(self.inner.config.close_delay());
                (self.inner.spawner)(Box::pin(async move {
                    wait.await;
                    let _ = this.dispatch(PaletteAction::SettleSuccess { execution_id });
                }));
            }
            PaletteEffect::SettleError { execution_id } => {
                let _ = self.dispatch(PaletteAction::SettleError { execution_id });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use palette_contract::{ActionStatus, CommandDescriptor, CommandGroup, SearchResultDescriptor};
    use palette_host::{DelayService, NotificationLevel};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{model::action, runtime::testing::Harness, view::PaletteBody};

    fn palette(harness: &Harness) -> CommandPalette {
        CommandPalette::new(PaletteConfig::default(), harness.host(), harness.spawner())
    }

    fn navigation(id: &str, label: &str) -> Command {
        Command::new(
            CommandDescriptor::new(id, label, CommandGroup::Navigation),
            action(|_| async { Ok(()) }),
        )
    }

    #[test]
    fn mode_exit_drops_in_flight_search_results() {
        let mut harness = Harness::new();
        let palette = palette(&harness);
        let clock = harness.clock.clone();
        let _users = palette.register_search_provider(SearchDomain::user(), move |query: String| {
            let wait = clock.delay(std::time::Duration::from_millis(200));
            async move {
                wait.await;
                Ok(vec![SearchResult::new(
                    SearchResultDescriptor::new(
                        format!("user:{query}"),
                        query,
                        SearchDomain::user(),
                    ),
                    action(|_| async { Ok(()) }),
                )])
            }
        });
        let context = CommandContext::new("/admin", harness.host());

        palette.open();
        palette.enter_mode(PaletteMode::Impersonate).expect("enter");
        palette.set_search("alice");
        harness.advance(300);
        assert!(palette.search().snapshot_untracked().is_searching());

        palette.escape();
        harness.advance(200);

        let state = palette.state_untracked();
        assert_eq!(state.mode, PaletteMode::Default);
        assert_eq!(state.search, "");
        assert_eq!(palette.search().snapshot_untracked().all_results().count(), 0);
        assert!(matches!(
            palette.view(&context).body,
            PaletteBody::Commands { .. } | PaletteBody::NoCommands { .. }
        ));
    }

    #[test]
    fn arrow_keys_wrap_over_visible_items() {
        let harness = Harness::new();
        let palette = palette(&harness);
        let _nav = palette.register_provider(|_context| {
            Ok(vec![navigation("users", "Users"), navigation("flags", "Feature flags")])
        });
        let context = CommandContext::new("/admin", harness.host());
        palette.open();

        palette.handle_key(PaletteKey::Up, &context);
        assert_eq!(palette.state_untracked().highlighted, 1);
        palette.handle_key(PaletteKey::Down, &context);
        assert_eq!(palette.state_untracked().highlighted, 0);

        palette.set_search("flag");
        assert_eq!(palette.items(&context).len(), 1);
        palette.handle_key(PaletteKey::Down, &context);
        assert_eq!(palette.state_untracked().highlighted, 0);
    }

    #[test]
    fn moving_off_an_armed_row_disarms_it() {
        let harness = Harness::new();
        let palette = palette(&harness);
        let _nav = palette.register_provider(|_context| {
            let mut sign_out = navigation("sign-out", "Sign out");
            sign_out.descriptor = sign_out.descriptor.with_confirmation(None);
            Ok(vec![sign_out, navigation("users", "Users")])
        });
        let context = CommandContext::new("/admin", harness.host());
        palette.open();

        palette.handle_key(PaletteKey::Enter, &context);
        assert!(palette
            .state_untracked()
            .is_armed(&palette_contract::CommandId::new("sign-out")));

        palette.handle_key(PaletteKey::Down, &context);
        assert_eq!(palette.state_untracked().confirming_action_id, None);

        palette.handle_key(PaletteKey::Up, &context);
        palette.handle_key(PaletteKey::Enter, &context);
        palette.handle_key(PaletteKey::Down, &context);
        palette.handle_key(PaletteKey::Up, &context);
        assert_eq!(palette.state_untracked().confirming_action_id, None);
    }

    #[test]
    fn nested_mode_entry_is_rejected_and_logged() {
        let harness = Harness::new();
        let palette = palette(&harness);
        palette.open();
        palette.enter_mode(PaletteMode::FlagToggle).expect("enter");
        assert!(palette.enter_mode(PaletteMode::Impersonate).is_err());
        assert_eq!(palette.state_untracked().mode, PaletteMode::FlagToggle);
    }

    #[test]
    fn new_provider_is_visible_without_reopening() {
        let harness = Harness::new();
        let palette = palette(&harness);
        let context = CommandContext::new("/admin", harness.host());
        palette.open();
        assert!(palette.items(&context).is_empty());

        let _nav = palette.register_provider(|_context| Ok(vec![navigation("users", "Users")]));
        assert_eq!(palette.items(&context).len(), 1);
    }

    #[test]
    fn success_closes_after_delay_and_notifies() {
        let mut harness = Harness::new();
        let palette = palette(&harness);
        let _nav = palette.register_provider(|_context| Ok(vec![navigation("users", "Users")]));
        let context = CommandContext::new("/admin", harness.host());
        palette.open();

        palette.handle_key(PaletteKey::Enter, &context);
        harness.settle();
        assert_eq!(palette.state_untracked().action_status, ActionStatus::Success);
        assert!(palette.state_untracked().is_open);

        harness.advance(150);
        let state = palette.state_untracked();
        assert_eq!(state.action_status, ActionStatus::Idle);
        assert!(!state.is_open);
        assert_eq!(
            harness.notifications.messages(NotificationLevel::Success),
            vec!["Users completed".to_string()]
        );
    }
}
