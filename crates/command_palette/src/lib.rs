//! Command palette engine for the admin console.
//!
//! Features register command providers that are re-evaluated against a fresh [`CommandContext`]
//! on every read, and search providers that answer debounced, race-safe queries for one domain.
//! [`CommandPalette`] drives the mode state machine through [`reduce_palette`], runs the single
//! action slot with two-step confirmation, and exposes a render model via [`PaletteView`].

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod builtin;
pub mod config;
pub mod execution;
pub mod handle;
pub mod model;
pub mod palette;
pub mod reducer;
pub mod registry;
pub mod runtime;
pub mod search;
pub mod view;

pub use builtin::{register_builtin_providers, BuiltinRegistrations};
pub use config::{ConfigError, PaletteConfig, SearchPolicy};
pub use execution::SelectOutcome;
pub use handle::{ProviderRegistration, ScopedRegistration, Subscription};
pub use model::{
    action, confirmation_text, Command, CommandAction, CommandContext, PaletteItem, PaletteState,
    SearchResult,
};
pub use palette::CommandPalette;
pub use reducer::{reduce_palette, PaletteAction, PaletteEffect, ReducerError};
pub use registry::{CommandProvider, CommandRegistry, RegistryChange, RegistryListener};
pub use runtime::{leptos_spawner, Spawner, TimeoutDelayService};
pub use search::{
    DispatchId, DomainResults, SearchOrchestrator, SearchProvider, SearchSnapshot, SearchStatus,
};
pub use view::{
    build_view, visible_items, CommandSection, ItemView, PaletteBody, PaletteKey, PaletteView,
};
