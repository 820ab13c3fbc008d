//! Shared command palette contracts used by the palette engine, host adapters, and admin UI.
//!
//! This crate is intentionally runtime-agnostic. It defines serializable command metadata, search
//! result descriptors, palette modes, statuses, and errors without depending on Leptos, browser
//! APIs, or the palette engine internals.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Stable identifier of a command or search result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommandId(String);

impl CommandId {
    /// Creates a command identifier from trusted caller input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Execution identifier for one action run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub u64);

/// Opaque registration token used to unregister providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProviderToken(pub u64);

/// Section a command is listed under.
///
/// Declaration order is the section order of the rendered palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandGroup {
    /// Route changes inside the admin application.
    Navigation,
    /// One-shot operations.
    Actions,
    /// Preference toggles.
    Settings,
    /// Privileged administration commands.
    Admin,
    /// Commands contributed by the currently mounted page.
    Contextual,
}

impl CommandGroup {
    /// All groups in section order.
    pub const ALL: [Self; 5] = [
        Self::Navigation,
        Self::Actions,
        Self::Settings,
        Self::Admin,
        Self::Contextual,
    ];

    /// Section heading text.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Navigation => "Navigation",
            Self::Actions => "Actions",
            Self::Settings => "Settings",
            Self::Admin => "Admin",
            Self::Contextual => "This page",
        }
    }
}

/// Interaction mode of the palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaletteMode {
    /// Registry commands filtered by the search text.
    #[default]
    Default,
    /// User lookup whose results start an impersonation session.
    Impersonate,
    /// Feature-flag lookup whose results toggle a flag.
    FlagToggle,
}

impl PaletteMode {
    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Impersonate => "impersonate",
            Self::FlagToggle => "flag-toggle",
        }
    }

    /// Search domain queried in this mode, if any.
    pub fn search_domain(self) -> Option<SearchDomain> {
        match self {
            Self::Default => None,
            Self::Impersonate => Some(SearchDomain::user()),
            Self::FlagToggle => Some(SearchDomain::feature_flag()),
        }
    }

    /// Heading shown above the list.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Default => "Commands",
            Self::Impersonate => "Impersonate a user",
            Self::FlagToggle => "Toggle a feature flag",
        }
    }

    /// Input placeholder text.
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Default => "Type a command or search...",
            Self::Impersonate => "Search users by name or email...",
            Self::FlagToggle => "Search feature flags...",
        }
    }
}

/// Lifecycle status of the palette's single action slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionStatus {
    /// No action running.
    #[default]
    Idle,
    /// An action is in flight.
    Loading,
    /// The last action succeeded and the palette is about to close.
    Success,
    /// The last action failed.
    Error,
}

/// Keyboard shortcut descriptor displayed next to a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyShortcut {
    /// Modifier names such as `mod`, `shift`, `alt`.
    pub modifiers: Vec<String>,
    /// Primary key.
    pub key: String,
}

impl KeyShortcut {
    /// Creates a shortcut from modifier names and a key.
    pub fn new(modifiers: &[&str], key: impl Into<String>) -> Self {
        Self {
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
            key: key.into(),
        }
    }

    /// Compact display text such as `⌘⇧K`.
    pub fn display(&self) -> String {
        let mut out = String::new();
        for modifier in &self.modifiers {
            out.push_str(match modifier.as_str() {
                "mod" | "cmd" | "meta" => "⌘",
                "ctrl" => "⌃",
                "shift" => "⇧",
                "alt" | "option" => "⌥",
                other => other,
            });
        }
        out.push_str(&self.key.to_uppercase());
        out
    }
}

/// Serializable metadata of a registerable command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Stable command identifier.
    pub id: CommandId,
    /// Display text.
    pub label: String,
    /// Section the command is listed under.
    pub group: CommandGroup,
    /// Optional icon reference understood by the renderer.
    pub icon: Option<String>,
    /// Additional match terms. Order is irrelevant.
    pub keywords: Vec<String>,
    /// Optional keyboard shortcut hint.
    pub shortcut: Option<KeyShortcut>,
    /// Whether selection must be confirmed by a second selection.
    pub requires_confirmation: bool,
    /// Confirmation prompt template; `{label}` is replaced with the label.
    pub confirmation_message: Option<String>,
    /// Mode entered on selection instead of running the action.
    pub target_mode: Option<PaletteMode>,
    /// Notification text on success.
    pub success_message: Option<String>,
}

impl CommandDescriptor {
    /// Creates a descriptor with no icon, keywords, shortcut, or confirmation.
    pub fn new(id: impl Into<String>, label: impl Into<String>, group: CommandGroup) -> Self {
        Self {
            id: CommandId::new(id),
            label: label.into(),
            group,
            icon: None,
            keywords: Vec::new(),
            shortcut: None,
            requires_confirmation: false,
            confirmation_message: None,
            target_mode: None,
            success_message: None,
        }
    }

    /// Sets the icon reference.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Appends match keywords.
    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords
            .extend(keywords.iter().map(|keyword| keyword.to_string()));
        self
    }

    /// Sets the shortcut hint.
    pub fn with_shortcut(mut self, shortcut: KeyShortcut) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    /// Requires a confirming second selection, optionally with a prompt template.
    pub fn with_confirmation(mut self, message: Option<&str>) -> Self {
        self.requires_confirmation = true;
        self.confirmation_message = message.map(str::to_string);
        self
    }

    /// Makes selection switch the palette into `mode`.
    pub fn with_target_mode(mut self, mode: PaletteMode) -> Self {
        self.target_mode = Some(mode);
        self
    }

    /// Sets the success notification text.
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }
}

/// Search domain tag such as `user` or `feature_flag`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SearchDomain(String);

impl SearchDomain {
    /// Domain for admin user lookup.
    pub const USER: &'static str = "user";
    /// Domain for feature-flag lookup.
    pub const FEATURE_FLAG: &'static str = "feature_flag";

    /// Creates a domain tag from trusted caller input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The `user` domain.
    pub fn user() -> Self {
        Self::new(Self::USER)
    }

    /// The `feature_flag` domain.
    pub fn feature_flag() -> Self {
        Self::new(Self::FEATURE_FLAG)
    }

    /// Returns the domain text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SearchDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializable metadata of one search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultDescriptor {
    /// Result identifier, unique within its domain.
    pub id: CommandId,
    /// Primary text.
    pub title: String,
    /// Secondary text.
    pub subtitle: Option<String>,
    /// Optional icon reference.
    pub icon: Option<String>,
    /// Domain that produced the result.
    pub domain: SearchDomain,
    /// Opaque domain data.
    pub metadata: BTreeMap<String, Value>,
    /// Whether selection must be confirmed by a second selection.
    pub requires_confirmation: bool,
    /// Confirmation prompt template; `{label}` is replaced with the title.
    pub confirmation_message: Option<String>,
    /// Notification text on success.
    pub success_message: Option<String>,
}

impl SearchResultDescriptor {
    /// Creates a descriptor with no subtitle, icon, metadata, or confirmation.
    pub fn new(id: impl Into<String>, title: impl Into<String>, domain: SearchDomain) -> Self {
        Self {
            id: CommandId::new(id),
            title: title.into(),
            subtitle: None,
            icon: None,
            domain,
            metadata: BTreeMap::new(),
            requires_confirmation: false,
            confirmation_message: None,
            success_message: None,
        }
    }
}

/// Admin account as returned by the directory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    /// Account identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role name such as `admin` or `member`.
    pub role: String,
    /// Set when the session belongs to an impersonating admin.
    pub impersonated_by: Option<String>,
}

/// Feature flag record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlag {
    /// Stable flag key.
    pub key: String,
    /// Human-readable name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Current state.
    pub enabled: bool,
}

/// Color scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeMode {
    /// Light scheme.
    Light,
    /// Dark scheme.
    Dark,
    /// Follow the operating system.
    #[default]
    System,
}

impl ThemeMode {
    /// All theme modes in menu order.
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::System];

    /// Returns a stable string token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Menu label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::System => "System",
        }
    }
}

/// Palette error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaletteErrorCode {
    /// A command or search provider failed.
    Provider,
    /// A command or result action failed.
    Action,
    /// Internal failure.
    Internal,
}

/// Error crossing provider and action boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct PaletteError {
    /// Error category.
    pub code: PaletteErrorCode,
    /// Human-readable message; may be empty.
    pub message: String,
}

impl PaletteError {
    /// Creates a new palette error.
    pub fn new(code: PaletteErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an action failure.
    pub fn action(message: impl Into<String>) -> Self {
        Self::new(PaletteErrorCode::Action, message)
    }

    /// Creates a provider failure.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaletteErrorCode::Provider, message)
    }

    /// Returns the message, or `fallback` when the message is blank.
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.message.trim().is_empty() {
            fallback
        } else {
            &self.message
        }
    }
}
