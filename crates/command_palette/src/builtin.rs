//! Built-in admin commands and search providers.

use std::rc::Rc;

use palette_contract::{
    AdminUser, CommandDescriptor, CommandGroup, FeatureFlag, PaletteError, PaletteErrorCode,
    PaletteMode, SearchDomain, SearchResultDescriptor, ThemeMode,
};
use palette_host::AdminDirectory;
use serde_json::json;

use crate::{
    handle::ProviderRegistration,
    model::{action, Command, CommandContext, SearchResult},
    palette::CommandPalette,
};

/// One navigable admin page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminRoute {
    /// Command id suffix.
    pub id: &'static str,
    /// Route path.
    pub path: &'static str,
    /// Page title.
    pub label: &'static str,
    /// Icon reference.
    pub icon: &'static str,
    /// Extra search terms.
    pub keywords: &'static [&'static str],
}

/// Admin pages offered under Navigation, in menu order.
pub const ADMIN_ROUTES: [AdminRoute; 6] = [
    AdminRoute {
        id: "dashboard",
        path: "/",
        label: "Dashboard",
        icon: "layout-dashboard",
        keywords: &["home", "overview"],
    },
    AdminRoute {
        id: "users",
        path: "/users",
        label: "Users",
        icon: "users",
        keywords: &["accounts", "members"],
    },
    AdminRoute {
        id: "feature-flags",
        path: "/feature-flags",
        label: "Feature flags",
        icon: "flag",
        keywords: &["toggles", "rollout"],
    },
    AdminRoute {
        id: "announcements",
        path: "/announcements",
        label: "Announcements",
        icon: "megaphone",
        keywords: &["banner", "news"],
    },
    AdminRoute {
        id: "email-templates",
        path: "/email-templates",
        label: "Email templates",
        icon: "mail",
        keywords: &["notifications", "mail"],
    },
    AdminRoute {
        id: "billing",
        path: "/billing",
        label: "Billing & usage",
        icon: "credit-card",
        keywords: &["invoices", "plans", "usage"],
    },
];

/// Handles for every built-in registration; dropping it removes them all.
#[derive(Debug)]
pub struct BuiltinRegistrations {
    /// Navigation commands.
    pub navigation: ProviderRegistration,
    /// Session and mode-switch commands.
    pub actions: ProviderRegistration,
    /// Theme commands.
    pub settings: ProviderRegistration,
    /// `user` search domain.
    pub users: ProviderRegistration,
    /// `feature_flag` search domain.
    pub flags: ProviderRegistration,
}

impl BuiltinRegistrations {
    /// Removes every built-in provider now.
    pub fn unregister(&self) {
        self.navigation.unregister();
        self.actions.unregister();
        self.settings.unregister();
        self.users.unregister();
        self.flags.unregister();
    }
}

/// Registers the admin navigation, action, and settings commands plus the user and flag search.
///
/// Search providers query the palette's host directory. Flag toggles write through the
/// directory of the context they run in.
pub fn register_builtin_providers(palette: &CommandPalette) -> BuiltinRegistrations {
    let user_directory = palette.host().directory.clone();
    let flag_directory = palette.host().directory.clone();
    BuiltinRegistrations {
        navigation: palette.register_provider(|context| Ok(navigation_commands(context))),
        actions: palette.register_provider(|context| Ok(action_commands(context))),
        settings: palette.register_provider(|context| Ok(settings_commands(context))),
        users: palette.register_search_provider(SearchDomain::user(), move |query: String| {
            let directory = user_directory.clone();
            async move { search_users(directory, &query).await }
        }),
        flags: palette.register_search_provider(SearchDomain::feature_flag(), move |query: String| {
            let directory = flag_directory.clone();
            async move { search_flags(directory, &query).await }
        }),
    }
}

fn normalize_path(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Navigation commands, excluding the current page.
pub fn navigation_commands(context: &CommandContext) -> Vec<Command> {
    let current = normalize_path(&context.pathname);
    ADMIN_ROUTES
        .iter()
        .filter(|route| route.path != current)
        .map(|route| {
            let path = route.path;
            Command::new(
                CommandDescriptor::new(
                    format!("navigate:{}", route.id),
                    route.label,
                    CommandGroup::Navigation,
                )
                .with_icon(route.icon)
                .with_keywords(route.keywords)
                .with_success_message(format!("Opened {}", route.label)),
                action(move |context: CommandContext| {
                    context.host.navigation.navigate(path);
                    async { Ok(()) }
                }),
            )
        })
        .collect()
}

/// Mode switches and session commands.
pub fn action_commands(context: &CommandContext) -> Vec<Command> {
    let mut commands = vec![
        Command::mode_switch(
            CommandDescriptor::new("impersonate", "Impersonate a user", CommandGroup::Admin)
                .with_icon("user-switch")
                .with_keywords(&["login as", "switch user", "support"]),
            PaletteMode::Impersonate,
        ),
        Command::mode_switch(
            CommandDescriptor::new("toggle-flag", "Toggle a feature flag", CommandGroup::Admin)
                .with_icon("toggle-right")
                .with_keywords(&["enable", "disable", "rollout"]),
            PaletteMode::FlagToggle,
        ),
    ];

    if context.is_impersonating() {
        let name = context
            .current_user
            .as_ref()
            .map(|user| user.name.as_str())
            .unwrap_or_default();
        let confirmation = format!("Stop impersonating {name} and return to your account?");
        commands.push(Command::new(
            CommandDescriptor::new("stop-impersonating", "Stop impersonating", CommandGroup::Admin)
                .with_icon("user-x")
                .with_keywords(&["exit", "restore"])
                .with_confirmation(Some(confirmation.as_str()))
                .with_success_message("Impersonation ended"),
            action(|context: CommandContext| async move {
                context
                    .host
                    .session
                    .stop_impersonating()
                    .await
                    .map_err(PaletteError::action)
            }),
        ));
    }

    commands.push(Command::new(
        CommandDescriptor::new("sign-out", "Sign out", CommandGroup::Actions)
            .with_icon("log-out")
            .with_keywords(&["logout", "exit"])
            .with_confirmation(None)
            .with_success_message("Signed out"),
        action(|context: CommandContext| async move {
            context
                .host
                .session
                .sign_out()
                .await
                .map_err(PaletteError::action)
        }),
    ));
    commands
}

/// Theme switches, excluding the active theme.
pub fn settings_commands(context: &CommandContext) -> Vec<Command> {
    ThemeMode::ALL
        .into_iter()
        .filter(|theme| *theme != context.theme)
        .map(|theme| {
            Command::new(
                CommandDescriptor::new(
                    format!("theme:{}", theme.as_str()),
                    format!("Use {} theme", theme.label().to_lowercase()),
                    CommandGroup::Settings,
                )
                .with_icon(match theme {
                    ThemeMode::Light => "sun",
                    ThemeMode::Dark => "moon",
                    ThemeMode::System => "monitor",
                })
                .with_keywords(&["theme", "appearance", "color scheme"])
                .with_success_message(format!("Theme set to {}", theme.label().to_lowercase())),
                action(move |context: CommandContext| {
                    context.host.theme.set_theme(theme);
                    async { Ok(()) }
                }),
            )
        })
        .collect()
}

async fn search_users(
    directory: Rc<dyn AdminDirectory>,
    query: &str,
) -> Result<Vec<SearchResult>, PaletteError> {
    let users = directory
        .search_users(query)
        .await
        .map_err(PaletteError::provider)?;
    Ok(users.into_iter().map(user_result).collect())
}

fn user_result(user: AdminUser) -> SearchResult {
    let mut descriptor = SearchResultDescriptor::new(
        format!("user:{}", user.id),
        user.name.clone(),
        SearchDomain::user(),
    );
    descriptor.subtitle = Some(user.email.clone());
    descriptor.icon = Some("user".to_string());
    descriptor.success_message = Some(format!("Now impersonating {}", user.name));
    descriptor
        .metadata
        .insert("role".to_string(), json!(user.role));
    descriptor
        .metadata
        .insert("email".to_string(), json!(user.email));

    let user_id = user.id;
    SearchResult::new(
        descriptor,
        action(move |context: CommandContext| {
            let user_id = user_id.clone();
            async move {
                context
                    .host
                    .session
                    .impersonate(&user_id)
                    .await
                    .map_err(PaletteError::action)
            }
        }),
    )
}

async fn search_flags(
    directory: Rc<dyn AdminDirectory>,
    query: &str,
) -> Result<Vec<SearchResult>, PaletteError> {
    let flags = directory
        .search_flags(query)
        .await
        .map_err(PaletteError::provider)?;
    Ok(flags.into_iter().map(flag_result).collect())
}

fn flag_result(flag: FeatureFlag) -> SearchResult {
    let enable = !flag.enabled;
    let verb = if enable { "Enable" } else { "Disable" };
    let state = if flag.enabled { "enabled" } else { "disabled" };

    let mut descriptor = SearchResultDescriptor::new(
        format!("flag:{}", flag.key),
        flag.name.clone(),
        SearchDomain::feature_flag(),
    );
    descriptor.subtitle = Some(match &flag.description {
        Some(description) => format!("{} · {state} · {description}", flag.key),
        None => format!("{} · {state}", flag.key),
    });
    let icon = if flag.enabled { "toggle-right" } else { "toggle-left" };
    descriptor.icon = Some(icon.to_string());
    descriptor.requires_confirmation = true;
    descriptor.confirmation_message = Some(format!("{verb} \"{{label}}\"? Press enter to confirm"));
    descriptor.success_message = Some(format!(
        "{} {}",
        flag.name,
        if enable { "enabled" } else { "disabled" }
    ));
    descriptor
        .metadata
        .insert("key".to_string(), json!(flag.key));
    descriptor
        .metadata
        .insert("enabled".to_string(), json!(flag.enabled));

    let key = flag.key;
    SearchResult::new(
        descriptor,
        action(move |context: CommandContext| {
            let key = key.clone();
            async move {
                let updated = context
                    .host
                    .directory
                    .set_flag_enabled(&key, enable)
                    .await
                    .map_err(PaletteError::action)?;
                if updated.enabled != enable {
                    return Err(PaletteError::new(
                        PaletteErrorCode::Internal,
                        format!("feature flag `{key}` did not change"),
                    ));
                }
                Ok(())
            }
        }),
    )
}
