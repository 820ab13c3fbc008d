//! Engine-side command, search result, context, and palette state shapes.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use palette_contract::{
    ActionStatus, AdminUser, CommandDescriptor, CommandId, ExecutionId, PaletteError, PaletteMode,
    SearchResultDescriptor, ThemeMode,
};
use palette_host::PaletteHostServices;

/// Async action run when a command or search result executes.
pub type CommandAction =
    Rc<dyn Fn(CommandContext) -> LocalBoxFuture<'static, Result<(), PaletteError>>>;

/// Ambient data commands need to act.
///
/// Supplied fresh by the caller for every call; the engine never caches it.
#[derive(Clone)]
pub struct CommandContext {
    /// Current route path.
    pub pathname: String,
    /// Signed-in admin, if any.
    pub current_user: Option<AdminUser>,
    /// Active color scheme.
    pub theme: ThemeMode,
    /// Host services actions call into.
    pub host: PaletteHostServices,
}

impl CommandContext {
    /// Creates a context for `pathname` with no user and the system theme.
    pub fn new(pathname: impl Into<String>, host: PaletteHostServices) -> Self {
        Self {
            pathname: pathname.into(),
            current_user: None,
            theme: ThemeMode::System,
            host,
        }
    }

    /// Sets the signed-in user.
    pub fn with_user(mut self, user: AdminUser) -> Self {
        self.current_user = Some(user);
        self
    }

    /// Sets the active theme.
    pub fn with_theme(mut self, theme: ThemeMode) -> Self {
        self.theme = theme;
        self
    }

    /// Whether the session belongs to an impersonating admin.
    pub fn is_impersonating(&self) -> bool {
        self.current_user
            .as_ref()
            .is_some_and(|user| user.impersonated_by.is_some())
    }
}

/// Wraps an async closure into a [`CommandAction`].
pub fn action<F, Fut>(run: F) -> CommandAction
where
    F: Fn(CommandContext) -> Fut + 'static,
    Fut: std::future::Future<Output = Result<(), PaletteError>> + 'static,
{
    Rc::new(move |context| Box::pin(run(context)))
}

/// A registerable palette command.
#[derive(Clone)]
pub struct Command {
    /// Serializable metadata.
    pub descriptor: CommandDescriptor,
    /// Action run on execution.
    pub action: CommandAction,
}

impl Command {
    /// Creates a command from metadata and an action.
    pub fn new(descriptor: CommandDescriptor, action: CommandAction) -> Self {
        Self { descriptor, action }
    }

    /// Creates a command whose only effect is entering `mode`.
    pub fn mode_switch(descriptor: CommandDescriptor, mode: PaletteMode) -> Self {
        Self {
            descriptor: descriptor.with_target_mode(mode),
            action: action(|_| async { Ok(()) }),
        }
    }

    /// Case-insensitive substring match over label and keywords.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.descriptor.label.to_lowercase().contains(&query)
            || self
                .descriptor
                .keywords
                .iter()
                .any(|keyword| keyword.to_lowercase().contains(&query))
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// One asynchronous search result.
#[derive(Clone)]
pub struct SearchResult {
    /// Serializable metadata.
    pub descriptor: SearchResultDescriptor,
    /// Action run on execution.
    pub action: CommandAction,
}

impl SearchResult {
    /// Creates a result from metadata and an action.
    pub fn new(descriptor: SearchResultDescriptor, action: CommandAction) -> Self {
        Self { descriptor, action }
    }
}

impl std::fmt::Debug for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchResult")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Structural interface shared by everything the palette can execute.
pub trait PaletteItem {
    /// Stable id used for arming and selection.
    fn id(&self) -> &CommandId;

    /// Display text.
    fn title(&self) -> &str;

    /// Whether a second selection is needed to run.
    fn requires_confirmation(&self) -> bool;

    /// Confirmation prompt template.
    fn confirmation_message(&self) -> Option<&str>;

    /// Mode entered on selection instead of running.
    fn target_mode(&self) -> Option<PaletteMode> {
        None
    }

    /// Success notification text.
    fn success_message(&self) -> Option<&str>;

    /// Starts the action.
    fn run(&self, context: CommandContext) -> LocalBoxFuture<'static, Result<(), PaletteError>>;
}

impl PaletteItem for Command {
    fn id(&self) -> &CommandId {
        &self.descriptor.id
    }

    fn title(&self) -> &str {
        &self.descriptor.label
    }

    fn requires_confirmation(&self) -> bool {
        self.descriptor.requires_confirmation
    }

    fn confirmation_message(&self) -> Option<&str> {
        self.descriptor.confirmation_message.as_deref()
    }

    fn target_mode(&self) -> Option<PaletteMode> {
        self.descriptor.target_mode
    }

    fn success_message(&self) -> Option<&str> {
        self.descriptor.success_message.as_deref()
    }

    fn run(&self, context: CommandContext) -> LocalBoxFuture<'static, Result<(), PaletteError>> {
        (self.action)(context)
    }
}

impl PaletteItem for SearchResult {
    fn id(&self) -> &CommandId {
        &self.descriptor.id
    }

    fn title(&self) -> &str {
        &self.descriptor.title
    }

    fn requires_confirmation(&self) -> bool {
        self.descriptor.requires_confirmation
    }

    fn confirmation_message(&self) -> Option<&str> {
        self.descriptor.confirmation_message.as_deref()
    }

    fn success_message(&self) -> Option<&str> {
        self.descriptor.success_message.as_deref()
    }

    fn run(&self, context: CommandContext) -> LocalBoxFuture<'static, Result<(), PaletteError>> {
        (self.action)(context)
    }
}

/// Renders a confirmation template, substituting `{label}`.
pub fn confirmation_text(item: &dyn PaletteItem) -> String {
    match item.confirmation_message() {
        Some(template) => template.replace("{label}", item.title()),
        None => format!("Press enter again to confirm \"{}\"", item.title()),
    }
}

/// Single source of UI truth for one palette instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteState {
    /// Whether the palette dialog is shown.
    pub is_open: bool,
    /// Current interaction mode.
    pub mode: PaletteMode,
    /// Raw input text.
    pub search: String,
    /// Item waiting for a confirming selection.
    pub confirming_action_id: Option<CommandId>,
    /// Status of the single action slot.
    pub action_status: ActionStatus,
    /// Keyboard cursor within the visible list.
    pub highlighted: usize,
    /// Item whose action is running.
    pub running_action_id: Option<CommandId>,
    /// Action currently owning `action_status`.
    pub active_execution: Option<ExecutionId>,
    /// Last issued execution id.
    pub last_execution: u64,
    /// Bumped whenever the palette opens or closes.
    pub open_generation: u64,
    /// `open_generation` when the active execution started.
    pub execution_generation: u64,
}

impl PaletteState {
    /// Whether an action is in flight.
    pub fn is_busy(&self) -> bool {
        self.action_status == ActionStatus::Loading
    }

    /// Whether `id` is armed.
    pub fn is_armed(&self, id: &CommandId) -> bool {
        self.confirming_action_id.as_ref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use palette_contract::CommandGroup;

    use super::*;

    fn command(label: &str, keywords: &[&str]) -> Command {
        Command::new(
            CommandDescriptor::new("id", label, CommandGroup::Actions).with_keywords(keywords),
            action(|_| async { Ok(()) }),
        )
    }

    #[test]
    fn matches_label_and_keywords_case_insensitively() {
        let cmd = command("Delete flag", &["remove", "feature"]);
        assert!(cmd.matches(""));
        assert!(cmd.matches("  "));
        assert!(cmd.matches("DELETE"));
        assert!(cmd.matches("feat"));
        assert!(!cmd.matches("users"));
    }

    #[test]
    fn confirmation_text_substitutes_label() {
        let mut cmd = command("Delete flag", &[]);
        cmd.descriptor = cmd
            .descriptor
            .with_confirmation(Some("Really {label}?"));
        assert_eq!(confirmation_text(&cmd), "Really Delete flag?");

        let plain = command("Sign out", &[]);
        assert_eq!(
            confirmation_text(&plain),
            "Press enter again to confirm \"Sign out\""
        );
    }

    #[test]
    fn mode_switch_commands_carry_target_mode() {
        let cmd = Command::mode_switch(
            CommandDescriptor::new("impersonate", "Impersonate a user", CommandGroup::Admin),
            PaletteMode::Impersonate,
        );
        assert_eq!(cmd.target_mode(), Some(PaletteMode::Impersonate));
        assert!(!cmd.requires_confirmation());
    }
}
