//! Presentation model: grouped command lists, search results, and empty/loading states.
//!
//! Rendering is a pure function of the palette state, the registry's commands for the current
//! context, and the search snapshot. [`visible_items`] and [`build_view`] flatten entries in the
//! same order, so the highlight index addresses the same item in both.

use std::rc::Rc;

use palette_contract::{ActionStatus, CommandGroup, CommandId, PaletteMode};

use crate::{
    config::PaletteConfig,
    model::{confirmation_text, Command, PaletteItem, PaletteState, SearchResult},
    search::{SearchSnapshot, SearchStatus},
};

/// In-palette keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKey {
    /// Previous entry.
    Up,
    /// Next entry.
    Down,
    /// Select or confirm the highlighted entry.
    Enter,
    /// Back one mode level, or close.
    Escape,
}

impl PaletteKey {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_key_name(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" | "Up" => Some(Self::Up),
            "ArrowDown" | "Down" => Some(Self::Down),
            "Enter" => Some(Self::Enter),
            "Escape" | "Esc" => Some(Self::Escape),
            _ => None,
        }
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    /// Item id passed back on selection.
    pub id: CommandId,
    /// Primary text.
    pub title: String,
    /// Secondary text.
    pub subtitle: Option<String>,
    /// Icon reference.
    pub icon: Option<String>,
    /// Shortcut hint text.
    pub shortcut: Option<String>,
    /// Keyboard cursor is on this row.
    pub highlighted: bool,
    /// Row is armed and waiting for confirmation.
    pub armed: bool,
    /// Confirmation prompt, present while armed.
    pub confirmation: Option<String>,
    /// Row's action is running.
    pub running: bool,
}

/// One group of commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSection {
    /// Section group.
    pub group: CommandGroup,
    /// Heading text.
    pub heading: &'static str,
    /// Rows in registration order.
    pub items: Vec<ItemView>,
}

/// List area content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteBody {
    /// Grouped registry commands.
    Commands {
        /// Non-empty sections in group order.
        sections: Vec<CommandSection>,
    },
    /// No command matches the input.
    NoCommands {
        /// Trimmed input.
        query: String,
    },
    /// Search mode with empty input.
    SearchHint {
        /// Prompt text.
        message: String,
    },
    /// Input shorter than the domain minimum.
    TypeMore {
        /// Required length.
        min_len: usize,
    },
    /// Waiting for the first results of a query.
    Loading,
    /// Search results.
    Results {
        /// Rows in provider order.
        items: Vec<ItemView>,
    },
    /// The latest query returned nothing.
    NoResults {
        /// Trimmed query.
        query: String,
    },
}

/// Complete render model of the palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteView {
    /// Dialog visibility.
    pub is_open: bool,
    /// Active mode.
    pub mode: PaletteMode,
    /// Heading text.
    pub title: &'static str,
    /// Input placeholder.
    pub placeholder: &'static str,
    /// Input text.
    pub search: String,
    /// Back affordance is shown.
    pub show_back: bool,
    /// Action slot status.
    pub action_status: ActionStatus,
    /// A search dispatch is in flight.
    pub is_searching: bool,
    /// List area.
    pub body: PaletteBody,
}

/// Commands matching the input, grouped in section order.
pub fn grouped_commands(commands: &[Command], query: &str) -> Vec<(CommandGroup, Vec<Command>)> {
    CommandGroup::ALL
        .iter()
        .filter_map(|group| {
            let members = commands
                .iter()
                .filter(|command| command.descriptor.group == *group && command.matches(query))
                .cloned()
                .collect::<Vec<_>>();
            (!members.is_empty()).then_some((*group, members))
        })
        .collect()
}

fn search_results_visible(snapshot: &SearchSnapshot) -> bool {
    !matches!(
        snapshot.status,
        SearchStatus::Idle | SearchStatus::NeedsMoreInput { .. }
    )
}

/// Selectable entries in display order.
pub fn visible_items(
    state: &PaletteState,
    commands: &[Command],
    snapshot: &SearchSnapshot,
) -> Vec<Rc<dyn PaletteItem>> {
    match state.mode {
        PaletteMode::Default => grouped_commands(commands, &state.search)
            .into_iter()
            .flat_map(|(_, members)| members)
            .map(|command| Rc::new(command) as Rc<dyn PaletteItem>)
            .collect(),
        PaletteMode::Impersonate | PaletteMode::FlagToggle => {
            if !search_results_visible(snapshot) {
                return Vec::new();
            }
            snapshot
                .all_results()
                .cloned()
                .map(|result| Rc::new(result) as Rc<dyn PaletteItem>)
                .collect()
        }
    }
}

fn item_view(state: &PaletteState, item: &dyn PaletteItem, index: usize) -> ItemView {
    let armed = state.is_armed(item.id());
    ItemView {
        id: item.id().clone(),
        title: item.title().to_string(),
        subtitle: None,
        icon: None,
        shortcut: None,
        highlighted: state.highlighted == index,
        armed,
        confirmation: armed.then(|| confirmation_text(item)),
        running: state.is_busy() && state.running_action_id.as_ref() == Some(item.id()),
    }
}

fn command_view(state: &PaletteState, command: &Command, index: usize) -> ItemView {
    ItemView {
        icon: command.descriptor.icon.clone(),
        shortcut: command
            .descriptor
            .shortcut
            .as_ref()
            .map(|shortcut| shortcut.display()),
        ..item_view(state, command, index)
    }
}

fn result_view(state: &PaletteState, result: &SearchResult, index: usize) -> ItemView {
    ItemView {
        subtitle: result.descriptor.subtitle.clone(),
        icon: result.descriptor.icon.clone(),
        ..item_view(state, result, index)
    }
}

fn search_hint(mode: PaletteMode) -> String {
    match mode {
        PaletteMode::Impersonate => "Start typing a name or email".to_string(),
        PaletteMode::FlagToggle => "Start typing a flag key or name".to_string(),
        PaletteMode::Default => String::new(),
    }
}

/// Builds the render model.
pub fn build_view(
    state: &PaletteState,
    commands: &[Command],
    snapshot: &SearchSnapshot,
    config: &PaletteConfig,
) -> PaletteView {
    let query = state.search.trim().to_string();
    let body = match state.mode {
        PaletteMode::Default => {
            let mut index = 0;
            let sections = grouped_commands(commands, &state.search)
                .into_iter()
                .map(|(group, members)| CommandSection {
                    group,
                    heading: group.label(),
                    items: members
                        .iter()
                        .map(|command| {
                            let row = command_view(state, command, index);
                            index += 1;
                            row
                        })
                        .collect(),
                })
                .collect::<Vec<_>>();
            if sections.is_empty() {
                PaletteBody::NoCommands { query }
            } else {
                PaletteBody::Commands { sections }
            }
        }
        mode => match snapshot.status {
            SearchStatus::NeedsMoreInput { min_len } => PaletteBody::TypeMore { min_len },
            _ if query.is_empty() => {
                let min_len = mode
                    .search_domain()
                    .map(|domain| config.policy(&domain).min_query_len)
                    .unwrap_or_default();
                let hint = search_hint(mode);
                PaletteBody::SearchHint {
                    message: if min_len > 1 {
                        format!("{hint} ({min_len}+ characters)")
                    } else {
                        hint
                    },
                }
            }
            SearchStatus::Idle => PaletteBody::Loading,
            status => {
                let items = snapshot
                    .all_results()
                    .enumerate()
                    .map(|(index, result)| result_view(state, result, index))
                    .collect::<Vec<_>>();
                if !items.is_empty() {
                    PaletteBody::Results { items }
                } else if status == SearchStatus::Ready {
                    PaletteBody::NoResults { query }
                } else {
                    PaletteBody::Loading
                }
            }
        },
    };

    PaletteView {
        is_open: state.is_open,
        mode: state.mode,
        title: state.mode.title(),
        placeholder: state.mode.placeholder(),
        search: state.search.clone(),
        show_back: state.mode != PaletteMode::Default,
        action_status: state.action_status,
        is_searching: snapshot.is_searching(),
        body,
    }
}
