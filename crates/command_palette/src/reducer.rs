//! Reducer actions, side-effect intents, and transition logic for the palette state machine.

use palette_contract::{ActionStatus, CommandId, ExecutionId, PaletteMode};
use thiserror::Error;

use crate::model::PaletteState;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Actions accepted by [`reduce_palette`] to mutate [`PaletteState`].
pub enum PaletteAction {
    /// Show the palette.
    Open,
    /// Hide the palette and return to the default mode.
    Close,
    /// Global shortcut entry point.
    Toggle,
    /// Replace the input text.
    SetSearch(String),
    /// Switch into a search mode.
    EnterMode(PaletteMode),
    /// Explicit back affordance.
    Back,
    /// Escape key: back one mode level, or close from the default mode.
    Escape,
    /// Move the keyboard cursor, wrapping around `item_count` entries.
    MoveHighlight {
        /// Signed step.
        delta: isize,
        /// Visible entries.
        item_count: usize,
    },
    /// Arm an item for confirmation.
    Arm(CommandId),
    /// Clear the armed item.
    Disarm,
    /// An action started.
    ActionStarted {
        /// Identifier of the new run.
        execution_id: ExecutionId,
        /// Item being run.
        item_id: CommandId,
    },
    /// The running action resolved.
    ActionSucceeded {
        /// Run that resolved.
        execution_id: ExecutionId,
        /// Notification text.
        message: String,
    },
    /// The running action rejected.
    ActionFailed {
        /// Run that rejected.
        execution_id: ExecutionId,
        /// Notification text.
        message: String,
    },
    /// Close delay after success elapsed.
    SettleSuccess {
        /// Run being settled.
        execution_id: ExecutionId,
    },
    /// Error state was shown.
    SettleError {
        /// Run being settled.
        execution_id: ExecutionId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Side-effect intents emitted by [`reduce_palette`] for the controller to execute.
pub enum PaletteEffect {
    /// Drop pending and in-flight search work and clear results.
    ResetSearch,
    /// Debounce and dispatch `query` for the mode's search domain.
    QueueSearch {
        /// Mode whose domain is searched.
        mode: PaletteMode,
        /// Raw input text.
        query: String,
    },
    /// Raise a success notification.
    NotifySuccess(String),
    /// Raise an error notification.
    NotifyError(String),
    /// Dispatch [`PaletteAction::SettleSuccess`] after the close delay.
    ScheduleClose {
        /// Run to settle.
        execution_id: ExecutionId,
    },
    /// Dispatch [`PaletteAction::SettleError`].
    SettleError {
        /// Run to settle.
        execution_id: ExecutionId,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for actions that are invalid in the current state.
pub enum ReducerError {
    /// Search modes can only be entered from the default mode.
    #[error("cannot enter {to} mode from {from} mode")]
    InvalidModeTransition {
        /// Current mode.
        from: &'static str,
        /// Requested mode.
        to: &'static str,
    },
    /// An action is already running.
    #[error("an action is already running")]
    Busy,
}

/// Applies a [`PaletteAction`] to the palette state and collects resulting side effects.
///
/// # Errors
///
/// Returns [`ReducerError::InvalidModeTransition`] when entering a search mode outside the default
/// mode, and [`ReducerError::Busy`] when arming or starting while an action is running.
pub fn reduce_palette(
    state: &mut PaletteState,
    action: PaletteAction,
) -> Result<Vec<PaletteEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        PaletteAction::Open => {
            open(state);
        }
        PaletteAction::Close => {
            close(state, &mut effects);
        }
        PaletteAction::Toggle => {
            if state.is_open {
                close(state, &mut effects);
            } else {
                open(state);
            }
        }
        PaletteAction::SetSearch(search) => {
            state.search = search;
            state.highlighted = 0;
            state.confirming_action_id = None;
            if state.mode != PaletteMode::Default {
                effects.push(PaletteEffect::QueueSearch {
                    mode: state.mode,
                    query: state.search.clone(),
                });
            }
        }
        PaletteAction::EnterMode(PaletteMode::Default) => {
            return_to_default(state, &mut effects);
        }
        PaletteAction::EnterMode(mode) => {
            if state.mode != PaletteMode::Default {
                return Err(ReducerError::InvalidModeTransition {
                    from: state.mode.as_str(),
                    to: mode.as_str(),
                });
            }
            state.mode = mode;
            open(state);
            state.search.clear();
            state.confirming_action_id = None;
            state.highlighted = 0;
            effects.push(PaletteEffect::ResetSearch);
        }
        PaletteAction::Back => {
            if state.mode != PaletteMode::Default {
                return_to_default(state, &mut effects);
            }
        }
        PaletteAction::Escape => {
            if state.mode != PaletteMode::Default {
                return_to_default(state, &mut effects);
            } else {
                close(state, &mut effects);
            }
        }
        PaletteAction::MoveHighlight { delta, item_count } => {
            state.highlighted = wrap_index(state.highlighted, delta, item_count);
        }
        PaletteAction::Arm(id) => {
            if state.is_busy() {
                return Err(ReducerError::Busy);
            }
            state.confirming_action_id = Some(id);
            if state.action_status == ActionStatus::Error {
                state.action_status = ActionStatus::Idle;
            }
        }
        PaletteAction::Disarm => {
            state.confirming_action_id = None;
        }
        PaletteAction::ActionStarted {
            execution_id,
            item_id,
        } => {
            if state.is_busy() {
                return Err(ReducerError::Busy);
            }
            state.action_status = ActionStatus::Loading;
            state.active_execution = Some(execution_id);
            state.execution_generation = state.open_generation;
            state.running_action_id = Some(item_id);
            state.confirming_action_id = None;
            state.last_execution = state.last_execution.max(execution_id.0);
        }
        PaletteAction::ActionSucceeded {
            execution_id,
            message,
        } => {
            if state.active_execution == Some(execution_id) {
                state.action_status = ActionStatus::Success;
                state.confirming_action_id = None;
                effects.push(PaletteEffect::NotifySuccess(message));
                effects.push(PaletteEffect::ScheduleClose { execution_id });
            }
        }
        PaletteAction::ActionFailed {
            execution_id,
            message,
        } => {
            if state.active_execution == Some(execution_id) {
                state.action_status = ActionStatus::Error;
                state.confirming_action_id = None;
                effects.push(PaletteEffect::NotifyError(message));
                effects.push(PaletteEffect::SettleError { execution_id });
            }
        }
        PaletteAction::SettleSuccess { execution_id } => {
            if state.active_execution == Some(execution_id) {
                state.active_execution = None;
                state.running_action_id = None;
                state.action_status = ActionStatus::Idle;
                if state.open_generation == state.execution_generation {
                    close(state, &mut effects);
                }
            }
        }
        PaletteAction::SettleError { execution_id } => {
            if state.active_execution == Some(execution_id) {
                state.active_execution = None;
                state.running_action_id = None;
                state.action_status = ActionStatus::Idle;
            }
        }
    }
    Ok(effects)
}

/// Allocates the next execution id.
pub fn next_execution_id(state: &PaletteState) -> ExecutionId {
    ExecutionId(state.last_execution.saturating_add(1))
}

fn return_to_default(state: &mut PaletteState, effects: &mut Vec<PaletteEffect>) {
    state.mode = PaletteMode::Default;
    state.search.clear();
    state.confirming_action_id = None;
    state.highlighted = 0;
    effects.push(PaletteEffect::ResetSearch);
}

fn open(state: &mut PaletteState) {
    if !state.is_open {
        state.is_open = true;
        state.open_generation = state.open_generation.wrapping_add(1);
    }
    state.highlighted = 0;
}

fn close(state: &mut PaletteState, effects: &mut Vec<PaletteEffect>) {
    if state.is_open {
        state.is_open = false;
        state.open_generation = state.open_generation.wrapping_add(1);
    }
    return_to_default(state, effects);
}

fn wrap_index(current: usize, delta: isize, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let count = count as isize;
    let current = (current as isize).min(count - 1);
    (current + delta).rem_euclid(count) as usize
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn start(execution_id: ExecutionId) -> PaletteAction {
        PaletteAction::ActionStarted {
            execution_id,
            item_id: CommandId::new("item"),
        }
    }

    fn open_in(mode: PaletteMode, search: &str) -> PaletteState {
        let mut state = PaletteState::default();
        reduce_palette(&mut state, PaletteAction::Open).expect("open");
        if mode != PaletteMode::Default {
            reduce_palette(&mut state, PaletteAction::EnterMode(mode)).expect("enter mode");
        }
        reduce_palette(&mut state, PaletteAction::SetSearch(search.to_string())).expect("search");
        state
    }

    #[test]
    fn escape_from_search_mode_returns_to_default_and_clears() {
        let mut state = open_in(PaletteMode::Impersonate, "ali");
        state.confirming_action_id = Some(CommandId::new("user:u-1"));

        let effects = reduce_palette(&mut state, PaletteAction::Escape).expect("escape");

        assert_eq!(state.mode, PaletteMode::Default);
        assert_eq!(state.search, "");
        assert_eq!(state.confirming_action_id, None);
        assert!(state.is_open);
        assert_eq!(effects, vec![PaletteEffect::ResetSearch]);
    }

    #[test]
    fn back_and_close_reset_search_modes() {
        let mut state = open_in(PaletteMode::FlagToggle, "beta");
        reduce_palette(&mut state, PaletteAction::Back).expect("back");
        assert_eq!(state.mode, PaletteMode::Default);
        assert_eq!(state.search, "");

        let mut state = open_in(PaletteMode::FlagToggle, "beta");
        state.confirming_action_id = Some(CommandId::new("flag:beta"));
        reduce_palette(&mut state, PaletteAction::Close).expect("close");
        assert!(!state.is_open);
        assert_eq!(state.mode, PaletteMode::Default);
        assert_eq!(state.search, "");
        assert_eq!(state.confirming_action_id, None);
    }

    #[test]
    fn escape_in_default_mode_closes() {
        let mut state = open_in(PaletteMode::Default, "us");
        reduce_palette(&mut state, PaletteAction::Escape).expect("escape");
        assert!(!state.is_open);
        assert_eq!(state.search, "");
    }

    #[test]
    fn back_in_default_mode_is_a_noop() {
        let mut state = open_in(PaletteMode::Default, "us");
        let effects = reduce_palette(&mut state, PaletteAction::Back).expect("back");
        assert!(effects.is_empty());
        assert_eq!(state.search, "us");
    }

    #[test]
    fn entering_a_mode_clears_search_and_arming() {
        let mut state = open_in(PaletteMode::Default, "imp");
        state.confirming_action_id = Some(CommandId::new("sign-out"));

        let effects = reduce_palette(&mut state, PaletteAction::EnterMode(PaletteMode::Impersonate))
            .expect("enter");

        assert_eq!(state.mode, PaletteMode::Impersonate);
        assert_eq!(state.search, "");
        assert_eq!(state.confirming_action_id, None);
        assert_eq!(effects, vec![PaletteEffect::ResetSearch]);
    }

    #[test]
    fn search_modes_cannot_nest() {
        let mut state = open_in(PaletteMode::Impersonate, "");
        let err = reduce_palette(&mut state, PaletteAction::EnterMode(PaletteMode::FlagToggle))
            .expect_err("nested mode");
        assert_eq!(
            err,
            ReducerError::InvalidModeTransition {
                from: "impersonate",
                to: "flag-toggle",
            }
        );
        assert_eq!(state.mode, PaletteMode::Impersonate);
    }

    #[test]
    fn typing_in_search_mode_queues_search_and_disarms() {
        let mut state = open_in(PaletteMode::Impersonate, "");
        state.confirming_action_id = Some(CommandId::new("user:u-1"));
        let effects =
            reduce_palette(&mut state, PaletteAction::SetSearch("ali".to_string())).expect("type");
        assert_eq!(
            effects,
            vec![PaletteEffect::QueueSearch {
                mode: PaletteMode::Impersonate,
                query: "ali".to_string(),
            }]
        );
        assert_eq!(state.confirming_action_id, None);

        let mut state = open_in(PaletteMode::Default, "");
        let effects =
            reduce_palette(&mut state, PaletteAction::SetSearch("ali".to_string())).expect("type");
        assert!(effects.is_empty());
    }

    #[test]
    fn toggle_opens_and_closes() {
        let mut state = PaletteState::default();
        reduce_palette(&mut state, PaletteAction::Toggle).expect("toggle");
        assert!(state.is_open);
        reduce_palette(&mut state, PaletteAction::Toggle).expect("toggle");
        assert!(!state.is_open);
    }

    #[test]
    fn highlight_wraps_both_ways() {
        let mut state = PaletteState::default();
        let step = |state: &mut PaletteState, delta| {
            reduce_palette(state, PaletteAction::MoveHighlight { delta, item_count: 3 })
                .expect("move");
            state.highlighted
        };
        assert_eq!(step(&mut state, -1), 2);
        assert_eq!(step(&mut state, 1), 0);
        assert_eq!(step(&mut state, 1), 1);
        assert_eq!(
            {
                reduce_palette(
                    &mut state,
                    PaletteAction::MoveHighlight {
                        delta: 1,
                        item_count: 0,
                    },
                )
                .expect("move");
                state.highlighted
            },
            0
        );
    }

    #[test]
    fn success_schedules_close_then_settles_to_idle_default() {
        let mut state = open_in(PaletteMode::FlagToggle, "beta");
        let run = next_execution_id(&state);
        reduce_palette(&mut state, start(run)).expect("start");
        assert_eq!(state.action_status, ActionStatus::Loading);

        let effects = reduce_palette(
            &mut state,
            PaletteAction::ActionSucceeded {
                execution_id: run,
                message: "Flag enabled".to_string(),
            },
        )
        .expect("succeed");
        assert_eq!(state.action_status, ActionStatus::Success);
        assert_eq!(
            effects,
            vec![
                PaletteEffect::NotifySuccess("Flag enabled".to_string()),
                PaletteEffect::ScheduleClose { execution_id: run },
            ]
        );

        reduce_palette(&mut state, PaletteAction::SettleSuccess { execution_id: run })
            .expect("settle");
        assert_eq!(state.action_status, ActionStatus::Idle);
        assert!(!state.is_open);
        assert_eq!(state.mode, PaletteMode::Default);
        assert_eq!(state.active_execution, None);
    }

    #[test]
    fn failure_keeps_palette_open_and_disarms() {
        let mut state = open_in(PaletteMode::Default, "");
        state.confirming_action_id = Some(CommandId::new("delete-flag"));
        let run = next_execution_id(&state);
        reduce_palette(&mut state, start(run)).expect("start");

        let effects = reduce_palette(
            &mut state,
            PaletteAction::ActionFailed {
                execution_id: run,
                message: "flag locked".to_string(),
            },
        )
        .expect("fail");
        assert_eq!(state.action_status, ActionStatus::Error);
        assert_eq!(state.confirming_action_id, None);
        assert!(state.is_open);
        assert_eq!(
            effects,
            vec![
                PaletteEffect::NotifyError("flag locked".to_string()),
                PaletteEffect::SettleError { execution_id: run },
            ]
        );

        reduce_palette(&mut state, PaletteAction::SettleError { execution_id: run })
            .expect("settle");
        assert_eq!(state.action_status, ActionStatus::Idle);
        assert!(state.is_open);
    }

    #[test]
    fn busy_state_rejects_new_runs_and_arming() {
        let mut state = open_in(PaletteMode::Default, "");
        let run = next_execution_id(&state);
        reduce_palette(&mut state, start(run)).expect("start");

        let second = next_execution_id(&state);
        assert_eq!(
            reduce_palette(&mut state, start(second)),
            Err(ReducerError::Busy)
        );
        assert_eq!(
            reduce_palette(&mut state, PaletteAction::Arm(CommandId::new("x"))),
            Err(ReducerError::Busy)
        );
        assert_eq!(state.active_execution, Some(run));
    }

    #[test]
    fn settlements_for_other_runs_are_ignored() {
        let mut state = open_in(PaletteMode::Default, "");
        let run = next_execution_id(&state);
        reduce_palette(&mut state, start(run)).expect("start");

        let effects = reduce_palette(
            &mut state,
            PaletteAction::ActionSucceeded {
                execution_id: ExecutionId(run.0 + 7),
                message: "ignored".to_string(),
            },
        )
        .expect("stale success");
        assert!(effects.is_empty());
        assert_eq!(state.action_status, ActionStatus::Loading);
    }

    #[test]
    fn close_while_running_keeps_the_action_slot_busy() {
        let mut state = open_in(PaletteMode::Impersonate, "ali");
        let run = next_execution_id(&state);
        reduce_palette(&mut state, start(run)).expect("start");
        reduce_palette(&mut state, PaletteAction::Close).expect("close");

        assert!(!state.is_open);
        assert_eq!(state.mode, PaletteMode::Default);
        assert_eq!(state.action_status, ActionStatus::Loading);
        assert_eq!(state.active_execution, Some(run));
    }

    #[test]
    fn late_success_leaves_a_reopened_palette_alone() {
        let mut state = open_in(PaletteMode::Default, "");
        let run = next_execution_id(&state);
        reduce_palette(&mut state, start(run)).expect("start");
        reduce_palette(&mut state, PaletteAction::Close).expect("close");
        reduce_palette(&mut state, PaletteAction::Toggle).expect("reopen");
        reduce_palette(&mut state, PaletteAction::SetSearch("us".to_string())).expect("type");

        reduce_palette(
            &mut state,
            PaletteAction::ActionSucceeded {
                execution_id: run,
                message: "done".to_string(),
            },
        )
        .expect("succeed");
        let effects = reduce_palette(&mut state, PaletteAction::SettleSuccess { execution_id: run })
            .expect("settle");

        assert!(effects.is_empty());
        assert!(state.is_open);
        assert_eq!(state.search, "us");
        assert_eq!(state.action_status, ActionStatus::Idle);
        assert_eq!(state.active_execution, None);
    }

    #[test]
    fn late_success_on_a_closed_palette_only_frees_the_slot() {
        let mut state = open_in(PaletteMode::Default, "");
        let run = next_execution_id(&state);
        reduce_palette(&mut state, start(run)).expect("start");
        reduce_palette(&mut state, PaletteAction::Close).expect("close");
        reduce_palette(
            &mut state,
            PaletteAction::ActionSucceeded {
                execution_id: run,
                message: "done".to_string(),
            },
        )
        .expect("succeed");
        reduce_palette(&mut state, PaletteAction::SettleSuccess { execution_id: run })
            .expect("settle");

        assert!(!state.is_open);
        assert_eq!(state.action_status, ActionStatus::Idle);
        assert_eq!(state.running_action_id, None);
    }

    #[test]
    fn starting_an_action_clears_the_armed_item() {
        let mut state = open_in(PaletteMode::Default, "");
        reduce_palette(&mut state, PaletteAction::Arm(CommandId::new("item"))).expect("arm");
        let run = next_execution_id(&state);
        reduce_palette(&mut state, start(run)).expect("start");

        assert_eq!(state.confirming_action_id, None);
        assert_eq!(state.running_action_id, Some(CommandId::new("item")));
    }

    #[test]
    fn disarm_clears_only_the_armed_item() {
        let mut state = open_in(PaletteMode::Default, "del");
        reduce_palette(&mut state, PaletteAction::Arm(CommandId::new("delete"))).expect("arm");
        let effects = reduce_palette(&mut state, PaletteAction::Disarm).expect("disarm");

        assert!(effects.is_empty());
        assert_eq!(state.confirming_action_id, None);
        assert_eq!(state.search, "del");
    }
}
