//! Selection protocol: mode entry, two-step confirmation, and the single-slot action lifecycle.

use std::rc::Rc;

use leptos::{logging, SignalGetUntracked};
use palette_contract::{CommandId, ExecutionId, PaletteMode};

use crate::{
    model::{CommandContext, PaletteItem},
    palette::CommandPalette,
    reducer::{next_execution_id, PaletteAction},
};

/// What a selection did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Nothing happened; another action is running or the item was not found.
    Ignored,
    /// The palette switched into a search mode.
    EnteredMode(PaletteMode),
    /// The item is armed and waits for a confirming selection.
    Armed(CommandId),
    /// The item's action started.
    Started(ExecutionId),
}

impl CommandPalette {
    /// Selects `item`.
    ///
    /// Mode-switch items enter their mode. Items requiring confirmation arm on the first
    /// selection and run on the second. Everything else runs immediately. While an action is
    /// running every selection is ignored.
    pub fn select_item(&self, item: Rc<dyn PaletteItem>, context: &CommandContext) -> SelectOutcome {
        let state = self.inner.state.get_untracked();
        if state.is_busy() {
            logging::log!(
                "command palette: ignoring `{}` while an action is running",
                item.id()
            );
            return SelectOutcome::Ignored;
        }

        if let Some(mode) = item.target_mode() {
            return match self.dispatch(PaletteAction::EnterMode(mode)) {
                Ok(()) => SelectOutcome::EnteredMode(mode),
                Err(_) => SelectOutcome::Ignored,
            };
        }

        if item.requires_confirmation() && !state.is_armed(item.id()) {
            return match self.dispatch(PaletteAction::Arm(item.id().clone())) {
                Ok(()) => SelectOutcome::Armed(item.id().clone()),
                Err(_) => SelectOutcome::Ignored,
            };
        }

        let execution_id = next_execution_id(&state);
        if self
            .dispatch(PaletteAction::ActionStarted {
                execution_id,
                item_id: item.id().clone(),
            })
            .is_err()
        {
            return SelectOutcome::Ignored;
        }

        let running = item.run(context.clone());
        let success = item
            .success_message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} completed", item.title()));
        let this = self.clone();
        (self.inner.spawner)(Box::pin(async move {
            let action = match running.await {
                Ok(()) => PaletteAction::ActionSucceeded {
                    execution_id,
                    message: success,
                },
                Err(err) => {
                    logging::warn!("command palette: action {} failed: {err}", execution_id.0);
                    PaletteAction::ActionFailed {
                        execution_id,
                        message: err.message_or(&this.inner.config.error_fallback).to_string(),
                    }
                }
            };
            let _ = this.dispatch(action);
        }));
        SelectOutcome::Started(execution_id)
    }
}
