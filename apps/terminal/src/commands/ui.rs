//! # UI Commands

use tracing::debug;

use crate::error::CommandResult;
use crate::state::{AppState, UiPreferences};

pub fn ui_preferences(state: &AppState) -> UiPreferences {
    state.ui()
}

/// Flips the sidebar and remembers the choice.
pub async fn toggle_sidebar(state: &AppState) -> CommandResult<UiPreferences> {
    debug!("toggle_sidebar command");
    let open = !state.ui().sidebar_open;
    state.set_sidebar_open(open).await
}
