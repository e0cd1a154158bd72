//! UI preferences that survive a restart.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UiPreferences {
    #[serde(default = "default_sidebar_open")]
    pub sidebar_open: bool,
}

fn default_sidebar_open() -> bool {
    true
}

impl Default for UiPreferences {
    fn default() -> Self {
        UiPreferences {
            sidebar_open: default_sidebar_open(),
        }
    }
}
