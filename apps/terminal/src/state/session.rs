//! # Session State
//!
//! Who is signed in and what they may do. Tokens are not kept here: they
//! live in the API client's `TokenStore`, which refreshes them on its own.

use contable_api::UserProfile;
use contable_core::{CapabilitySet, Permission};
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Session {
    pub user: UserProfile,

    /// Resolved once at sign-in from `user.permissions`.
    pub capabilities: CapabilitySet,

    /// Restored from the local cache because the server was unreachable.
    /// Cleared by the first successful token refresh.
    pub offline: bool,
}

impl Session {
    pub fn new(user: UserProfile, offline: bool) -> Self {
        let capabilities = user.capabilities();
        Session {
            user,
            capabilities,
            offline,
        }
    }

    #[inline]
    pub fn can(&self, permission: Permission) -> bool {
        self.capabilities.has(permission)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn(Session),
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::SignedIn(session) => Some(session),
            SessionState::SignedOut => None,
        }
    }
}
