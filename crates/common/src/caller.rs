//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Identity of the authenticated user issuing a request.
///
/// Built once at the HTTP boundary from a verified bearer token and passed
/// explicitly into every orchestrator operation that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub username: String,
    pub chat_id: String,
    pub is_hotelier: bool,
}

impl CallerIdentity {
    /// Creates a guest (non-hotelier) identity.
    pub fn guest(user_id: UserId, username: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            chat_id: chat_id.into(),
            is_hotelier: false,
        }
    }

    /// Creates a hotelier identity.
    pub fn hotelier(
        user_id: UserId,
        username: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            is_hotelier: true,
            ..Self::guest(user_id, username, chat_id)
        }
    }
}
