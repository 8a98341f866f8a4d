//! Session descriptor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::{Role, Turn};

/// Number of characters of the first user message used as a session name.
pub const SESSION_NAME_CHARS: usize = 20;

/// Summary of one persisted conversation thread.
///
/// The `id` is immutable and doubles as the storage key. The `name` is
/// derived from the stored turns each time the session is listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session identifier (`session_<timestamp>_<suffix>`)
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// When the session log was created
    pub created_at: DateTime<Utc>,
    /// When the session last received a turn (or was created)
    pub modified_at: DateTime<Utc>,
}

/// Derives a session name from its history.
///
/// Uses the first user turn, truncated to [`SESSION_NAME_CHARS`] characters
/// with an ellipsis, and falls back to `fallback` when there is no user turn.
pub fn derive_session_name(turns: &[Turn], fallback: &str) -> String {
    let Some(first) = turns.iter().find(|turn| turn.role == Role::User) else {
        return fallback.to_string();
    };

    let content = first.content.trim();
    if content.is_empty() {
        return fallback.to_string();
    }

    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SESSION_NAME_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Default name given to a freshly created session.
pub fn default_session_name(created_at: DateTime<Utc>) -> String {
    format!(
        "New chat {}",
        created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
    )
}
