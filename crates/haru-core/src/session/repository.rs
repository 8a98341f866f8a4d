//! Session store trait.
//!
//! Defines the interface for the append-only per-session turn logs.

use async_trait::async_trait;

use super::message::{Role, Turn};
use super::model::Session;
use crate::error::Result;

/// An abstract store for session logs.
///
/// Appending is the only mutation: turns are never edited or removed
/// individually, only the whole log can be deleted.
///
/// # Implementation Notes
///
/// Implementations that allow parallel callers must serialize appends per
/// session id so that log order matches call order.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Lists all sessions, most recently modified first.
    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Creates a new, empty session. The backing log exists when this returns.
    async fn create_session(&self) -> Result<Session>;

    /// Returns the turns of `session_id` in append order.
    ///
    /// A missing or empty log yields an empty vector, not an error.
    async fn get_history(&self, session_id: &str) -> Result<Vec<Turn>>;

    /// Appends one turn to the log of `session_id`.
    async fn append_turn(&self, session_id: &str, role: Role, content: &str) -> Result<Turn>;

    /// Removes the log of `session_id`.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: a log existed and was removed
    /// - `Ok(false)`: there was nothing to delete
    async fn delete_session(&self, session_id: &str) -> Result<bool>;
}
