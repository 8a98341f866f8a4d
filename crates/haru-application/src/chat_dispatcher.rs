//! Chat dispatch: one user message in, one reply out.

use std::sync::Arc;

use haru_core::chat::{ChatRequest, fallback_reply};
use haru_core::session::{Role, SessionStore, Turn};
use haru_core::worker::WorkerInvoker;

/// Turns a user message into a reply and records both turns.
///
/// Never fails: worker problems are answered by the local fallback
/// responder and storage problems are logged without interrupting the turn.
pub struct ChatDispatcher {
    store: Arc<dyn SessionStore>,
    invoker: Arc<dyn WorkerInvoker>,
}

impl ChatDispatcher {
    pub fn new(store: Arc<dyn SessionStore>, invoker: Arc<dyn WorkerInvoker>) -> Self {
        Self { store, invoker }
    }

    /// Sends `message` for `session_id` and returns the reply.
    ///
    /// # Arguments
    ///
    /// * `message` - Raw user input (may be blank)
    /// * `session_id` - Session the turn belongs to
    /// * `enable_voice` - Forwarded to the worker as its voice flag
    ///
    /// # Returns
    ///
    /// The worker's reply when it is usable, otherwise a fallback reply.
    pub async fn send_message(&self, message: &str, session_id: &str, enable_voice: bool) -> String {
        // The user turn is written before the worker runs so the attempt
        // survives a worker that never answers.
        if let Err(e) = self.store.append_turn(session_id, Role::User, message).await {
            tracing::error!(
                "[ChatDispatcher] Failed to record user turn for {}: {}",
                session_id,
                e
            );
        }

        let history = match self.store.get_history(session_id).await {
            Ok(history) => history,
            Err(e) => {
                tracing::error!(
                    "[ChatDispatcher] Failed to load history for {}: {}",
                    session_id,
                    e
                );
                Vec::new()
            }
        };

        let request = ChatRequest::new(message, history, enable_voice);
        let outcome = self.invoker.invoke(&request).await;

        let reply = match outcome.accept() {
            Ok(reply) => reply,
            Err(reason) => {
                tracing::warn!(
                    "[ChatDispatcher] Using fallback reply for {}: {}",
                    session_id,
                    reason
                );
                let prior = earlier_turns(&request.history, message);
                fallback_reply(message, prior, &mut rand::thread_rng())
            }
        };

        if let Err(e) = self
            .store
            .append_turn(session_id, Role::Assistant, &reply)
            .await
        {
            tracing::error!(
                "[ChatDispatcher] Failed to record reply for {}: {}",
                session_id,
                e
            );
        }

        reply
    }
}

/// History without the user turn that was just recorded for `message`.
fn earlier_turns<'a>(history: &'a [Turn], message: &str) -> &'a [Turn] {
    match history.split_last() {
        Some((last, rest)) if last.role == Role::User && last.content == message => rest,
        _ => history,
    }
}
