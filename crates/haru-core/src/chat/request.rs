//! Chat request payload handed to the one-shot worker.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::Turn;

/// Everything a worker needs to produce one reply.
///
/// In file transport this struct is written verbatim as the request document
/// (`{"message","history","enableVoice"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<Turn>,
    pub enable_voice: bool,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, history: Vec<Turn>, enable_voice: bool) -> Self {
        Self {
            message: message.into(),
            history,
            enable_voice,
        }
    }

    /// History serialized as a JSON array, as passed in argument transport.
    pub fn history_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.history)?)
    }

    /// Flag value passed to the worker in argument transport.
    pub fn voice_flag(&self) -> &'static str {
        if self.enable_voice { "true" } else { "false" }
    }
}
