//! Typed IPC protocol between the UI and the orchestrator.
//!
//! Messages are adjacently tagged: `{"kind": "drag-move", "payload": {"x": 1, "y": 2}}`.
//! Unknown kinds or malformed payloads fail deserialization at the boundary.

use serde::{Deserialize, Serialize};

use crate::display::Point;
use crate::session::{Session, Turn};

/// Pointer sample in physical screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPayload {
    pub x: i32,
    pub y: i32,
}

impl From<PointerPayload> for Point {
    fn from(payload: PointerPayload) -> Self {
        Point::new(payload.x, payload.y)
    }
}

/// Payload of `send-chat-message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    pub message: String,
    pub session_id: String,
    #[serde(default)]
    pub enable_voice: bool,
}

/// Every request the UI may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum IpcMessage {
    DragStart(PointerPayload),
    DragMove(PointerPayload),
    DragEnd,
    ResizeStart(PointerPayload),
    ResizeMove(PointerPayload),
    ResizeEnd,
    RestoreSize,
    CollapseWindow,
    ExpandWindow,
    MiniDragMove(PointerPayload),
    MiniDragEnd,
    CloseApp,
    GetAllSessions,
    CreateNewSession,
    GetSessionHistory { id: String },
    DeleteSession { id: String },
    SendChatMessage(ChatMessagePayload),
}

impl IpcMessage {
    /// Kind string as it appears on the wire, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            IpcMessage::DragStart(_) => "drag-start",
            IpcMessage::DragMove(_) => "drag-move",
            IpcMessage::DragEnd => "drag-end",
            IpcMessage::ResizeStart(_) => "resize-start",
            IpcMessage::ResizeMove(_) => "resize-move",
            IpcMessage::ResizeEnd => "resize-end",
            IpcMessage::RestoreSize => "restore-size",
            IpcMessage::CollapseWindow => "collapse-window",
            IpcMessage::ExpandWindow => "expand-window",
            IpcMessage::MiniDragMove(_) => "mini-drag-move",
            IpcMessage::MiniDragEnd => "mini-drag-end",
            IpcMessage::CloseApp => "close-app",
            IpcMessage::GetAllSessions => "get-all-sessions",
            IpcMessage::CreateNewSession => "create-new-session",
            IpcMessage::GetSessionHistory { .. } => "get-session-history",
            IpcMessage::DeleteSession { .. } => "delete-session",
            IpcMessage::SendChatMessage(_) => "send-chat-message",
        }
    }
}

/// Response to an [`IpcMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum IpcReply {
    /// Fire-and-forget commands.
    Ack,
    Sessions(Vec<Session>),
    Session(Session),
    History(Vec<Turn>),
    Deleted(bool),
    ChatReply(String),
    /// The orchestrator has been disposed; the shell should exit.
    Exit,
}
