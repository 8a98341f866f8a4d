use haru_core::ipc::{IpcMessage, IpcReply};
use tauri::{AppHandle, State};

use crate::app::AppState;

/// Single entry point for every UI message.
///
/// Unknown kinds and malformed payloads are rejected by deserialization
/// before they get here.
#[tauri::command]
pub async fn ipc(
    message: IpcMessage,
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<IpcReply, String> {
    let kind = message.kind();
    let reply = state.orchestrator.handle(message).await.map_err(|e| {
        tracing::error!("[IPC] {} failed: {}", kind, e);
        e.to_string()
    })?;

    if reply == IpcReply::Exit {
        app.exit(0);
    }
    Ok(reply)
}
