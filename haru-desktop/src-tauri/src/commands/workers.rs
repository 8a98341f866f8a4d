use haru_core::worker::WorkerStatus;
use tauri::State;

use crate::app::AppState;

/// Reports whether the background worker for `role` is running.
#[tauri::command]
pub async fn get_worker_status(
    role: String,
    state: State<'_, AppState>,
) -> Result<WorkerStatus, String> {
    Ok(state.orchestrator.worker_status(&role).await)
}
