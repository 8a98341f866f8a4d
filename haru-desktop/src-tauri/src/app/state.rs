use std::sync::Arc;

use haru_application::Orchestrator;
use haru_infrastructure::HaruPaths;

/// Application state shared across Tauri commands.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub paths: HaruPaths,
}
