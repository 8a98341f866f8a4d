use std::sync::Arc;

use anyhow::{Context, Result};
use haru_application::{Orchestrator, OrchestratorParts};
use haru_core::config::AppConfig;
use haru_infrastructure::{
    HaruPaths, JsonlSessionStore, ProcessWorkerInvoker, ProcessWorkerSupervisor,
};
use tauri::AppHandle;

use crate::app::AppState;
use crate::surfaces::{TauriDisplayLocator, TauriSurfaceHost};

/// Composition root: builds the orchestrator on top of the Tauri windows.
pub async fn bootstrap(app: &AppHandle, paths: HaruPaths, config: &AppConfig) -> Result<AppState> {
    let store = JsonlSessionStore::new(paths.sessions_dir())
        .await
        .with_context(|| format!("Failed to open sessions directory {:?}", paths.sessions_dir()))?;
    tracing::info!("[Bootstrap] Sessions stored in {:?}", store.sessions_dir());

    let supervisor = ProcessWorkerSupervisor::new(config.workers.iter().cloned());
    tracing::info!(
        "[Bootstrap] {} worker(s) configured, autostart: {:?}",
        config.workers.len(),
        supervisor.autostart_roles()
    );

    let orchestrator = Orchestrator::new(
        OrchestratorParts {
            surfaces: Arc::new(TauriSurfaceHost::new(app.clone(), config.window.clone())),
            displays: Arc::new(TauriDisplayLocator::new(app.clone())),
            store: Arc::new(store),
            invoker: Arc::new(ProcessWorkerInvoker::new(config.chat.clone())),
            supervisor: Arc::new(supervisor),
        },
        config,
    );

    Ok(AppState {
        orchestrator: Arc::new(orchestrator),
        paths,
    })
}
