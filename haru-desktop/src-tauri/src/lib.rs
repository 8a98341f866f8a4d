mod app;
mod commands;
mod logging;
mod surfaces;

use std::sync::Arc;

use haru_application::Orchestrator;
use haru_core::surface::SurfaceKind;
use haru_infrastructure::{ConfigService, HaruPaths};
use tauri::{Manager, RunEvent, WindowEvent};

fn dispose_blocking(orchestrator: &Arc<Orchestrator>) {
    let orchestrator = orchestrator.clone();
    tauri::async_runtime::block_on(async move { orchestrator.dispose().await });
}

pub fn run() {
    let paths = match HaruPaths::default_location() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let config_service = ConfigService::new(paths.config_file());
    let config = config_service.get_config();
    let _log_guard = logging::init(&config.logging, &paths.logs_dir());

    tracing::info!("[Haru] Starting, config at {:?}", config_service.path());

    let builder = tauri::Builder::default()
        .setup(move |tauri_app| {
            let handle = tauri_app.handle().clone();
            let state = tauri::async_runtime::block_on(app::bootstrap(&handle, paths, &config))?;
            let orchestrator = state.orchestrator.clone();
            tauri_app.manage(state);

            tauri::async_runtime::spawn(async move {
                if let Err(e) = orchestrator.init().await {
                    tracing::error!("[Haru] Failed to initialize surfaces: {}", e);
                }
            });
            Ok(())
        })
        .on_window_event(|window, event| {
            // Closing the panel is closing the app; the indicator is only
            // ever hidden.
            if let WindowEvent::CloseRequested { .. } = event
                && window.label() == SurfaceKind::Panel.label()
            {
                if let Some(state) = window.try_state::<app::AppState>() {
                    dispose_blocking(&state.orchestrator);
                }
                window.app_handle().exit(0);
            }
        })
        .invoke_handler(commands::handlers())
        .build(tauri::generate_context!());

    let tauri_app = match builder {
        Ok(tauri_app) => tauri_app,
        Err(e) => {
            tracing::error!("[Haru] Failed to build application: {}", e);
            std::process::exit(1);
        }
    };

    tauri_app.run(|handle, event| {
        if let RunEvent::ExitRequested { .. } | RunEvent::Exit = event
            && let Some(state) = handle.try_state::<app::AppState>()
        {
            dispose_blocking(&state.orchestrator);
        }
    });
}
