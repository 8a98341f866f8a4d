use tauri::State;

use crate::app::AppState;

fn path_string(path: &std::path::Path, what: &str) -> Result<String, String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| format!("{what} path is not valid UTF-8"))
}

/// Gets the path to the configuration file
#[tauri::command]
pub async fn get_config_path(state: State<'_, AppState>) -> Result<String, String> {
    path_string(&state.paths.config_file(), "Config")
}

/// Gets the sessions directory path
#[tauri::command]
pub async fn get_sessions_directory(state: State<'_, AppState>) -> Result<String, String> {
    path_string(&state.paths.sessions_dir(), "Sessions directory")
}

/// Gets the logs directory path
#[tauri::command]
pub async fn get_logs_directory(state: State<'_, AppState>) -> Result<String, String> {
    path_string(&state.paths.logs_dir(), "Logs directory")
}
