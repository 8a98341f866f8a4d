pub mod ipc;
pub mod paths;
pub mod workers;

pub fn handlers() -> impl Fn(tauri::ipc::Invoke<tauri::Wry>) -> bool + Send + Sync + 'static {
    tauri::generate_handler![
        ipc::ipc,
        paths::get_config_path,
        paths::get_sessions_directory,
        paths::get_logs_directory,
        workers::get_worker_status,
    ]
}
