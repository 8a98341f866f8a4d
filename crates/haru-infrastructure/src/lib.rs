pub mod config_service;
pub mod jsonl_session_store;
pub mod paths;
pub mod process;
pub mod process_worker_invoker;
pub mod process_worker_supervisor;

pub use crate::config_service::ConfigService;
pub use crate::jsonl_session_store::JsonlSessionStore;
pub use crate::paths::{HaruPaths, PathError};
pub use crate::process_worker_invoker::ProcessWorkerInvoker;
pub use crate::process_worker_supervisor::ProcessWorkerSupervisor;
