pub mod chat;
pub mod config;
pub mod display;
pub mod error;
pub mod gesture;
pub mod ipc;
pub mod session;
pub mod surface;
pub mod worker;

// Re-export common error type
pub use error::{HaruError, Result};
