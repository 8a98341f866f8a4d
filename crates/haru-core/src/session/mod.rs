//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Session descriptor and naming heuristics (`Session`)
//! - `message`: Turn types (`Role`, `Turn`)
//! - `repository`: Store trait for session logs (`SessionStore`)

mod message;
mod model;
mod repository;

pub use message::{Role, Turn};
pub use model::{SESSION_NAME_CHARS, Session, default_session_name, derive_session_name};
pub use repository::SessionStore;
