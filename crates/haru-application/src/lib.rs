//! Application layer for Haru.
//!
//! This crate wires the core contracts into the two behaviours the desktop
//! shell drives: window geometry and chat dispatch, both owned by the
//! [`Orchestrator`].

pub mod chat_dispatcher;
pub mod geometry;
pub mod orchestrator;

#[cfg(test)]
mod testing;

pub use chat_dispatcher::ChatDispatcher;
pub use geometry::GeometryController;
pub use orchestrator::{Orchestrator, OrchestratorParts};
