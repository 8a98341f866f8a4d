//! The orchestrator: one context object owning every core component.
//!
//! The desktop shell creates it once, calls [`Orchestrator::init`] after the
//! windows exist, routes every [`IpcMessage`] through [`Orchestrator::handle`]
//! and calls [`Orchestrator::dispose`] on every exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use haru_core::config::AppConfig;
use haru_core::display::DisplayLocator;
use haru_core::ipc::{IpcMessage, IpcReply};
use haru_core::session::SessionStore;
use haru_core::surface::SurfaceHost;
use haru_core::worker::{WorkerInvoker, WorkerStatus, WorkerSupervisor};
use haru_core::{HaruError, Result};
use tokio::sync::Mutex;

use crate::chat_dispatcher::ChatDispatcher;
use crate::geometry::GeometryController;

/// Collaborators the orchestrator is assembled from.
pub struct OrchestratorParts {
    pub surfaces: Arc<dyn SurfaceHost>,
    pub displays: Arc<dyn DisplayLocator>,
    pub store: Arc<dyn SessionStore>,
    pub invoker: Arc<dyn WorkerInvoker>,
    pub supervisor: Arc<dyn WorkerSupervisor>,
}

pub struct Orchestrator {
    geometry: Mutex<GeometryController>,
    store: Arc<dyn SessionStore>,
    chat: ChatDispatcher,
    supervisor: Arc<dyn WorkerSupervisor>,
    autostart: Vec<String>,
    initialized: AtomicBool,
    disposed: AtomicBool,
}

impl Orchestrator {
    pub fn new(parts: OrchestratorParts, config: &AppConfig) -> Self {
        let autostart = config
            .workers
            .iter()
            .filter(|spec| spec.autostart)
            .map(|spec| spec.role.clone())
            .collect();

        Self {
            geometry: Mutex::new(GeometryController::new(
                parts.surfaces,
                parts.displays,
                config.window.clone(),
            )),
            chat: ChatDispatcher::new(parts.store.clone(), parts.invoker),
            store: parts.store,
            supervisor: parts.supervisor,
            autostart,
            initialized: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// Places the panel and starts the autostart workers. Runs once.
    ///
    /// A worker that fails to start is logged; the app keeps running and
    /// chat falls back to local replies.
    pub async fn init(&self) -> Result<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.geometry.lock().await.init().await?;

        for role in &self.autostart {
            match self.supervisor.start(role).await {
                Ok(status) => tracing::info!("[Orchestrator] Worker '{}': {:?}", role, status),
                Err(e) => tracing::error!("[Orchestrator] Failed to start worker '{}': {}", role, e),
            }
        }

        tracing::info!("[Orchestrator] Initialized");
        Ok(())
    }

    /// Handles one message from the UI.
    pub async fn handle(&self, message: IpcMessage) -> Result<IpcReply> {
        match &message {
            IpcMessage::DragMove(_) | IpcMessage::ResizeMove(_) | IpcMessage::MiniDragMove(_) => {
                tracing::trace!("[Orchestrator] {}", message.kind());
            }
            _ => tracing::debug!("[Orchestrator] {}", message.kind()),
        }

        if self.is_disposed() {
            return match message {
                IpcMessage::CloseApp => Ok(IpcReply::Exit),
                other => Err(HaruError::internal(format!(
                    "'{}' received after shutdown",
                    other.kind()
                ))),
            };
        }

        let reply = match message {
            IpcMessage::DragStart(p) => {
                self.geometry.lock().await.drag_start(p.into()).await?;
                IpcReply::Ack
            }
            IpcMessage::DragMove(p) => {
                self.geometry.lock().await.drag_move(p.into()).await?;
                IpcReply::Ack
            }
            IpcMessage::DragEnd => {
                self.geometry.lock().await.drag_end();
                IpcReply::Ack
            }
            IpcMessage::ResizeStart(p) => {
                self.geometry.lock().await.resize_start(p.into()).await?;
                IpcReply::Ack
            }
            IpcMessage::ResizeMove(p) => {
                self.geometry.lock().await.resize_move(p.into()).await?;
                IpcReply::Ack
            }
            IpcMessage::ResizeEnd => {
                self.geometry.lock().await.resize_end();
                IpcReply::Ack
            }
            IpcMessage::RestoreSize => {
                self.geometry.lock().await.restore_size().await?;
                IpcReply::Ack
            }
            IpcMessage::CollapseWindow => {
                self.geometry.lock().await.collapse().await?;
                IpcReply::Ack
            }
            IpcMessage::ExpandWindow => {
                self.geometry.lock().await.expand().await?;
                IpcReply::Ack
            }
            IpcMessage::MiniDragMove(p) => {
                self.geometry.lock().await.mini_drag_move(p.into()).await?;
                IpcReply::Ack
            }
            IpcMessage::MiniDragEnd => {
                self.geometry.lock().await.mini_drag_end();
                IpcReply::Ack
            }
            IpcMessage::CloseApp => {
                self.dispose().await;
                IpcReply::Exit
            }
            IpcMessage::GetAllSessions => IpcReply::Sessions(self.store.list_sessions().await?),
            IpcMessage::CreateNewSession => IpcReply::Session(self.store.create_session().await?),
            IpcMessage::GetSessionHistory { id } => {
                IpcReply::History(self.store.get_history(&id).await?)
            }
            IpcMessage::DeleteSession { id } => {
                IpcReply::Deleted(self.store.delete_session(&id).await?)
            }
            IpcMessage::SendChatMessage(payload) => IpcReply::ChatReply(
                self.chat
                    .send_message(&payload.message, &payload.session_id, payload.enable_voice)
                    .await,
            ),
        };

        Ok(reply)
    }

    pub async fn worker_status(&self, role: &str) -> WorkerStatus {
        self.supervisor.status(role).await
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Stops every supervised worker. Safe to call from several exit paths;
    /// only the first call does anything.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("[Orchestrator] Shutting down workers");
        self.supervisor.stop_all().await;
        tracing::info!("[Orchestrator] Disposed");
    }
}
