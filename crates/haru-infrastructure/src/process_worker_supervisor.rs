//! Supervisor for long-running background workers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use haru_core::chat::PlatformFamily;
use haru_core::config::WorkerSpec;
use haru_core::worker::{WorkerStatus, WorkerSupervisor};
use haru_core::{HaruError, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::Mutex;

use crate::process::{LaunchSpec, build_command, kill_tree, request_terminate};

enum Slot {
    Running { child: Child, pid: Option<u32> },
    Stopped,
}

/// Spawns workers from their [`WorkerSpec`] and keeps at most one process per role.
///
/// `start` and `stop` for the same role run one at a time, so a restart waits
/// until the previous process is gone. Worker output is forwarded line by line
/// to the `haru::worker` tracing target.
pub struct ProcessWorkerSupervisor {
    specs: HashMap<String, WorkerSpec>,
    platform: PlatformFamily,
    slots: Mutex<HashMap<String, Slot>>,
    lifecycle_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProcessWorkerSupervisor {
    pub fn new(specs: impl IntoIterator<Item = WorkerSpec>) -> Self {
        Self::with_platform(specs, PlatformFamily::current())
    }

    pub fn with_platform(specs: impl IntoIterator<Item = WorkerSpec>, platform: PlatformFamily) -> Self {
        Self {
            specs: specs
                .into_iter()
                .map(|spec| (spec.role.clone(), spec))
                .collect(),
            platform,
            slots: Mutex::new(HashMap::new()),
            lifecycle_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Roles configured to start with the application, in no particular order.
    pub fn autostart_roles(&self) -> Vec<String> {
        self.specs
            .values()
            .filter(|spec| spec.autostart)
            .map(|spec| spec.role.clone())
            .collect()
    }

    fn spec(&self, role: &str) -> Result<&WorkerSpec> {
        self.specs
            .get(role)
            .ok_or_else(|| HaruError::not_found("worker", role))
    }

    async fn lifecycle_lock(&self, role: &str) -> Arc<Mutex<()>> {
        let mut locks = self.lifecycle_locks.lock().await;
        locks
            .entry(role.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Refreshes `slot` if its process has exited on its own.
    fn reap(role: &str, slot: &mut Slot) {
        let Slot::Running { child, pid } = slot else {
            return;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::info!(
                    "[WorkerSupervisor] Worker '{}' (pid {:?}) exited: {}",
                    role,
                    pid,
                    status
                );
            }
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("[WorkerSupervisor] Failed to poll worker '{}': {}", role, e);
                return;
            }
        }
        *slot = Slot::Stopped;
    }

    async fn shutdown(&self, role: &str, spec: &WorkerSpec, mut child: Child, pid: Option<u32>) {
        if request_terminate(&child, self.platform).await {
            match tokio::time::timeout(spec.stop_grace(), child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::info!(
                        "[WorkerSupervisor] Worker '{}' (pid {:?}) stopped: {}",
                        role,
                        pid,
                        status
                    );
                    return;
                }
                Ok(Err(e)) => {
                    tracing::warn!("[WorkerSupervisor] Failed to wait for '{}': {}", role, e);
                }
                Err(_) => {
                    tracing::warn!(
                        "[WorkerSupervisor] Worker '{}' ignored stop request for {:?}, killing",
                        role,
                        spec.stop_grace()
                    );
                }
            }
        }

        kill_tree(&mut child, self.platform).await;
        tracing::info!("[WorkerSupervisor] Worker '{}' (pid {:?}) killed", role, pid);
    }
}

#[async_trait]
impl WorkerSupervisor for ProcessWorkerSupervisor {
    async fn start(&self, role: &str) -> Result<WorkerStatus> {
        let spec = self.spec(role)?;
        let lifecycle = self.lifecycle_lock(role).await;
        let _lifecycle = lifecycle.lock().await;
        let mut slots = self.slots.lock().await;

        if let Some(slot) = slots.get_mut(role) {
            Self::reap(role, slot);
            if let Slot::Running { pid, .. } = slot {
                tracing::debug!("[WorkerSupervisor] Worker '{}' already running", role);
                return Ok(WorkerStatus::Running { pid: *pid });
            }
        }

        let launch = LaunchSpec {
            program: &spec.program,
            args: &spec.args,
            working_dir: spec.working_dir.as_deref(),
            env: &spec.env,
        };
        let mut child = build_command(launch, &[], self.platform)
            .spawn()
            .map_err(|e| HaruError::process(format!("failed to start worker '{role}': {e}")))?;

        let pid = child.id();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(role.to_string(), "stdout", stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(role.to_string(), "stderr", stderr));
        }

        tracing::info!("[WorkerSupervisor] Started worker '{}' (pid {:?})", role, pid);
        slots.insert(role.to_string(), Slot::Running { child, pid });
        Ok(WorkerStatus::Running { pid })
    }

    async fn stop(&self, role: &str) -> Result<bool> {
        let spec = self.spec(role)?;
        // Held until the process is gone so a concurrent start cannot overlap it.
        let lifecycle = self.lifecycle_lock(role).await;
        let _lifecycle = lifecycle.lock().await;

        let running = {
            let mut slots = self.slots.lock().await;
            let Some(slot) = slots.get_mut(role) else {
                return Ok(false);
            };
            Self::reap(role, slot);
            match std::mem::replace(slot, Slot::Stopped) {
                Slot::Running { child, pid } => Some((child, pid)),
                Slot::Stopped => None,
            }
        };

        match running {
            Some((child, pid)) => {
                self.shutdown(role, spec, child, pid).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn status(&self, role: &str) -> WorkerStatus {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(role) {
            None => WorkerStatus::NotStarted,
            Some(slot) => {
                Self::reap(role, slot);
                match slot {
                    Slot::Running { pid, .. } => WorkerStatus::Running { pid: *pid },
                    Slot::Stopped => WorkerStatus::Stopped,
                }
            }
        }
    }

    async fn stop_all(&self) {
        let roles: Vec<String> = self.slots.lock().await.keys().cloned().collect();
        for role in roles {
            if let Err(e) = self.stop(&role).await {
                tracing::warn!("[WorkerSupervisor] Failed to stop '{}': {}", role, e);
            }
        }
    }
}

/// Logs every line a worker writes until the stream closes.
async fn forward_lines<R>(role: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end();
                if !line.is_empty() {
                    tracing::info!(target: "haru::worker", role = %role, stream, "{}", line);
                }
            }
            Err(e) => {
                tracing::debug!(target: "haru::worker", role = %role, stream, "stream error: {}", e);
                break;
            }
        }
    }
}
