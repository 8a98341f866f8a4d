//! One-shot chat worker run as a child process.

use std::io::Write;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use haru_core::chat::{ChatRequest, InvocationOutcome, PlatformFamily, TransportMode, select_transport};
use haru_core::config::ChatConfig;
use haru_core::worker::WorkerInvoker;
use haru_core::Result;
use tempfile::NamedTempFile;

use crate::process::{LaunchSpec, OutputCollector, build_command, kill_tree};

/// How long output pipes may stay open after the worker has exited.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Runs the configured chat worker once per request.
///
/// Small payloads travel as positional arguments
/// (`message`, `history` JSON, `true`/`false`). Larger ones, and every payload
/// on Windows, are written to a temporary JSON document whose location is
/// passed as the single argument `file://<path>`. The document is removed on
/// every exit path.
pub struct ProcessWorkerInvoker {
    config: ChatConfig,
    platform: PlatformFamily,
}

/// Arguments for one invocation plus the request document they point to.
struct PreparedInvocation {
    mode: TransportMode,
    args: Vec<String>,
    request_file: Option<NamedTempFile>,
}

impl ProcessWorkerInvoker {
    pub fn new(config: ChatConfig) -> Self {
        Self::with_platform(config, PlatformFamily::current())
    }

    pub fn with_platform(config: ChatConfig, platform: PlatformFamily) -> Self {
        Self { config, platform }
    }

    fn prepare(&self, request: &ChatRequest) -> Result<PreparedInvocation> {
        let history_json = request.history_json()?;
        let payload_bytes = request.message.len() + history_json.len();
        let mode = select_transport(
            payload_bytes,
            self.config.file_transport_threshold,
            self.platform,
        );

        match mode {
            TransportMode::Arguments => Ok(PreparedInvocation {
                mode,
                args: vec![
                    request.message.clone(),
                    history_json,
                    request.voice_flag().to_string(),
                ],
                request_file: None,
            }),
            TransportMode::File => {
                let mut file = tempfile::Builder::new()
                    .prefix("haru-chat-")
                    .suffix(".json")
                    .tempfile()?;
                serde_json::to_writer(&mut file, request)?;
                file.flush()?;

                let location = format!(
                    "{}{}",
                    self.config.file_scheme_marker,
                    file.path().display()
                );
                Ok(PreparedInvocation {
                    mode,
                    args: vec![location],
                    request_file: Some(file),
                })
            }
        }
    }

    async fn run(&self, args: &[String]) -> InvocationOutcome {
        let spec = LaunchSpec {
            program: &self.config.program,
            args: &self.config.args,
            working_dir: self.config.working_dir.as_deref(),
            env: &self.config.env,
        };

        let mut child = match build_command(spec, args, self.platform).spawn() {
            Ok(child) => child,
            Err(e) => {
                return InvocationOutcome::SpawnFailed(format!(
                    "{}: {}",
                    self.config.program, e
                ));
            }
        };

        let stdout = OutputCollector::spawn(child.stdout.take());
        let stderr = OutputCollector::spawn(child.stderr.take());

        // Only the worker itself is timed; its output is drained afterwards.
        let status = match tokio::time::timeout(self.config.timeout(), child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                stdout.abort();
                stderr.abort();
                return InvocationOutcome::SpawnFailed(format!("failed to wait for worker: {e}"));
            }
            Err(_) => {
                kill_tree(&mut child, self.platform).await;
                stdout.abort();
                stderr.abort();
                return InvocationOutcome::TimedOut;
            }
        };

        let (stdout, stderr) = tokio::join!(
            stdout.finish(OUTPUT_DRAIN_GRACE),
            stderr.finish(OUTPUT_DRAIN_GRACE)
        );
        InvocationOutcome::Completed {
            exit_code: status.code(),
            stdout,
            stderr,
        }
    }
}

#[async_trait]
impl WorkerInvoker for ProcessWorkerInvoker {
    async fn invoke(&self, request: &ChatRequest) -> InvocationOutcome {
        let started = Instant::now();

        let prepared = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::warn!("[ChatWorker] Failed to prepare request: {}", e);
                return InvocationOutcome::SpawnFailed(e.to_string());
            }
        };

        let outcome = self.run(&prepared.args).await;

        if let Some(file) = prepared.request_file {
            let path = file.path().to_path_buf();
            if let Err(e) = file.close() {
                tracing::warn!(
                    "[ChatWorker] Failed to remove request file {:?}: {}",
                    path,
                    e
                );
            }
        }

        match &outcome {
            InvocationOutcome::Completed {
                exit_code, stderr, ..
            } => {
                if !stderr.trim().is_empty() {
                    tracing::debug!(target: "haru::worker", role = "chat", "{}", stderr.trim_end());
                }
                tracing::debug!(
                    "[ChatWorker] Finished via {:?} transport in {:?} (exit {:?})",
                    prepared.mode,
                    started.elapsed(),
                    exit_code
                );
            }
            InvocationOutcome::SpawnFailed(message) => {
                tracing::warn!("[ChatWorker] Failed to start worker: {}", message);
            }
            InvocationOutcome::TimedOut => {
                tracing::warn!(
                    "[ChatWorker] Worker timed out after {:?}, process killed",
                    self.config.timeout()
                );
            }
        }

        outcome
    }
}
