//! Process plumbing shared by the worker invoker and supervisor.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use haru_core::chat::PlatformFamily;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// What to launch and how.
#[derive(Debug, Clone, Copy)]
pub struct LaunchSpec<'a> {
    pub program: &'a str,
    pub args: &'a [String],
    pub working_dir: Option<&'a Path>,
    pub env: &'a BTreeMap<String, String>,
}

/// Builds the command for `spec`, wrapping it in `cmd /C` where the platform
/// starts workers through a shell.
///
/// stdin is closed and both output streams are piped. Dropping the child
/// kills it.
pub fn build_command(spec: LaunchSpec<'_>, extra_args: &[String], platform: PlatformFamily) -> Command {
    let mut cmd = if platform.uses_shell() {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(spec.program);
        c
    } else {
        Command::new(spec.program)
    };

    cmd.args(spec.args)
        .args(extra_args)
        .envs(spec.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = spec.working_dir {
        cmd.current_dir(dir);
    }

    cmd
}

/// Drains a child stream in the background, keeping what has been read so far.
///
/// A descendant that inherited the pipe can hold it open after the worker
/// exits, so the drain may never reach end of stream. [`OutputCollector::finish`]
/// bounds that wait and still returns the bytes already read.
pub struct OutputCollector {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl OutputCollector {
    pub fn spawn<R>(stream: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let task = tokio::spawn(async move {
            let Some(mut stream) = stream else {
                return;
            };
            let mut chunk = [0u8; 4096];
            loop {
                match stream.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => lock(&sink).extend_from_slice(&chunk[..n]),
                    Err(e) => {
                        tracing::debug!("[Process] Output stream closed early: {}", e);
                        break;
                    }
                }
            }
        });
        Self { buffer, task }
    }

    /// Waits up to `grace` for end of stream, then returns the output,
    /// replacing invalid UTF-8.
    pub async fn finish(mut self, grace: Duration) -> String {
        if tokio::time::timeout(grace, &mut self.task).await.is_err() {
            self.task.abort();
            tracing::debug!(
                "[Process] Output stream still open {:?} after exit, keeping partial output",
                grace
            );
        }
        let bytes = lock(&self.buffer);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Stops draining and discards the output.
    pub fn abort(self) {
        self.task.abort();
    }
}

fn lock(buffer: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Asks the process (tree) to exit without forcing it.
///
/// Returns false when no request could be delivered.
pub async fn request_terminate(child: &Child, platform: PlatformFamily) -> bool {
    let Some(pid) = child.id() else {
        return false;
    };

    let mut cmd = match platform {
        PlatformFamily::Windows => {
            let mut c = Command::new("taskkill");
            c.args(["/T", "/PID", &pid.to_string()]);
            c
        }
        PlatformFamily::Unix => {
            let mut c = Command::new("kill");
            c.args(["-TERM", &pid.to_string()]);
            c
        }
    };

    match cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) => status.success(),
        Err(e) => {
            tracing::warn!("[Process] Failed to signal pid {}: {}", pid, e);
            false
        }
    }
}

/// Forcibly terminates the child and, on Windows, every descendant.
///
/// Workers started through `cmd /C` leave the interpreter as a grandchild,
/// which a plain kill of the shell would orphan.
pub async fn kill_tree(child: &mut Child, platform: PlatformFamily) {
    if platform.uses_shell()
        && let Some(pid) = child.id()
    {
        let result = Command::new("taskkill")
            .args(["/T", "/F", "/PID", &pid.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(e) = result {
            tracing::warn!("[Process] taskkill failed for pid {}: {}", pid, e);
        }
    }

    if let Err(e) = child.kill().await {
        tracing::debug!("[Process] Kill after exit or failure: {}", e);
    }
}
