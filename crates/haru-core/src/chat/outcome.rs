//! Result of a one-shot worker invocation and its acceptance rules.

/// Sequences that show the worker's output was decoded with the wrong
/// encoding somewhere between producer and consumer.
pub const MANGLED_TEXT_SENTINELS: &[&str] = &["\u{FFFD}", "锟斤拷"];

/// Raw result of running the worker once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// The process ran to completion.
    Completed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The process could not be started.
    SpawnFailed(String),
    /// The process exceeded the timeout and was killed.
    TimedOut,
}

/// Why an invocation's output was not used as the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NonZeroExit(Option<i32>),
    EmptyOutput,
    SpawnFailed(String),
    TimedOut,
    MangledText,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NonZeroExit(Some(code)) => write!(f, "worker exited with status {code}"),
            RejectReason::NonZeroExit(None) => write!(f, "worker terminated by signal"),
            RejectReason::EmptyOutput => write!(f, "worker produced no output"),
            RejectReason::SpawnFailed(message) => write!(f, "worker failed to start: {message}"),
            RejectReason::TimedOut => write!(f, "worker timed out"),
            RejectReason::MangledText => write!(f, "worker output has mangled text"),
        }
    }
}

impl InvocationOutcome {
    /// Returns the trimmed reply, or the reason it must be replaced.
    pub fn accept(&self) -> Result<String, RejectReason> {
        match self {
            InvocationOutcome::SpawnFailed(message) => {
                Err(RejectReason::SpawnFailed(message.clone()))
            }
            InvocationOutcome::TimedOut => Err(RejectReason::TimedOut),
            InvocationOutcome::Completed {
                exit_code, stdout, ..
            } => {
                if *exit_code != Some(0) {
                    return Err(RejectReason::NonZeroExit(*exit_code));
                }
                let reply = stdout.trim();
                if reply.is_empty() {
                    return Err(RejectReason::EmptyOutput);
                }
                if MANGLED_TEXT_SENTINELS
                    .iter()
                    .any(|sentinel| reply.contains(sentinel))
                {
                    return Err(RejectReason::MangledText);
                }
                Ok(reply.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(code: i32, stdout: &str) -> InvocationOutcome {
        InvocationOutcome::Completed {
            exit_code: Some(code),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_accepts_clean_output() {
        assert_eq!(completed(0, "  你好呀\n").accept(), Ok("你好呀".to_string()));
    }

    #[test]
    fn test_rejects_non_zero_exit() {
        assert_eq!(
            completed(2, "partial").accept(),
            Err(RejectReason::NonZeroExit(Some(2)))
        );
    }

    #[test]
    fn test_rejects_blank_output() {
        assert_eq!(completed(0, " \n\t").accept(), Err(RejectReason::EmptyOutput));
    }

    #[test]
    fn test_rejects_mangled_text() {
        assert_eq!(
            completed(0, "hello \u{FFFD}\u{FFFD}").accept(),
            Err(RejectReason::MangledText)
        );
        assert_eq!(
            completed(0, "锟斤拷锟斤拷").accept(),
            Err(RejectReason::MangledText)
        );
    }

    #[test]
    fn test_rejects_spawn_failure_and_timeout() {
        assert!(matches!(
            InvocationOutcome::SpawnFailed("nope".into()).accept(),
            Err(RejectReason::SpawnFailed(_))
        ));
        assert_eq!(InvocationOutcome::TimedOut.accept(), Err(RejectReason::TimedOut));
    }
}
