//! Transport selection for one-shot worker invocations.
//!
//! Short requests go inline as process arguments; large requests, and every
//! request on platforms whose argument quoting is unsafe, go through a
//! temporary JSON file whose path is the only argument.

use serde::{Deserialize, Serialize};

/// Payload size at which file transport takes over.
pub const FILE_TRANSPORT_THRESHOLD_BYTES: usize = 2000;

/// Prefix marking a file-transport argument.
pub const FILE_SCHEME_MARKER: &str = "file://";

/// How the request reaches the worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// `message`, history JSON and the voice flag as positional arguments.
    Arguments,
    /// A single `file://<path>` argument pointing at the request document.
    File,
}

/// Host platform family, as far as process invocation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    /// Workers run through `cmd /C`; inline arguments are re-quoted by the
    /// shell and mangle non-ASCII text.
    Windows,
    Unix,
}

impl PlatformFamily {
    pub fn current() -> Self {
        if cfg!(windows) {
            PlatformFamily::Windows
        } else {
            PlatformFamily::Unix
        }
    }

    /// Whether invocations always need file transport.
    pub fn requires_file_transport(&self) -> bool {
        matches!(self, PlatformFamily::Windows)
    }

    /// Whether workers are started through an intermediary shell.
    pub fn uses_shell(&self) -> bool {
        matches!(self, PlatformFamily::Windows)
    }
}

/// Picks the transport for a payload of `payload_bytes`.
pub fn select_transport(
    payload_bytes: usize,
    threshold: usize,
    platform: PlatformFamily,
) -> TransportMode {
    if platform.requires_file_transport() || payload_bytes >= threshold {
        TransportMode::File
    } else {
        TransportMode::Arguments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_payload_uses_arguments() {
        let mode = select_transport(10, FILE_TRANSPORT_THRESHOLD_BYTES, PlatformFamily::Unix);
        assert_eq!(mode, TransportMode::Arguments);

        let mode = select_transport(
            FILE_TRANSPORT_THRESHOLD_BYTES - 1,
            FILE_TRANSPORT_THRESHOLD_BYTES,
            PlatformFamily::Unix,
        );
        assert_eq!(mode, TransportMode::Arguments);
    }

    #[test]
    fn test_threshold_and_above_use_file() {
        for size in [
            FILE_TRANSPORT_THRESHOLD_BYTES,
            FILE_TRANSPORT_THRESHOLD_BYTES + 1,
            FILE_TRANSPORT_THRESHOLD_BYTES * 50,
        ] {
            let mode = select_transport(size, FILE_TRANSPORT_THRESHOLD_BYTES, PlatformFamily::Unix);
            assert_eq!(mode, TransportMode::File, "size {size}");
        }
    }

    #[test]
    fn test_windows_always_uses_file() {
        let mode = select_transport(1, FILE_TRANSPORT_THRESHOLD_BYTES, PlatformFamily::Windows);
        assert_eq!(mode, TransportMode::File);
    }
}
