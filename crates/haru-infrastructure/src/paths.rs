//! Unified path management for Haru configuration and data files.
//!
//! This ensures consistency across all platforms (Linux, macOS, Windows).

use std::path::{Path, PathBuf};

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform configuration directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for Haru.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/haru/              # Base directory (platform config dir)
/// ├── config.toml              # Application configuration
/// ├── sessions/                # One JSONL log per session
/// │   └── session_<ts>_<suffix>.jsonl
/// └── logs/                    # Application logs
///     └── haru-desktop.log.YYYY-MM-DD
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaruPaths {
    base_dir: PathBuf,
}

impl HaruPaths {
    const APP_DIR: &'static str = "haru";

    /// Resolves the platform configuration directory (e.g. `~/.config/haru`).
    pub fn default_location() -> Result<Self, PathError> {
        let base_dir = dirs::config_dir()
            .ok_or(PathError::ConfigDirNotFound)?
            .join(Self::APP_DIR);
        Ok(Self { base_dir })
    }

    /// Uses `base_dir` as the root for every Haru path.
    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the path to the main configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    /// Returns the directory holding the session logs.
    pub fn sessions_dir(&self) -> PathBuf {
        self.base_dir.join("sessions")
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }
}
