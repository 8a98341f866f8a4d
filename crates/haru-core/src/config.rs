//! Application configuration model (`config.toml`).
//!
//! Every section and field has a default so a partial or missing file still
//! yields a usable configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::{FILE_SCHEME_MARKER, FILE_TRANSPORT_THRESHOLD_BYTES};
use crate::display::Size;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub window: GeometryConfig,
    pub chat: ChatConfig,
    #[serde(rename = "worker")]
    pub workers: Vec<WorkerSpec>,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Default configuration plus the inference service the original app ships with.
    pub fn with_default_workers() -> Self {
        Self {
            workers: vec![WorkerSpec::inference_service()],
            ..Self::default()
        }
    }

    pub fn worker(&self, role: &str) -> Option<&WorkerSpec> {
        self.workers.iter().find(|spec| spec.role == role)
    }
}

/// Panel and indicator geometry.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeometryConfig {
    pub panel_width: i32,
    pub panel_height: i32,
    pub panel_min_width: i32,
    pub panel_min_height: i32,
    pub panel_resizable: bool,
    pub indicator_width: i32,
    pub indicator_height: i32,
    /// Horizontal gap between the panel's right edge and the indicator.
    pub indicator_margin: i32,
    /// Vertical offset of the indicator relative to the panel's top edge.
    pub indicator_vertical_offset: i32,
    /// Minimum distance kept from a display's left/top edges when clamping.
    pub edge_inset: i32,
    /// Time the indicator gets to paint before the panel is hidden.
    pub settle_delay_ms: u64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            panel_width: 400,
            panel_height: 600,
            panel_min_width: 200,
            panel_min_height: 300,
            panel_resizable: true,
            indicator_width: 80,
            indicator_height: 80,
            indicator_margin: 12,
            indicator_vertical_offset: 40,
            edge_inset: 8,
            settle_delay_ms: 80,
        }
    }
}

impl GeometryConfig {
    pub fn panel_size(&self) -> Size {
        Size::new(self.panel_width, self.panel_height)
    }

    pub fn panel_min_size(&self) -> Size {
        Size::new(self.panel_min_width, self.panel_min_height)
    }

    pub fn indicator_size(&self) -> Size {
        Size::new(self.indicator_width, self.indicator_height)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// One-shot chat worker invocation.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Extra environment for the worker. Defaults force UTF-8 stdio.
    pub env: BTreeMap<String, String>,
    /// Payload size (bytes) at which file transport is used.
    pub file_transport_threshold: usize,
    pub timeout_secs: u64,
    pub file_scheme_marker: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["python/chat_handler.py".to_string()],
            working_dir: None,
            env: utf8_env(),
            file_transport_threshold: FILE_TRANSPORT_THRESHOLD_BYTES,
            timeout_secs: 60,
            file_scheme_marker: FILE_SCHEME_MARKER.to_string(),
        }
    }
}

impl ChatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A long-running background worker.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct WorkerSpec {
    pub role: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default = "utf8_env")]
    pub env: BTreeMap<String, String>,
    /// Start at application init.
    #[serde(default = "default_true")]
    pub autostart: bool,
    /// How long a graceful stop may take before the process tree is killed.
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

impl WorkerSpec {
    pub fn new(role: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            role: role.into(),
            program: program.into(),
            args,
            working_dir: None,
            env: utf8_env(),
            autostart: true,
            stop_grace_ms: default_stop_grace_ms(),
        }
    }

    /// The local inference HTTP service.
    pub fn inference_service() -> Self {
        Self::new(
            "inference",
            "python",
            vec!["python/inference_service.py".to_string()],
        )
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Write a daily-rotated log file under the logs directory.
    pub file_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: true,
        }
    }
}

fn utf8_env() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("PYTHONIOENCODING".to_string(), "utf-8".to_string()),
        ("PYTHONUTF8".to_string(), "1".to_string()),
    ])
}

fn default_true() -> bool {
    true
}

fn default_stop_grace_ms() -> u64 {
    3000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.chat.file_transport_threshold, 2000);
        assert_eq!(config.chat.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [window]
            panel_width = 500

            [chat]
            timeout_secs = 5

            [[worker]]
            role = "tts"
            program = "python"
            args = ["python/tts.py"]
            autostart = false
            "#,
        )
        .unwrap();

        assert_eq!(config.window.panel_width, 500);
        assert_eq!(config.window.panel_height, 600);
        assert_eq!(config.chat.timeout_secs, 5);
        assert_eq!(config.chat.program, "python");

        let tts = config.worker("tts").unwrap();
        assert!(!tts.autostart);
        assert_eq!(tts.stop_grace(), Duration::from_millis(3000));
        assert_eq!(tts.env.get("PYTHONIOENCODING").map(String::as_str), Some("utf-8"));
    }

    #[test]
    fn test_defaults_roundtrip_through_toml() {
        let config = AppConfig::with_default_workers();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
