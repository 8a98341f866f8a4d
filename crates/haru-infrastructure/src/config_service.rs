//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the application
//! configuration from the configuration file (~/.config/haru/config.toml).

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use haru_core::config::AppConfig;
use haru_core::{HaruError, Result};

/// Configuration service that loads and caches the application configuration.
///
/// A missing file is created with defaults; a file that fails to parse is
/// reported and replaced by defaults in memory (the file is left untouched).
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Creates a new ConfigService reading `path`.
    ///
    /// The configuration is loaded lazily on first access.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> AppConfig {
        if let Ok(read_lock) = self.config.read()
            && let Some(cached) = read_lock.as_ref()
        {
            return cached.clone();
        }

        let loaded = match Self::load_or_create(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "[ConfigService] Using default configuration, failed to load {:?}: {}",
                    self.path,
                    e
                );
                AppConfig::with_default_workers()
            }
        };

        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    fn load_or_create(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            let default_config = AppConfig::with_default_workers();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            tracing::info!("[ConfigService] Wrote default configuration to {:?}", path);
            return Ok(default_config);
        }

        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(HaruError::from)
    }
}
