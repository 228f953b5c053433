//! Client configuration.
//!
//! Read from `<config_dir>/config.json`. Every field has a default, so a
//! missing file or a partial one is fine:
//!
//! ```json
//! {
//!   "serverUrl": "http://localhost:8000",
//!   "embeddingModel": "open_ai",
//!   "storageDir": "/home/me/.config/ragchat/storage",
//!   "requestTimeoutSecs": 600
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::remote::{ModelConfig, DEFAULT_EMBEDDING_MODEL};
use crate::session::SessionKind;

const CONFIG_FILE: &str = "config.json";
const STORAGE_DIR: &str = "storage";

/// Error loading or saving the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub server_url: String,
    pub embedding_model: String,
    /// Where chat transcripts are kept. Defaults to `<config_dir>/storage`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            storage_dir: None,
            request_timeout_secs: 600,
        }
    }
}

impl ClientConfig {
    /// Load `config.json` from `config_dir`, or the defaults if it does not
    /// exist.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        let config = serde_json::from_str(&contents)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write `config.json` to `config_dir` (write-then-rename).
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(config_dir)?;

        let file_path = config_dir.join(CONFIG_FILE);
        let temp_path = config_dir.join(format!("{CONFIG_FILE}.tmp"));

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &file_path)?;
        Ok(())
    }

    pub fn storage_dir(&self, config_dir: &Path) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| config_dir.join(STORAGE_DIR))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn model_config(&self, kind: SessionKind) -> ModelConfig {
        ModelConfig::new(self.embedding_model.clone(), kind)
    }
}
