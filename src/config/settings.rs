//! Client settings stored as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::XdgDirs;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Settings file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Effective client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Root URL of the question-answering service.
    pub base_url: String,
    /// Poll upload status while an upload is in flight.
    pub poll_status: bool,
    pub poll_interval_ms: u64,
    /// Delay before scrolling to a newly added message.
    pub scroll_delay_ms: u64,
    /// Line-editor history entries kept on disk.
    pub history_size: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_status: true,
            poll_interval_ms: 1000,
            scroll_delay_ms: 100,
            history_size: 500,
        }
    }
}

impl ClientSettings {
    /// Load from an explicit path, or from the XDG settings file when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let path = XdgDirs::new().settings_file();
                if path.exists() {
                    Self::load_from_path(&path)
                } else {
                    debug!(path = %path.display(), "No settings file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load settings from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Err(SettingsError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: ClientSettings = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Save settings to a specific path.
    pub fn save_to_path(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_pretty_json()?)?;
        Ok(())
    }

    /// Apply command-line overrides.
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        no_poll: bool,
        poll_interval_ms: Option<u64>,
    ) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if no_poll {
            self.poll_status = false;
        }
        if let Some(ms) = poll_interval_ms {
            self.poll_interval_ms = ms;
        }
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingsError::Invalid(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_pretty_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
