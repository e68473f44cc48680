//! XDG Base Directory support.

use std::path::PathBuf;

const APP_DIR: &str = "pdfchat";
const SETTINGS_FILE: &str = "settings.json";
const HISTORY_FILE: &str = "history.txt";

/// XDG directory paths for pdfchat.
#[derive(Debug, Clone)]
pub struct XdgDirs {
    /// Config directory (~/.config/pdfchat or XDG_CONFIG_HOME/pdfchat)
    pub config: PathBuf,
    /// State directory (~/.local/state/pdfchat or XDG_STATE_HOME/pdfchat)
    pub state: PathBuf,
}

impl XdgDirs {
    /// Get XDG directories, respecting environment variables.
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            config: std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.join(".config"))
                .join(APP_DIR),
            state: std::env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.join(".local/state"))
                .join(APP_DIR),
        }
    }

    /// Ensure all directories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.config, &self.state] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Default settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config.join(SETTINGS_FILE)
    }

    /// Line-editor history file.
    pub fn history_file(&self) -> PathBuf {
        self.state.join(HISTORY_FILE)
    }
}

impl Default for XdgDirs {
    fn default() -> Self {
        Self::new()
    }
}
