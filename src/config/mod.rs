//! Configuration management.

mod settings;
mod xdg;

pub use settings::{ClientSettings, SettingsError, DEFAULT_BASE_URL};
pub use xdg::XdgDirs;
