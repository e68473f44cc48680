//! Output of the informational REPL commands.
//!
//! Each function builds the text a command prints so it can be checked
//! without a terminal.

use std::path::Path;

use crate::api::HistoryEntry;
use crate::config::ClientSettings;
use crate::layout::HistoryHeight;

use super::completion::COMMANDS;

/// `/help`.
pub fn help_text() -> String {
    let mut out = String::from("\n\x1b[1mCommands\x1b[0m\n\n");
    for (cmd, desc) in COMMANDS {
        let usage = if *cmd == "/upload" {
            "/upload <files>"
        } else {
            cmd
        };
        out.push_str(&format!("  \x1b[36m{:<18}\x1b[0m {}\n", usage, desc));
    }
    out.push_str("\n  Anything else is sent as a question about the uploaded PDFs.\n");
    out.push_str("  Globs work with /upload, e.g. \x1b[36m/upload ~/papers/*.pdf\x1b[0m\n");
    out
}

/// Snapshot shown by `/status`.
#[derive(Debug, Clone)]
pub struct StatusInfo<'a> {
    pub base_url: &'a str,
    pub uploaded: bool,
    pub message_count: usize,
    pub history_height: Option<HistoryHeight>,
    pub polling: bool,
}

/// `/status`.
pub fn status_text(info: &StatusInfo<'_>) -> String {
    let mut out = String::from("\n\x1b[1mStatus\x1b[0m\n\n");
    out.push_str(&format!("  Backend:     \x1b[33m{}\x1b[0m\n", info.base_url));
    out.push_str(&format!(
        "  PDFs:        {}\n",
        if info.uploaded {
            "\x1b[32muploaded\x1b[0m"
        } else {
            "\x1b[2mnone yet\x1b[0m"
        }
    ));
    out.push_str(&format!(
        "  Polling:     {}\n",
        if info.polling { "on" } else { "off" }
    ));
    out.push_str(&format!("  Messages:    {}\n", info.message_count));
    if let Some(height) = info.history_height {
        out.push_str(&format!("  History:     {}\n", height));
    }
    out
}

/// `/history`.
pub fn history_text(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No questions answered yet.".to_string();
    }

    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "\x1b[1;36m{}. {}\x1b[0m\n   {}\n",
            i + 1,
            entry.question,
            entry.answer.replace('\n', "\n   ")
        ));
    }
    out
}

/// `/config`.
pub fn config_text(settings: &ClientSettings) -> String {
    match settings.to_pretty_json() {
        Ok(json) => json,
        Err(e) => format!("Failed to render settings: {}", e),
    }
}

/// `/config save`: write the effective settings to `path`.
pub fn save_settings(settings: &ClientSettings, path: &Path) -> String {
    match settings.save_to_path(path) {
        Ok(()) => format!("\x1b[32m✓ Settings saved to {}\x1b[0m", path.display()),
        Err(e) => format!("\x1b[31m✗ Failed to save settings: {}\x1b[0m", e),
    }
}
