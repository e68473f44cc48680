//! Chat history height layout.
//!
//! The history panel gets whatever the container has left after the
//! controls panel (input line, loading indicator). Recomputed on startup and
//! on every resize; the computation is pure and idempotent.

use std::fmt;

/// Result of one layout pass, in terminal rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryHeight {
    /// Height of the whole chat container.
    pub container: u16,
    /// Measured height of the controls panel.
    pub controls: u16,
    /// Maximum height granted to the history panel.
    pub max: u16,
}

impl HistoryHeight {
    /// Whether the controls fit inside the container.
    pub fn controls_fit(&self) -> bool {
        self.controls <= self.container
    }
}

impl fmt::Display for HistoryHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows ({} - {} for controls)",
            self.max, self.container, self.controls
        )
    }
}

/// `container - controls`, saturating at zero.
pub fn history_max_height(container: u16, controls: u16) -> HistoryHeight {
    HistoryHeight {
        container,
        controls,
        max: container.saturating_sub(controls),
    }
}

/// Rows `text` occupies in a terminal `width` columns wide, counting soft
/// wraps. Empty lines still take a row.
pub fn text_rows(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = text
        .split('\n')
        .map(|line| line.chars().count().div_ceil(width).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Fallback when stdout is not a terminal.
pub const DEFAULT_TERMINAL_SIZE: (u16, u16) = (80, 24);

/// `(columns, rows)` of the attached terminal.
pub fn terminal_dimensions() -> (u16, u16) {
    match terminal_size::terminal_size() {
        Some((terminal_size::Width(w), terminal_size::Height(h))) if w > 0 && h > 0 => (w, h),
        _ => DEFAULT_TERMINAL_SIZE,
    }
}
