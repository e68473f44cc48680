//! CLI components.

pub mod commands;
pub mod completion;
pub mod repl;
pub mod runner;

pub use completion::{create_reedline, ChatCompleter, ChatHighlighter, ChatPrompt, COMMANDS};
pub use repl::{host_label, CommandResult, Repl, TerminalController};
pub use runner::{print_banner, run_interactive, run_scripted};
