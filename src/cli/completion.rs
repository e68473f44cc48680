//! Reedline completion, prompt and highlighting.
//!
//! Type "/" then Tab to see commands. After `/upload ` Tab completes paths.

use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Completer, Emacs, Highlighter, KeyCode, KeyModifiers, MenuBuilder, Prompt,
    PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline, ReedlineEvent,
    ReedlineMenu, Span, StyledText, Suggestion,
};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// All slash commands with descriptions
pub const COMMANDS: &[(&str, &str)] = &[
    ("/clear", "Clear screen"),
    ("/config", "Show effective settings (/config save writes them)"),
    ("/exit", "Exit"),
    ("/help", "Show help"),
    ("/history", "Show server question history"),
    ("/quit", "Exit"),
    ("/redraw", "Repaint recent messages"),
    ("/status", "Show backend and upload state"),
    ("/upload", "Upload PDFs (paths or globs)"),
];

/// Maximum suggestions shown at once.
const MAX_SUGGESTIONS: usize = 12;

/// Completer for chat commands and upload paths.
#[derive(Clone, Default)]
pub struct ChatCompleter {
    /// Directory relative paths are completed against.
    pub base_dir: Option<PathBuf>,
}

impl ChatCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn complete_path(&self, word: &str, start: usize, pos: usize) -> Vec<Suggestion> {
        let expanded = shellexpand::tilde(word).into_owned();
        let (dir_part, file_prefix) = match expanded.rfind('/') {
            Some(i) => (&expanded[..=i], &expanded[i + 1..]),
            None => ("", expanded.as_str()),
        };

        let dir = if dir_part.is_empty() {
            self.base_dir.clone().unwrap_or_else(|| PathBuf::from("."))
        } else if Path::new(dir_part).is_absolute() {
            PathBuf::from(dir_part)
        } else {
            match &self.base_dir {
                Some(base) => base.join(dir_part),
                None => PathBuf::from(dir_part),
            }
        };

        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut candidates: Vec<(String, bool)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                let keep = name.starts_with(file_prefix)
                    && (!name.starts_with('.') || file_prefix.starts_with('.'))
                    && (is_dir || name.to_lowercase().ends_with(".pdf"));
                keep.then_some((name, is_dir))
            })
            .collect();
        candidates.sort();

        candidates
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(name, is_dir)| Suggestion {
                value: format!("{}{}{}", dir_part, name, if is_dir { "/" } else { "" }),
                description: None,
                extra: None,
                span: Span::new(start, pos),
                append_whitespace: !is_dir,
                style: None,
            })
            .collect()
    }
}

impl Completer for ChatCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        if pos > line.len() {
            return Vec::new();
        }

        let input = &line[..pos];

        if input.is_empty() || !input.starts_with('/') {
            return Vec::new();
        }

        // Command completion (no space yet)
        if !input.contains(' ') {
            let prefix = input.to_lowercase();
            return COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(&prefix))
                .map(|(cmd, desc)| Suggestion {
                    value: cmd.to_string(),
                    description: Some(desc.to_string()),
                    extra: None,
                    span: Span::new(0, pos),
                    append_whitespace: true,
                    style: None,
                })
                .collect();
        }

        // Path completion for the word under the cursor
        if input.starts_with("/upload ") {
            let start = input.rfind(' ').map(|i| i + 1).unwrap_or(pos);
            return self.complete_path(&input[start..], start, pos);
        }

        Vec::new()
    }
}

/// Prompt showing the backend host and whether PDFs are loaded.
pub struct ChatPrompt {
    pub host: String,
    pub uploaded: bool,
}

impl ChatPrompt {
    pub fn new(host: &str, uploaded: bool) -> Self {
        Self {
            host: host.to_string(),
            uploaded,
        }
    }
}

impl Prompt for ChatPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        if self.uploaded {
            Cow::Owned(format!(
                "\x1b[1;33m{}\x1b[0m \x1b[32m● ready\x1b[0m",
                self.host
            ))
        } else {
            Cow::Owned(format!(
                "\x1b[1;33m{}\x1b[0m \x1b[2m○ no pdfs\x1b[0m",
                self.host
            ))
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed(" › ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(&self, hs: PromptHistorySearch) -> Cow<'_, str> {
        let prefix = match hs.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}search: {}) ", prefix, hs.term))
    }
}

/// Highlights known commands; unknown ones are shown in yellow.
#[derive(Clone)]
pub struct ChatHighlighter;

impl Highlighter for ChatHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();

        if line.starts_with('/') {
            let cmd_end = line.find(' ').unwrap_or(line.len());
            let cmd = &line[..cmd_end];
            let is_valid = COMMANDS.iter().any(|(c, _)| *c == cmd);

            if is_valid {
                styled.push((Style::new().fg(Color::Cyan).bold(), cmd.to_string()));
            } else {
                styled.push((Style::new().fg(Color::Yellow), cmd.to_string()));
            }

            if cmd_end < line.len() {
                styled.push((Style::default(), line[cmd_end..].to_string()));
            }
        } else {
            styled.push((Style::default(), line.to_string()));
        }

        styled
    }
}

/// Create reedline with Tab-triggered completion menu
pub fn create_reedline(completer: ChatCompleter) -> Reedline {
    let completion_menu = Box::new(
        ColumnarMenu::default()
            .with_name("completion_menu")
            .with_columns(1)
            .with_column_padding(2)
            .with_text_style(Style::new().fg(Color::Default))
            .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan))
            .with_description_text_style(Style::new().fg(Color::DarkGray)),
    );

    let mut keybindings = reedline::default_emacs_keybindings();

    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );

    keybindings.add_binding(
        KeyModifiers::SHIFT,
        KeyCode::BackTab,
        ReedlineEvent::MenuPrevious,
    );

    Reedline::create()
        .with_completer(Box::new(completer))
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_quick_completions(true)
        .with_partial_completions(true)
        .with_highlighter(Box::new(ChatHighlighter))
        .with_edit_mode(Box::new(Emacs::new(keybindings)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn values(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.value.as_str()).collect()
    }

    #[test]
    fn test_command_prefix() {
        let mut c = ChatCompleter::new();
        let s = c.complete("/h", 2);
        assert_eq!(values(&s), vec!["/help", "/history"]);
        assert_eq!(s[0].span, Span::new(0, 2));
    }

    #[test]
    fn test_plain_text_has_no_suggestions() {
        let mut c = ChatCompleter::new();
        assert!(c.complete("what is", 7).is_empty());
        assert!(c.complete("", 0).is_empty());
        assert!(c.complete("/help", 99).is_empty());
    }

    #[test]
    fn test_upload_completes_pdfs_and_dirs() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("report.pdf"), b"%PDF").unwrap();
        std::fs::write(temp.path().join("readme.txt"), b"x").unwrap();
        std::fs::create_dir(temp.path().join("reports")).unwrap();
        std::fs::write(temp.path().join(".rc.pdf"), b"%PDF").unwrap();

        let mut c = ChatCompleter::with_base_dir(temp.path());
        let line = "/upload re";
        let s = c.complete(line, line.len());
        assert_eq!(values(&s), vec!["report.pdf", "reports/"]);
        assert_eq!(s[0].span, Span::new(8, line.len()));
        assert!(s[0].append_whitespace);
        assert!(!s[1].append_whitespace);
    }

    #[test]
    fn test_upload_completes_inside_subdir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("docs")).unwrap();
        std::fs::write(temp.path().join("docs/a.pdf"), b"%PDF").unwrap();

        let mut c = ChatCompleter::with_base_dir(temp.path());
        let line = "/upload x.pdf docs/";
        let s = c.complete(line, line.len());
        assert_eq!(values(&s), vec!["docs/a.pdf"]);
        assert_eq!(s[0].span.start, 14);
    }

    #[test]
    fn test_prompt_shows_upload_state() {
        let idle = ChatPrompt::new("127.0.0.1:8000", false);
        assert!(idle.render_prompt_left().contains("○ no pdfs"));

        let ready = ChatPrompt::new("127.0.0.1:8000", true);
        assert!(ready.render_prompt_left().contains("● ready"));
    }

    #[test]
    fn test_highlighter_marks_unknown_commands() {
        let h = ChatHighlighter;
        let known = h.highlight("/upload a.pdf", 0);
        assert_eq!(known.buffer[0].0, Style::new().fg(Color::Cyan).bold());
        assert_eq!(known.buffer[1].1, " a.pdf");

        let unknown = h.highlight("/nope", 0);
        assert_eq!(unknown.buffer[0].0, Style::new().fg(Color::Yellow));
    }
}
