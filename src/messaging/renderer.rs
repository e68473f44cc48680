//! Terminal rendering of bus messages.
//!
//! [`MessageFormatter`] turns messages into styled strings. [`TerminalRenderer`]
//! writes them either straight to stdout (scripted runs, with a live spinner
//! and in-place placeholder removal) or through reedline's external printer
//! while the REPL owns the prompt (append-only).

use super::{BusError, Message, MessageLevel, MessageReceiver, Spinner, SpinnerConfig, SpinnerHandle};
use crate::api::UploadProgress;
use crate::chat::{ChatMessage, MessageId, Role};
use crate::layout::{terminal_dimensions, text_rows};
use crossterm::{
    cursor::MoveUp,
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use reedline::ExternalPrinter;
use std::io::{self, stdout, Write};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};
use tracing::{debug, warn};

const CODE_THEME: &str = "base16-ocean.dark";

/// Render style configuration.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub user_color: Color,
    pub system_color: Color,
    pub info_color: Color,
    pub warning_color: Color,
    pub error_color: Color,
    pub accent_color: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            user_color: Color::Cyan,
            system_color: Color::Green,
            info_color: Color::White,
            warning_color: Color::Yellow,
            error_color: Color::Red,
            accent_color: Color::Yellow,
        }
    }
}

/// Builds the styled text for each message kind.
pub struct MessageFormatter {
    style: RenderStyle,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl MessageFormatter {
    pub fn new() -> Self {
        Self::with_style(RenderStyle::default())
    }

    pub fn with_style(style: RenderStyle) -> Self {
        Self {
            style,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// A chat bubble followed by its blank separator row.
    pub fn chat(&self, message: &ChatMessage) -> io::Result<String> {
        let mut out = Vec::new();
        match message.role {
            Role::User => {
                queue!(
                    out,
                    SetForegroundColor(self.style.user_color),
                    SetAttribute(Attribute::Bold),
                    Print("› "),
                    SetAttribute(Attribute::Reset),
                    ResetColor,
                    Print(&message.text),
                    Print("\n")
                )?;
            }
            Role::Assistant if message.placeholder => {
                queue!(
                    out,
                    SetAttribute(Attribute::Dim),
                    Print("… "),
                    Print(&message.text),
                    SetAttribute(Attribute::Reset),
                    Print("\n")
                )?;
            }
            Role::Assistant => self.markdown(&mut out, &message.text)?,
            Role::System => self.prefixed(&mut out, self.style.system_color, "✓ ", &message.text)?,
            Role::Error => self.prefixed(&mut out, self.style.error_color, "✗ ", &message.text)?,
        }
        queue!(out, Print("\n"))?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// A notice outside the chat history.
    pub fn text(&self, level: MessageLevel, text: &str) -> io::Result<String> {
        let (color, prefix) = match level {
            MessageLevel::Info => (self.style.info_color, ""),
            MessageLevel::Success => (self.style.system_color, "✓ "),
            MessageLevel::Warning => (self.style.warning_color, "⚠ "),
            MessageLevel::Error => (self.style.error_color, "✗ "),
        };
        let mut out = Vec::new();
        self.prefixed(&mut out, color, prefix, text)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// One-line loading notice for append-only output.
    pub fn loading(&self, label: &str) -> String {
        format!("⏳ {}", label)
    }

    pub fn divider(&self, width: u16) -> String {
        "─".repeat(usize::from(width.clamp(10, 80)))
    }

    fn prefixed(&self, out: &mut Vec<u8>, color: Color, prefix: &str, text: &str) -> io::Result<()> {
        queue!(
            out,
            SetForegroundColor(color),
            Print(prefix),
            Print(text),
            ResetColor,
            Print("\n")
        )
    }

    /// Light markdown: headers, lists, quotes, rules, inline styles and
    /// fenced code blocks.
    fn markdown(&self, out: &mut Vec<u8>, content: &str) -> io::Result<()> {
        let mut code_lang: Option<String> = None;
        let mut code_buffer = String::new();

        for line in content.lines() {
            if let Some(rest) = line.trim_start().strip_prefix("```") {
                match code_lang.take() {
                    Some(lang) => {
                        self.code_block(out, &lang, &code_buffer)?;
                        code_buffer.clear();
                    }
                    None => code_lang = Some(rest.trim().to_string()),
                }
            } else if code_lang.is_some() {
                code_buffer.push_str(line);
                code_buffer.push('\n');
            } else {
                self.markdown_line(out, line)?;
            }
        }

        if let Some(lang) = code_lang {
            self.code_block(out, &lang, &code_buffer)?;
        }
        Ok(())
    }

    fn markdown_line(&self, out: &mut Vec<u8>, line: &str) -> io::Result<()> {
        let heading = line.trim_start_matches('#');
        if heading.len() < line.len() && line.len() - heading.len() <= 3 {
            if let Some(title) = heading.strip_prefix(' ') {
                return queue!(
                    out,
                    SetForegroundColor(Color::Cyan),
                    SetAttribute(Attribute::Bold),
                    Print(title),
                    SetAttribute(Attribute::Reset),
                    Print("\n")
                );
            }
        }

        if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            queue!(out, SetForegroundColor(self.style.accent_color), Print("• "), ResetColor)?;
            self.inline(out, rest)?;
            return queue!(out, Print("\n"));
        }

        let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 {
            if let Some(rest) = line[digits..].strip_prefix(". ") {
                queue!(
                    out,
                    SetForegroundColor(self.style.accent_color),
                    Print(&line[..digits + 2]),
                    ResetColor
                )?;
                self.inline(out, rest)?;
                return queue!(out, Print("\n"));
            }
        }

        if let Some(rest) = line.strip_prefix("> ") {
            queue!(out, SetForegroundColor(Color::DarkGrey), Print("│ "), ResetColor)?;
            self.inline(out, rest)?;
            return queue!(out, Print("\n"));
        }

        if matches!(line, "---" | "***" | "___") {
            return queue!(
                out,
                SetForegroundColor(Color::DarkGrey),
                Print("─".repeat(40)),
                ResetColor,
                Print("\n")
            );
        }

        self.inline(out, line)?;
        queue!(out, Print("\n"))
    }

    /// Inline `code`, **bold**, *italic* and [links](url).
    fn inline(&self, out: &mut Vec<u8>, text: &str) -> io::Result<()> {
        let mut rest = text;
        let mut plain = String::new();

        while let Some(c) = rest.chars().next() {
            let after = &rest[c.len_utf8()..];
            let styled = match c {
                '`' => after
                    .find('`')
                    .map(|end| (Style::Code, &after[..end], &after[end + 1..])),
                '*' | '_' if after.starts_with(c) => {
                    let inner = &after[1..];
                    let marker = if c == '*' { "**" } else { "__" };
                    inner
                        .find(marker)
                        .map(|end| (Style::Bold, &inner[..end], &inner[end + 2..]))
                }
                '*' | '_' => after
                    .find(c)
                    .filter(|&end| end > 0)
                    .map(|end| (Style::Italic, &after[..end], &after[end + 1..])),
                '[' => after.find("](").and_then(|mid| {
                    let url = &after[mid + 2..];
                    url.find(')')
                        .map(|end| (Style::Link, &after[..mid], &url[end + 1..]))
                }),
                _ => None,
            };

            match styled {
                Some((style, span, remainder)) => {
                    if !plain.is_empty() {
                        queue!(out, Print(&plain))?;
                        plain.clear();
                    }
                    style.apply(out)?;
                    queue!(out, Print(span), SetAttribute(Attribute::Reset), ResetColor)?;
                    rest = remainder;
                }
                None => {
                    plain.push(c);
                    rest = after;
                }
            }
        }

        if !plain.is_empty() {
            queue!(out, Print(&plain))?;
        }
        Ok(())
    }

    fn code_block(&self, out: &mut Vec<u8>, lang: &str, code: &str) -> io::Result<()> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        queue!(
            out,
            SetForegroundColor(Color::DarkGrey),
            Print(format!("┌── {}\n", if lang.is_empty() { "code" } else { lang })),
            ResetColor
        )?;

        let mut highlighter = self
            .theme_set
            .themes
            .get(CODE_THEME)
            .map(|theme| HighlightLines::new(syntax, theme));

        for line in LinesWithEndings::from(code) {
            queue!(out, SetForegroundColor(Color::DarkGrey), Print("│ "), ResetColor)?;
            let highlighted = highlighter
                .as_mut()
                .and_then(|h| h.highlight_line(line, &self.syntax_set).ok())
                .map(|ranges| as_24_bit_terminal_escaped(&ranges[..], false));
            match highlighted {
                Some(escaped) => queue!(out, Print(escaped), ResetColor)?,
                None => queue!(out, Print(line))?,
            }
        }

        queue!(out, SetForegroundColor(Color::DarkGrey), Print("└──\n"), ResetColor)
    }
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Inline span styles.
enum Style {
    Code,
    Bold,
    Italic,
    Link,
}

impl Style {
    fn apply(&self, out: &mut Vec<u8>) -> io::Result<()> {
        match self {
            Style::Code => queue!(out, SetForegroundColor(Color::Magenta)),
            Style::Bold => queue!(out, SetAttribute(Attribute::Bold)),
            Style::Italic => queue!(out, SetAttribute(Attribute::Italic)),
            Style::Link => queue!(
                out,
                SetForegroundColor(Color::Blue),
                SetAttribute(Attribute::Underlined)
            ),
        }
    }
}

/// Progress detail shown next to the loading indicator.
pub fn progress_detail(progress: &UploadProgress) -> String {
    if progress.current_file.is_empty() {
        progress.counter_line()
    } else {
        format!("{} · {}", progress.current_file_line(), progress.counter_line())
    }
}

/// Terminal rows taken by already formatted output, ignoring escape codes.
pub fn rendered_rows(formatted: &str, width: u16) -> u16 {
    let visible = strip_ansi(formatted);
    let trimmed = visible.strip_suffix('\n').unwrap_or(&visible);
    text_rows(trimmed, width)
}

fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // CSI sequences end at the first byte in '@'..='~'
            if chars.next() == Some('[') {
                for nc in chars.by_ref() {
                    if ('@'..='~').contains(&nc) {
                        break;
                    }
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Where rendered output goes.
pub enum RenderTarget {
    /// Direct stdout, nothing else is drawing.
    Stdout,
    /// Through reedline while it owns the prompt line.
    Printer(ExternalPrinter<String>),
}

/// Mutable rendering state for one run loop.
#[derive(Default)]
struct RenderState {
    spinner: Option<SpinnerHandle>,
    /// Last bubble written to stdout and the rows it took.
    last_bubble: Option<(MessageId, u16)>,
    last_progress: Option<String>,
}

/// Renders bus messages to the terminal.
pub struct TerminalRenderer {
    formatter: MessageFormatter,
    target: RenderTarget,
}

impl TerminalRenderer {
    /// Render straight to stdout.
    pub fn stdout() -> Self {
        Self {
            formatter: MessageFormatter::new(),
            target: RenderTarget::Stdout,
        }
    }

    /// Render through a reedline external printer.
    pub fn printer(printer: ExternalPrinter<String>) -> Self {
        Self {
            formatter: MessageFormatter::new(),
            target: RenderTarget::Printer(printer),
        }
    }

    pub fn with_formatter(mut self, formatter: MessageFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Consume messages until every sender is gone.
    pub async fn run_loop(self, mut receiver: MessageReceiver) {
        let mut state = RenderState::default();

        loop {
            match receiver.recv().await {
                Ok(message) => {
                    if let Err(e) = self.render(&message, &mut state).await {
                        debug!(error = %e, "Failed to render message");
                    }
                }
                Err(BusError::Lagged(n)) => {
                    warn!(skipped = n, "Renderer fell behind, messages dropped");
                }
                Err(BusError::Closed) => break,
            }
        }

        if let Some(spinner) = state.spinner.take() {
            spinner.stop().await;
        }
        let _ = stdout().flush();
    }

    async fn render(&self, message: &Message, state: &mut RenderState) -> io::Result<()> {
        match &self.target {
            RenderTarget::Stdout => self.render_stdout(message, state).await,
            RenderTarget::Printer(printer) => {
                if let Some(line) = self.printer_line(message, state)? {
                    if printer.print(line).is_err() {
                        debug!("External printer disconnected");
                    }
                }
                Ok(())
            }
        }
    }

    /// Append-only rendering. Removals cannot be drawn and are skipped.
    fn printer_line(&self, message: &Message, state: &mut RenderState) -> io::Result<Option<String>> {
        let line = match message {
            Message::Chat(chat) => Some(self.formatter.chat(chat)?.trim_end().to_string()),
            Message::Retract(_) => None,
            Message::Loading(loading) if loading.visible => {
                state.last_progress = None;
                Some(self.formatter.loading(&loading.label))
            }
            Message::Loading(_) => None,
            Message::Progress(progress) => {
                let detail = progress_detail(progress);
                if state.last_progress.as_deref() == Some(detail.as_str()) {
                    None
                } else {
                    state.last_progress = Some(detail.clone());
                    Some(format!("  {}", detail))
                }
            }
            Message::Text(text) => Some(self.formatter.text(text.level, &text.text)?.trim_end().to_string()),
            Message::Divider => Some(self.formatter.divider(terminal_dimensions().0)),
            Message::Clear => None,
        };
        Ok(line)
    }

    async fn render_stdout(&self, message: &Message, state: &mut RenderState) -> io::Result<()> {
        let mut out = stdout();
        match message {
            Message::Chat(chat) => {
                let formatted = self.formatter.chat(chat)?;
                // Rows above the cursor once the bubble is printed
                let rows = rendered_rows(&formatted, terminal_dimensions().0);
                self.print_around_spinner(state, &formatted)?;
                state.last_bubble = Some((chat.id, rows));
            }
            Message::Retract(retract) => {
                let (_, height) = terminal_dimensions();
                match state.last_bubble {
                    Some((id, rows)) if id == retract.id && rows < height => {
                        if let Some(spinner) = &state.spinner {
                            spinner.pause();
                        }
                        queue!(out, MoveUp(rows), Clear(ClearType::FromCursorDown))?;
                        out.flush()?;
                        if let Some(spinner) = &state.spinner {
                            spinner.resume();
                        }
                        state.last_bubble = None;
                    }
                    // Scrolled away or not the newest bubble: leave it on screen
                    _ => {}
                }
            }
            Message::Loading(loading) => {
                if let Some(spinner) = state.spinner.take() {
                    spinner.stop().await;
                }
                if loading.visible {
                    let spinner = Spinner::with_config(SpinnerConfig {
                        color: self.formatter.style.accent_color,
                        ..SpinnerConfig::default()
                    });
                    state.spinner = Some(spinner.start(loading.label.clone()));
                }
            }
            Message::Progress(progress) => {
                if let Some(spinner) = &state.spinner {
                    spinner.set_detail(progress_detail(progress));
                }
            }
            Message::Text(text) => {
                let formatted = self.formatter.text(text.level, &text.text)?;
                self.print_around_spinner(state, &formatted)?;
                state.last_bubble = None;
            }
            Message::Divider => {
                let line = format!("{}\n", self.formatter.divider(terminal_dimensions().0));
                self.print_around_spinner(state, &line)?;
                state.last_bubble = None;
            }
            Message::Clear => {
                queue!(out, Clear(ClearType::All))?;
                out.flush()?;
                state.last_bubble = None;
            }
        }
        Ok(())
    }

    fn print_around_spinner(&self, state: &RenderState, text: &str) -> io::Result<()> {
        if let Some(spinner) = &state.spinner {
            spinner.pause();
        }
        let mut out = stdout();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        if let Some(spinner) = &state.spinner {
            spinner.resume();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UploadStatus;

    fn plain(formatted: &str) -> String {
        strip_ansi(formatted)
    }

    #[test]
    fn test_chat_roles_have_prefixes() {
        let f = MessageFormatter::new();
        let user = f.chat(&ChatMessage::new(MessageId(1), Role::User, "hi")).unwrap();
        let system = f.chat(&ChatMessage::new(MessageId(2), Role::System, "ok")).unwrap();
        let error = f.chat(&ChatMessage::new(MessageId(3), Role::Error, "bad")).unwrap();

        assert_eq!(plain(&user), "› hi\n\n");
        assert_eq!(plain(&system), "✓ ok\n\n");
        assert_eq!(plain(&error), "✗ bad\n\n");
    }

    #[test]
    fn test_placeholder_is_dimmed() {
        let f = MessageFormatter::new();
        let out = f.chat(&ChatMessage::placeholder(MessageId(1), "Thinking...")).unwrap();
        assert_eq!(plain(&out), "… Thinking...\n\n");
        assert!(out.contains("\x1b[2m"));
    }

    #[test]
    fn test_assistant_markdown() {
        let f = MessageFormatter::new();
        let text = "# Title\n- item with `code`\n1. **bold** and *it*\n> quote\n[doc](http://x)";
        let out = plain(&f.chat(&ChatMessage::new(MessageId(1), Role::Assistant, text)).unwrap());
        assert_eq!(
            out,
            "Title\n• item with code\n1. bold and it\n│ quote\ndoc\n\n"
        );
    }

    #[test]
    fn test_inline_leaves_unmatched_markers() {
        let f = MessageFormatter::new();
        let out = plain(
            &f.chat(&ChatMessage::new(MessageId(1), Role::Assistant, "a * b and [x] `y"))
                .unwrap(),
        );
        assert_eq!(out, "a * b and [x] `y\n\n");
    }

    #[test]
    fn test_code_block_is_framed() {
        let f = MessageFormatter::new();
        let text = "Look:\n```rust\nfn main() {}\n```";
        let out = plain(&f.chat(&ChatMessage::new(MessageId(1), Role::Assistant, text)).unwrap());
        assert!(out.starts_with("Look:\n┌── rust\n│ fn main() {}\n└──\n"));
    }

    #[test]
    fn test_unclosed_code_block_still_rendered() {
        let f = MessageFormatter::new();
        let out = plain(
            &f.chat(&ChatMessage::new(MessageId(1), Role::Assistant, "```\nx = 1"))
                .unwrap(),
        );
        assert!(out.contains("┌── code\n│ x = 1\n└──"));
    }

    #[test]
    fn test_text_levels() {
        let f = MessageFormatter::new();
        assert_eq!(plain(&f.text(MessageLevel::Warning, "careful").unwrap()), "⚠ careful\n");
        assert_eq!(plain(&f.text(MessageLevel::Info, "note").unwrap()), "note\n");
    }

    #[test]
    fn test_progress_detail() {
        let mut progress = UploadProgress {
            status: UploadStatus::Processing,
            current_file: "a.pdf".into(),
            processed_files: 1,
            total_files: 3,
        };
        assert_eq!(
            progress_detail(&progress),
            "Processing: a.pdf · Processed 1 of 3 files"
        );
        progress.current_file.clear();
        assert_eq!(progress_detail(&progress), "Processed 1 of 3 files");
    }

    #[test]
    fn test_rendered_rows_ignores_escapes() {
        let f = MessageFormatter::new();
        let out = f.chat(&ChatMessage::new(MessageId(1), Role::User, "hi")).unwrap();
        // Text row plus separator
        assert_eq!(rendered_rows(&out, 80), 2);
        assert_eq!(rendered_rows("\x1b[31mabcdef\x1b[0m\n", 3), 2);
    }

    #[tokio::test]
    async fn test_placeholder_rows_match_printed_lines() {
        let renderer = TerminalRenderer::stdout();
        let mut state = RenderState::default();
        let placeholder = ChatMessage::placeholder(MessageId(7), "Thinking...");
        let printed = renderer.formatter.chat(&placeholder).unwrap();

        renderer
            .render_stdout(&Message::Chat(placeholder), &mut state)
            .await
            .unwrap();

        let newlines = printed.matches('\n').count() as u16;
        assert_eq!(newlines, 2);
        assert_eq!(state.last_bubble, Some((MessageId(7), newlines)));

        renderer
            .render_stdout(&Message::retract(MessageId(7)), &mut state)
            .await
            .unwrap();
        assert!(state.last_bubble.is_none());
    }

    #[test]
    fn test_printer_lines_skip_retract_and_repeated_progress() {
        let renderer = TerminalRenderer::stdout();
        let mut state = RenderState::default();
        let progress = Message::Progress(UploadProgress {
            status: UploadStatus::Processing,
            current_file: "a.pdf".into(),
            processed_files: 0,
            total_files: 1,
        });

        assert!(renderer
            .printer_line(&Message::retract(MessageId(1)), &mut state)
            .unwrap()
            .is_none());
        assert_eq!(
            renderer
                .printer_line(&Message::loading_started("Uploading PDFs..."), &mut state)
                .unwrap()
                .as_deref(),
            Some("⏳ Uploading PDFs...")
        );
        assert!(renderer.printer_line(&progress, &mut state).unwrap().is_some());
        assert!(renderer.printer_line(&progress, &mut state).unwrap().is_none());
        assert!(renderer
            .printer_line(&Message::loading_finished(), &mut state)
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_run_loop_ends_when_senders_drop() {
        let (sender, receiver) = super::super::MessageBus::new().split();
        let printer = ExternalPrinter::new(16);
        let handle = tokio::spawn(TerminalRenderer::printer(printer.clone()).run_loop(receiver));

        sender.info("hello");
        drop(sender);
        handle.await.unwrap();

        let printed = printer.receiver().try_recv().unwrap();
        assert_eq!(strip_ansi(&printed), "hello");
    }
}
