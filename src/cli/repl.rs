//! Interactive REPL.
//!
//! Reads lines with reedline while a renderer task prints chat output
//! through reedline's external printer. Questions and uploads run on their
//! own tasks so the prompt stays responsive.

use std::io::stdout;
use std::sync::Arc;

use crossterm::{
    cursor::MoveTo,
    terminal::{Clear, ClearType},
    ExecutableCommand,
};
use reedline::{ExternalPrinter, FileBackedHistory, Signal};
use tracing::{debug, warn};

use crate::api::HttpBackend;
use crate::chat::{Role, TerminalView};
use crate::cli::commands::{
    config_text, help_text, history_text, save_settings, status_text, StatusInfo,
};
use crate::cli::completion::{create_reedline, ChatCompleter, ChatPrompt};
use crate::config::{ClientSettings, XdgDirs};
use crate::controller::ChatUploadController;
use crate::files::{expand_selection, read_selection, split_args};

pub type TerminalController = ChatUploadController<HttpBackend, TerminalView>;

/// What the loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    Exit,
}

/// REPL state.
pub struct Repl {
    controller: Arc<TerminalController>,
    settings: ClientSettings,
    printer: ExternalPrinter<String>,
}

impl Repl {
    pub fn new(
        controller: Arc<TerminalController>,
        settings: ClientSettings,
        printer: ExternalPrinter<String>,
    ) -> Self {
        Self {
            controller,
            settings,
            printer,
        }
    }

    /// Run the REPL loop until `/exit` or Ctrl-D.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let completer = match std::env::current_dir() {
            Ok(dir) => ChatCompleter::with_base_dir(dir),
            Err(_) => ChatCompleter::new(),
        };
        let mut line_editor = create_reedline(completer).with_external_printer(self.printer.clone());

        let dirs = XdgDirs::new();
        if let Err(e) = dirs.ensure_dirs() {
            warn!(error = %e, "Could not create pdfchat directories");
        }
        match FileBackedHistory::with_file(self.settings.history_size, dirs.history_file()) {
            Ok(h) => line_editor = line_editor.with_history(Box::new(h)),
            Err(e) => debug!(error = %e, "Line history unavailable"),
        }

        let host = host_label(self.controller.backend().base_url());

        loop {
            let prompt = ChatPrompt::new(&host, self.controller.is_uploaded());

            match line_editor.read_line(&prompt) {
                Ok(Signal::Success(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if self.handle_input(line) == CommandResult::Exit {
                        println!("👋 Bye!");
                        break;
                    }
                }
                Ok(Signal::CtrlC) => {
                    println!("^C");
                    continue;
                }
                Ok(Signal::CtrlD) => {
                    println!("👋 Bye!");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "Readline error");
                    eprintln!("Readline error: {}", err);
                    break;
                }
            }
        }

        Ok(())
    }

    fn handle_input(&self, input: &str) -> CommandResult {
        if input.starts_with('/') {
            return self.handle_command(input);
        }

        let controller = Arc::clone(&self.controller);
        let question = input.to_string();
        tokio::spawn(async move {
            controller.on_ask(&question).await;
        });
        CommandResult::Continue
    }

    fn handle_command(&self, input: &str) -> CommandResult {
        let (cmd, args) = match input.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd, args.trim()),
            None => (input, ""),
        };

        match cmd {
            "/upload" => self.cmd_upload(args),
            "/history" => println!("{}", history_text(&self.controller.server_history())),
            "/status" => {
                let view = self.controller.view();
                println!(
                    "{}",
                    status_text(&StatusInfo {
                        base_url: self.controller.backend().base_url().as_str(),
                        uploaded: self.controller.is_uploaded(),
                        message_count: view.messages().len(),
                        history_height: view.history_max_height(),
                        polling: self.controller.options().poll_status,
                    })
                );
            }
            "/config" if args == "save" => {
                println!("{}", save_settings(&self.settings, &XdgDirs::new().settings_file()))
            }
            "/config" => println!("{}", config_text(&self.settings)),
            "/redraw" => {
                clear_screen();
                self.controller.adjust_layout();
                self.controller.view().redraw();
            }
            "/clear" => clear_screen(),
            "/help" => println!("{}", help_text()),
            "/exit" | "/quit" => return CommandResult::Exit,
            _ => println!("\x1b[33m⚠ Unknown command: {} (try /help)\x1b[0m", cmd),
        }

        CommandResult::Continue
    }

    fn cmd_upload(&self, args: &str) {
        if args.is_empty() {
            println!("Usage: /upload <files or globs>");
            return;
        }

        let paths = match expand_selection(split_args(args)) {
            Ok(paths) => paths,
            Err(e) => {
                self.controller.add_message(&format!("Error: {}", e), Role::Error);
                return;
            }
        };
        if paths.is_empty() {
            self.controller
                .view()
                .warning(&format!("No files match '{}'", args));
            return;
        }

        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            match read_selection(&paths).await {
                Ok(files) => {
                    controller.on_files_selected(files).await;
                }
                Err(e) => {
                    warn!(error = %e, "Could not read selection");
                    controller.add_message(&format!("Error: {}", e), Role::Error);
                }
            }
        });
    }
}

/// `host:port` of the backend for the prompt.
pub fn host_label(url: &reqwest::Url) -> String {
    let host = url.host_str().unwrap_or("backend");
    match url.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn clear_screen() {
    let mut out = stdout();
    let _ = out.execute(Clear(ClearType::All));
    let _ = out.execute(MoveTo(0, 0));
}
