//! CLI runner for interactive and scripted modes.

use std::sync::Arc;

use anyhow::Context;
use reedline::ExternalPrinter;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::api::HttpBackend;
use crate::chat::{ChatView, Role, TerminalView};
use crate::cli::repl::{host_label, Repl};
use crate::config::ClientSettings;
use crate::controller::{ChatUploadController, ControllerOptions, FlowOutcome};
use crate::files::select_files;
use crate::messaging::{MessageBus, TerminalRenderer};

/// Lines buffered for the external printer before senders block.
const PRINTER_CAPACITY: usize = 256;

fn backend_for(settings: &ClientSettings) -> anyhow::Result<Arc<HttpBackend>> {
    let backend = HttpBackend::new(&settings.base_url)
        .with_context(|| format!("Invalid backend URL '{}'", settings.base_url))?;
    debug!(url = %backend.base_url(), "Using backend");
    Ok(Arc::new(backend))
}

/// Run in interactive mode.
pub async fn run_interactive(settings: ClientSettings) -> anyhow::Result<()> {
    let backend = backend_for(&settings)?;
    let (sender, receiver) = MessageBus::new().split();
    let view = Arc::new(TerminalView::new(sender));
    let controller = Arc::new(ChatUploadController::new(
        Arc::clone(&backend),
        view,
        ControllerOptions::from(&settings),
    ));

    let printer = ExternalPrinter::new(PRINTER_CAPACITY);
    let renderer = tokio::spawn(TerminalRenderer::printer(printer.clone()).run_loop(receiver));

    print_banner(&host_label(backend.base_url()));
    controller.adjust_layout();
    let resize = spawn_resize_watcher(Arc::clone(&controller));

    let mut repl = Repl::new(Arc::clone(&controller), settings, printer);
    let result = repl.run().await;

    if let Some(resize) = resize {
        resize.abort();
    }
    renderer.abort();
    result
}

/// Upload and/or ask once, rendering straight to stdout.
///
/// Returns the outcome of the last flow that ran.
pub async fn run_scripted(
    settings: ClientSettings,
    uploads: &[String],
    question: Option<&str>,
) -> anyhow::Result<FlowOutcome> {
    let backend = backend_for(&settings)?;
    let (sender, receiver) = MessageBus::new().split();
    let view = Arc::new(TerminalView::new(sender));
    let renderer = tokio::spawn(TerminalRenderer::stdout().run_loop(receiver));

    let controller = ChatUploadController::new(backend, view, ControllerOptions::from(&settings));
    controller.adjust_layout();

    let mut outcome = FlowOutcome::Skipped;

    if !uploads.is_empty() {
        outcome = match select_files(uploads).await {
            Ok(files) if files.is_empty() => {
                controller.view().warning("No files matched the upload selection");
                FlowOutcome::Skipped
            }
            Ok(files) => controller.on_files_selected(files).await,
            Err(e) => {
                controller.add_message(&format!("Error: {}", e), Role::Error);
                FlowOutcome::Failed
            }
        };
    }

    if let Some(question) = question {
        outcome = controller.on_ask(question).await;
    }

    // The renderer exits once every sender, including those held by pending
    // scroll tasks, is gone
    drop(controller);
    renderer.await.context("Renderer task failed")?;

    Ok(outcome)
}

/// Recompute the layout whenever the terminal is resized.
#[cfg(unix)]
fn spawn_resize_watcher<V: ChatView>(
    controller: Arc<ChatUploadController<HttpBackend, V>>,
) -> Option<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::window_change()) {
        Ok(mut resizes) => Some(tokio::spawn(async move {
            while resizes.recv().await.is_some() {
                let height = controller.adjust_layout();
                trace!(%height, "Terminal resized");
            }
        })),
        Err(e) => {
            debug!(error = %e, "Resize notifications unavailable");
            None
        }
    }
}

#[cfg(not(unix))]
fn spawn_resize_watcher<V: ChatView>(
    _controller: Arc<ChatUploadController<HttpBackend, V>>,
) -> Option<JoinHandle<()>> {
    None
}

/// Print the welcome banner.
pub fn print_banner(host: &str) {
    for line in banner_lines(host) {
        println!("{}", line);
    }
}

fn banner_lines(host: &str) -> Vec<String> {
    vec![
        String::new(),
        format!(
            "  \x1b[1;33m📄 pdfchat\x1b[0m  \x1b[2mv{}\x1b[0m",
            env!("CARGO_PKG_VERSION")
        ),
        format!("  \x1b[2mAsking questions about your PDFs at\x1b[0m \x1b[36m{}\x1b[0m", host),
        "  \x1b[2mStart with \x1b[0m\x1b[1;36m/upload <files>\x1b[0m\x1b[2m, then type a question. \x1b[0m\x1b[1;36m/help\x1b[0m\x1b[2m lists commands.\x1b[0m".to_string(),
        String::new(),
    ]
}
