//! pdfchat - chat with your PDFs from the terminal
//!
//! Interactive REPL by default; `--upload` and `--ask` run once and exit.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pdfchat::cli::{run_interactive, run_scripted};
use pdfchat::{ClientSettings, FlowOutcome};

/// pdfchat - ask questions about your PDFs 📄
#[derive(Parser, Debug)]
#[command(name = "pdfchat")]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the question-answering service
    #[arg(long, env = "PDFCHAT_URL")]
    url: Option<String>,

    /// Do not poll upload status while uploading
    #[arg(long)]
    no_poll: bool,

    /// Upload status polling interval in milliseconds
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// Settings file (defaults to the XDG config location)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Upload these PDFs (paths or globs) and exit unless --ask is given
    #[arg(short, long, value_name = "FILE", num_args = 1..)]
    upload: Vec<String>,

    /// Ask a single question and exit
    #[arg(short, long)]
    ask: Option<String>,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short = 'd', long)]
    debug: bool,

    /// Enable verbose logging (equivalent to RUST_LOG=trace)
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn init_tracing(args: &Args) {
    let default_filter = if args.verbose {
        "trace"
    } else if args.debug {
        "debug"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if args.debug || args.verbose {
        tracing::info!("Debug logging enabled");
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let settings = ClientSettings::load(args.config.as_deref())
        .context("Failed to load settings")?
        .with_overrides(args.url.clone(), args.no_poll, args.poll_interval_ms);
    settings.validate()?;

    let runtime = tokio::runtime::Runtime::new()?;

    if args.upload.is_empty() && args.ask.is_none() {
        return runtime.block_on(run_interactive(settings));
    }

    let outcome = runtime.block_on(run_scripted(settings, &args.upload, args.ask.as_deref()))?;
    if outcome == FlowOutcome::Failed {
        std::process::exit(1);
    }
    Ok(())
}
