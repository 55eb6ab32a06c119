use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{debug, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode, WriteLogger};

use textlayer::layer::{LoadState, MupdfDocument, MupdfSource, TextLayer};
use textlayer::panic_handler;
use textlayer::settings::{self, LogLevel};

/// Print the positioned text layer of a PDF page as JSON
#[derive(Parser)]
#[command(name = "textlayer")]
#[command(version)]
struct Cli {
    /// Document to read
    file: PathBuf,

    /// Page to lay out (0-indexed)
    #[arg(short, long, default_value = "0")]
    page: usize,

    /// Display scale factor (defaults to the configured scale)
    #[arg(short, long)]
    scale: Option<f32>,

    /// Display rotation in degrees (defaults to the page's own rotation)
    #[arg(short, long, allow_negative_numbers = true)]
    rotate: Option<i32>,

    /// Settings file to use instead of the one in the config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the log to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log verbosity
    #[arg(long, value_enum, ignore_case = true)]
    log_level: Option<LogLevel>,

    /// Give up on extraction after this many milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,
}

fn init_logging(cli: &Cli, configured: LogLevel) -> Result<()> {
    let level = log::LevelFilter::from(cli.log_level.unwrap_or(configured));

    match &cli.log_file {
        Some(path) => WriteLogger::init(
            level,
            Config::default(),
            File::create(path).with_context(|| format!("cannot create log file {path:?}"))?,
        )?,
        None => TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )?,
    }

    Ok(())
}

fn main() -> Result<()> {
    panic_handler::initialize_panic_handler();

    let cli = Cli::parse();

    match &cli.config {
        Some(path) => settings::load_settings_from_path(path),
        None => settings::load_settings(),
    }
    let settings = settings::get_settings();

    init_logging(&cli, settings.log_level)?;
    debug!("Using settings {settings:?}");

    let document = MupdfDocument::open(&cli.file)
        .with_context(|| format!("cannot open {:?}", cli.file))?;
    let page = document.page(cli.page)?;
    info!(
        "Laying out page {} of {} in {:?}",
        page.index(),
        document.page_count(),
        cli.file
    );

    let mut builder = TextLayer::builder(Arc::new(MupdfSource))
        .page(page)
        .scale(cli.scale.unwrap_or(settings.scale))
        .workers(settings.workers);
    if let Some(rotate) = cli.rotate.or(settings.rotate) {
        builder = builder.rotate(rotate);
    }
    let mut layer = builder.mount()?;

    if !layer.wait(Duration::from_millis(cli.timeout_ms)) {
        bail!("text extraction timed out after {}ms", cli.timeout_ms);
    }
    if let LoadState::Failed(error) = layer.load_state() {
        bail!("text extraction failed: {error}");
    }

    let view = layer.render();
    println!("{}", serde_json::to_string_pretty(&view)?);

    Ok(())
}
