// Rust guideline compliant 2026-02-06

//! CLI entry point for the pinned-dependency pre-commit hook.

use anyhow::{bail, Result};
use clap::Parser;
use pincheck_core::{Config, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Fails when pinned requirement files no longer satisfy declared dependencies
#[derive(Parser, Debug)]
#[command(name = "check-pinned-deps")]
#[command(
    version,
    about = "Pre-commit hook checking pinned requirements against pyproject.toml / setup.cfg"
)]
struct Cli {
    /// Filenames to check
    filenames: Vec<String>,

    /// Repository root the filenames are relative to
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Configuration file (defaults to <root>/.pincheck.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Stop at the first lock file with a mismatch
    #[arg(long)]
    fail_fast: bool,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Format {
    Plain,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            let kind = match err.downcast_ref::<pincheck_core::Error>() {
                Some(core) if core.is_parse_error() => "parse error",
                _ => "error",
            };
            eprintln!("{}: {:#}", kind, err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    init_tracing(parse_log_level(&cli.log_level)?);

    let mut config = match &cli.config {
        Some(path) => Config::load_file(path)?,
        None => Config::load(&cli.root)?,
    };
    if let Some(format) = cli.format {
        config.output_format = match format {
            Format::Plain => OutputFormat::Plain,
            Format::Json => OutputFormat::Json,
        };
    }
    config.fail_fast |= cli.fail_fast;
    tracing::debug!(?config, files = cli.filenames.len(), "starting pinned dependency check");

    let report = pincheck_hooks::check_pinned_deps(&cli.root, cli.filenames.as_slice(), &config)?;
    match config.output_format {
        OutputFormat::Plain => print!("{}", report.render_plain()),
        OutputFormat::Json => println!("{}", report.render_json()?),
    }

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        other => bail!("Invalid log level: {}", other),
    }
}
