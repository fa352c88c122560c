//! Binary entry point for the remold CLI.
//!
//! A run is described by a JSON configuration file naming the LHS
//! template (a source file plus a range and metavariable ranges) and
//! the RHS template text. Input files are given on the command line;
//! the template's own source file is transformed as well unless the
//! configuration opts out.
//!
//! ```bash
//! # Rewrite inputs next to the originals (<name>.transformed.<ext>)
//! remold --config rewrite.json src/a.cc src/b.cc
//!
//! # Rewrite the inputs in place
//! remold --config rewrite.json --overwrite src/a.cc
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use remold_core::error::RemoldError;
use remold_engine::{transform, LhsConfig, TransformSummary};

/// Template-driven source-to-source transformation for C-family code.
#[derive(Parser, Debug)]
#[command(name = "remold", version, about)]
struct Cli {
    /// Path to the JSON transformation configuration.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Source files to transform.
    inputs: Vec<PathBuf>,

    /// Overwrite input files instead of writing alternate outputs.
    #[arg(long)]
    overwrite: bool,

    /// Log level for diagnostics on stderr.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(cli.log_level.to_tracing_level().into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(summary) => {
            eprintln!(
                "{} file(s) processed, {} match(es) applied, {} file(s) skipped",
                summary.files_processed, summary.matches_applied, summary.files_skipped
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("remold: {err}");
            ExitCode::from(err.exit_status().code())
        }
    }
}

fn run(cli: &Cli) -> Result<TransformSummary, RemoldError> {
    let config = LhsConfig::load(&cli.config).map_err(remold_engine::EngineError::from)?;
    let overwrite = cli.overwrite.then_some(true);
    let summary = transform(&config, &cli.inputs, overwrite)?;
    Ok(summary)
}
