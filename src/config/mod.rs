//! Runtime configuration.
//!
//! Every flag of the binary falls back to an environment variable, and a
//! `.env` file is honored when present, so the reconciler can run from a
//! scheduler with no command line at all. Logging is configured purely from
//! the environment (`LOG_LEVEL`, `LOG_FORMAT`).

use std::env;
use std::path::PathBuf;

use clap::Parser;

use crate::error::AppError;

/// Command line of the `feedback-reconciler` binary.
#[derive(Debug, Parser)]
#[command(
    name = "feedback-reconciler",
    version,
    about = "Reconciles AI answers against human reference feedback and writes an XLSX accuracy report"
)]
pub struct Cli {
    /// Document-shape feedback CSV export.
    #[arg(long, env = "FEEDBACK_INPUT")]
    pub input: PathBuf,

    /// Optional assistant-shape CSV; its rows join the same batch.
    #[arg(long, env = "FEEDBACK_ASSISTANT_INPUT")]
    pub assistant_input: Option<PathBuf>,

    /// Directory of use-case schema TOML files.
    #[arg(long, env = "FEEDBACK_SCHEMA_DIR", default_value = "./config/usecases")]
    pub schema_dir: PathBuf,

    /// Path of the XLSX report to write.
    #[arg(long, env = "FEEDBACK_OUTPUT", default_value = "./feedback-report.xlsx")]
    pub output: PathBuf,

    /// CSV field delimiter.
    #[arg(long, env = "FEEDBACK_CSV_DELIMITER", default_value = ";")]
    pub delimiter: String,
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Document-shape feedback CSV.
    pub input: PathBuf,
    /// Assistant-shape feedback CSV, when one is given.
    pub assistant_input: Option<PathBuf>,
    /// Use-case schema directory.
    pub schema_dir: PathBuf,
    /// XLSX output path.
    pub output: PathBuf,
    /// CSV field delimiter byte.
    pub delimiter: u8,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Logging configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable log lines.
    Pretty,
    /// One JSON object per log line.
    Json,
}

impl Config {
    /// Load configuration for the binary: `.env`, then command line with
    /// environment fallback.
    pub fn load() -> Result<Self, AppError> {
        // Load .env before clap reads the environment (ignore if absent).
        let _ = dotenvy::dotenv();
        Self::from_cli(Cli::parse())
    }

    /// Validate parsed command-line arguments into a configuration.
    pub fn from_cli(cli: Cli) -> Result<Self, AppError> {
        let delimiter = parse_delimiter(&cli.delimiter)?;
        Ok(Config {
            input: cli.input,
            assistant_input: cli.assistant_input,
            schema_dir: cli.schema_dir,
            output: cli.output,
            delimiter,
            logging: LoggingConfig::from_env(),
        })
    }
}

impl LoggingConfig {
    /// Read `LOG_LEVEL` and `LOG_FORMAT`, defaulting to `info` / pretty.
    pub fn from_env() -> Self {
        LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }
}

fn parse_delimiter(value: &str) -> Result<u8, AppError> {
    let bytes = value.as_bytes();
    if bytes.len() == 1 && bytes[0].is_ascii() {
        Ok(bytes[0])
    } else {
        Err(AppError::Config {
            message: "delimiter must be a single ASCII character".to_string(),
        })
    }
}
