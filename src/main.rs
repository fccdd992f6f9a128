use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedback_reconciler::config::{Config, LogFormat};
use feedback_reconciler::engine::Reconciler;
use feedback_reconciler::export::XlsxExporter;
use feedback_reconciler::schema::{loader, RowShape};
use feedback_reconciler::source::{collect_rows, CsvFeedbackSource, FeedbackSource};

fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Feedback reconciler starting..."
    );

    // Load and validate the use-case schema registry; any configuration
    // problem is fatal before a single row is read.
    let registry = match loader::load_dir(&config.schema_dir) {
        Ok(r) => r,
        Err(e) => {
            error!(dir = %config.schema_dir.display(), error = %e, "Failed to load use-case schemas");
            return Err(e.into());
        }
    };

    // Assemble the feedback sources
    let mut sources: Vec<Box<dyn FeedbackSource>> = vec![Box::new(CsvFeedbackSource::new(
        &config.input,
        RowShape::Document,
        config.delimiter,
    ))];
    if let Some(path) = &config.assistant_input {
        sources.push(Box::new(CsvFeedbackSource::new(
            path,
            RowShape::Assistant,
            config.delimiter,
        )));
    }

    let rows = match collect_rows(&sources) {
        Ok(rows) => rows,
        Err(e) => {
            error!(error = %e, "Failed to read feedback rows");
            return Err(e.into());
        }
    };

    // Run the engine and render the workbook
    let outcome = Reconciler::new(registry).run(rows);

    let exporter = XlsxExporter::new(&config.output);
    if let Err(e) = exporter.export(&outcome) {
        error!(path = %config.output.display(), error = %e, "Failed to write report");
        return Err(e.into());
    }

    info!(
        path = %config.output.display(),
        records = outcome.summary.reconciled_records,
        match_rate = %outcome.summary.record_rate().percent(),
        "Report complete"
    );
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
