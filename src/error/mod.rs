use thiserror::Error;

use crate::record::ProcessTypeId;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Use-case schema configuration errors
///
/// All of these abort the run before any record is processed. A partially
/// valid registry is never used.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Cannot read schema configuration at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid schema file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("No use-case schema files found in {dir}")]
    NoSchemas { dir: String },

    #[error("Schema configuration declares no use cases")]
    NoUseCases,

    #[error("Duplicate process type {id} in schema configuration")]
    DuplicateProcessType { id: ProcessTypeId },

    #[error("Use case {id} declares no attributes")]
    EmptyAttributes { id: ProcessTypeId },

    #[error("Use case {id} declares attribute '{key}' more than once")]
    DuplicateAttribute { id: ProcessTypeId, key: String },

    #[error("Attribute '{key}': unknown equality policy '{policy}'")]
    UnknownPolicy { key: String, policy: String },

    #[error("Attribute '{key}': tolerance is only valid with the numeric policy, not '{policy}'")]
    ToleranceNotAllowed { key: String, policy: String },
}

/// Feedback source errors
///
/// File-level failures that abort the run. Malformed individual rows are
/// recorded as ingestion failures instead and never stop the batch.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Cannot open feedback source {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read feedback source {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Feedback source {path} is missing required column '{column}'")]
    MissingHeader { path: String, column: String },
}

/// Report export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for schema configuration loading
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type alias for feedback source reads
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type alias for report export
pub type ExportResult<T> = Result<T, ExportError>;
