//! Feedback row sources.
//!
//! A [`RawRow`] is the canonical unit handed to the engine: every column of a
//! feedback export as an owned string, plus provenance (source label and a
//! 1-based row number). The [`FeedbackSource`] trait abstracts where rows
//! come from so tests can feed in-memory batches; [`csv`] holds the
//! production reader for both export shapes.

pub mod csv;

pub use self::csv::CsvFeedbackSource;

use tracing::info;

use crate::error::SourceResult;
use crate::schema::RowShape;

/// One feedback row as read from a source, before any validation.
///
/// Assistant-shape rows are already lifted into this form by the reader, so
/// `initial_data` and `data` always hold the reference and AI payloads as
/// raw JSON text. Empty cells arrive as `None` for optional columns and as
/// an empty string for the required ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    /// Label of the source the row came from.
    pub source: String,
    /// 1-based data row number within the source, headers excluded.
    pub row_number: u64,
    /// Shape of the export the row was read from. Cross-checked against the
    /// use case's declared shape during reconciliation.
    pub shape: RowShape,
    /// Record identifier column.
    pub id: String,
    /// Feedback author.
    pub user: Option<String>,
    /// Workflow state column, carried through verbatim.
    pub state: Option<String>,
    /// Creation timestamp, verbatim.
    pub created: Option<String>,
    /// Processing start timestamp, verbatim.
    pub started: Option<String>,
    /// Processing completion timestamp, verbatim.
    pub completed: Option<String>,
    /// Confirmation timestamp, verbatim.
    pub confirmed: Option<String>,
    /// Closing timestamp, verbatim.
    pub closed: Option<String>,
    /// Cancellation timestamp, verbatim.
    pub cancelled: Option<String>,
    /// Last modification timestamp, verbatim.
    pub modified: Option<String>,
    /// Name of the document the feedback refers to.
    pub source_file_name: Option<String>,
    /// Free-text note column.
    pub note: Option<String>,
    /// Originating module identifier.
    pub module_id: Option<String>,
    /// Use-case identifier column, parsed during ingestion.
    pub process_type_id: String,
    /// Reference payload column as raw JSON text.
    pub initial_data: String,
    /// AI payload column as raw JSON text.
    pub data: String,
    /// Set when the reader could not decode the row. Such rows carry no
    /// column data and are turned into ingestion failures by the engine.
    pub parse_error: Option<String>,
}

impl RawRow {
    /// Placeholder for a row the reader could not decode.
    pub fn failed(source: &str, row_number: u64, error: impl Into<String>) -> Self {
        RawRow {
            source: source.to_string(),
            row_number,
            parse_error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// A provider of feedback rows.
pub trait FeedbackSource {
    /// Label identifying the source in provenance fields and logs.
    fn label(&self) -> String;

    /// Read every row in source order.
    fn rows(&self) -> SourceResult<Vec<RawRow>>;
}

/// In-memory source for tests and embedding callers.
pub struct MemorySource {
    label: String,
    rows: Vec<RawRow>,
}

impl MemorySource {
    /// Create a source that serves the given rows.
    pub fn new(label: impl Into<String>, rows: Vec<RawRow>) -> Self {
        MemorySource {
            label: label.into(),
            rows,
        }
    }
}

impl FeedbackSource for MemorySource {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn rows(&self) -> SourceResult<Vec<RawRow>> {
        Ok(self.rows.clone())
    }
}

/// Read all sources in order into one batch.
///
/// Row order within each source is preserved and sources are concatenated in
/// the order given, so the batch is deterministic for a fixed set of inputs.
pub fn collect_rows(sources: &[Box<dyn FeedbackSource>]) -> SourceResult<Vec<RawRow>> {
    let mut rows = Vec::new();
    for source in sources {
        let mut batch = source.rows()?;
        info!(
            source = %source.label(),
            rows = batch.len(),
            "Collected feedback rows"
        );
        rows.append(&mut batch);
    }
    Ok(rows)
}
