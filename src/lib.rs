//! # Feedback Reconciler
//!
//! Evaluates AI-generated answers against human reference answers collected
//! per "use case" (process type), and produces per-use-case and aggregate
//! accuracy reports.
//!
//! ## Pipeline
//!
//! ```text
//! CSV export → ingest → normalize → compare → reconcile → group → metrics
//!                                                                    ↓
//!                                           report tables → XLSX workbook
//! ```
//!
//! Every run is a pure function of (raw rows, use-case schemas): each row
//! lands in exactly one of a use-case report, the rejection list (unknown
//! process type), or the ingestion-failure list. The per-row phase runs in
//! parallel; the result is deterministic for a fixed input.
//!
//! ## Example
//!
//! ```ignore
//! use feedback_reconciler::engine::Reconciler;
//! use feedback_reconciler::export::XlsxExporter;
//! use feedback_reconciler::schema::{loader, RowShape};
//! use feedback_reconciler::source::{collect_rows, CsvFeedbackSource, FeedbackSource};
//!
//! fn main() -> anyhow::Result<()> {
//!     let registry = loader::load_dir("./config/usecases".as_ref())?;
//!     let sources: Vec<Box<dyn FeedbackSource>> =
//!         vec![Box::new(CsvFeedbackSource::new("feedback.csv", RowShape::Document, b';'))];
//!     let outcome = Reconciler::new(registry).run(collect_rows(&sources)?);
//!     XlsxExporter::new("feedback-report.xlsx").export(&outcome)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Command-line and environment configuration.
pub mod config;
/// The reconciliation engine: ingest, normalize, compare, group, metrics.
pub mod engine;
/// Error types and result aliases.
pub mod error;
/// Report sinks (XLSX).
pub mod export;
/// Core record types.
pub mod record;
/// Sink-independent report tables.
pub mod report;
/// Use-case schemas and their TOML loader.
pub mod schema;
/// Feedback row sources.
pub mod source;

pub use config::Config;
pub use engine::{Reconciler, RunOutcome};
pub use error::{AppError, AppResult};
pub use schema::SchemaRegistry;
