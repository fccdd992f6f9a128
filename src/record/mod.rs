//! Core record types shared across the reconciliation pipeline.
//!
//! A [`FeedbackRecord`] is one evaluation unit: the human reference answers
//! and the AI answers for a single processed document or assistant exchange,
//! plus the flat fields the upstream feedback collector exported with it.

use serde::{Deserialize, Serialize};

/// Identifier of a use case (process type) and its attribute schema.
///
/// Process type ids are numeric in the upstream feedback export and double as
/// the deterministic ordering key for reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProcessTypeId(pub u32);

impl std::fmt::Display for ProcessTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProcessTypeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(ProcessTypeId)
            .map_err(|_| format!("not a numeric process type id: '{}'", s))
    }
}

/// Lifecycle timestamps of a feedback record.
///
/// The engine carries these through unchanged and never interprets them; they
/// surface in reports exactly as the source provided them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTimestamps {
    /// When the record was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// When processing started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,
    /// When processing completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,
    /// When the user confirmed the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<String>,
    /// When the record was closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed: Option<String>,
    /// When the record was cancelled, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<String>,
    /// When the record was last modified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

/// One evaluation unit: reference answers vs AI answers for a single record.
///
/// Built by the ingestor from a raw source row. The two payloads are the
/// parsed `InitialData` (human reference) and `Data` (AI output) JSON values;
/// their interpretation is deferred to the normalizer, which applies the
/// record's use-case schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Unique record identifier, stable across the pipeline.
    pub id: String,
    /// The use case that produced this record.
    pub process_type_id: ProcessTypeId,
    /// Human/reference answer set, keyed by attribute.
    pub initial_payload: serde_json::Value,
    /// AI answer set for the same attributes.
    pub ai_payload: serde_json::Value,
    /// Lifecycle timestamps, carried through unchanged.
    pub timestamps: RecordTimestamps,
    /// User the feedback was collected from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Workflow state as exported by the collector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Name of the processed source file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file_name: Option<String>,
    /// Free-form note attached to the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Module the record came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
}
