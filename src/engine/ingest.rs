//! Row validation and payload parsing.
//!
//! Turns a [`RawRow`] into a [`FeedbackRecord`] or a typed
//! [`IngestFailure`]. Failures are collected alongside the records, never
//! thrown away, and one bad row never aborts the batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{FeedbackRecord, ProcessTypeId, RecordTimestamps};
use crate::source::RawRow;

/// Why a row was excluded from reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestFailureKind {
    /// A payload column did not parse as JSON.
    MalformedJson,
    /// The row lacks its identifier, process type, or a payload column.
    MissingRequiredField,
}

impl IngestFailureKind {
    /// Get the failure kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestFailureKind::MalformedJson => "MALFORMED_JSON",
            IngestFailureKind::MissingRequiredField => "MISSING_REQUIRED_FIELD",
        }
    }
}

impl std::fmt::Display for IngestFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row that could not be ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestFailure {
    /// Label of the source the row came from.
    pub source: String,
    /// 1-based row number within the source.
    pub row_number: u64,
    /// Record identifier, when the row carried one.
    pub record_id: Option<String>,
    /// Failure classification.
    pub kind: IngestFailureKind,
    /// Human-readable detail for the rejection report.
    pub detail: String,
}

/// Validate a raw row and parse its payloads into a record.
pub fn ingest_row(row: &RawRow) -> Result<FeedbackRecord, IngestFailure> {
    if let Some(error) = &row.parse_error {
        return Err(failure(
            row,
            IngestFailureKind::MissingRequiredField,
            format!("row could not be decoded: {}", error),
        ));
    }

    let id = row.id.trim();
    if id.is_empty() {
        return Err(failure(
            row,
            IngestFailureKind::MissingRequiredField,
            "id is empty".to_string(),
        ));
    }

    let process_type_id = row
        .process_type_id
        .parse::<ProcessTypeId>()
        .map_err(|e| failure(row, IngestFailureKind::MissingRequiredField, e))?;

    let initial_payload = parse_payload(row, "InitialData", &row.initial_data)?;
    let ai_payload = parse_payload(row, "Data", &row.data)?;

    Ok(FeedbackRecord {
        id: id.to_string(),
        process_type_id,
        initial_payload,
        ai_payload,
        timestamps: RecordTimestamps {
            created: row.created.clone(),
            started: row.started.clone(),
            completed: row.completed.clone(),
            confirmed: row.confirmed.clone(),
            closed: row.closed.clone(),
            cancelled: row.cancelled.clone(),
            modified: row.modified.clone(),
        },
        user: row.user.clone(),
        state: row.state.clone(),
        source_file_name: row.source_file_name.clone(),
        note: row.note.clone(),
        module_id: row.module_id.clone(),
    })
}

fn parse_payload(row: &RawRow, column: &str, text: &str) -> Result<Value, IngestFailure> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(failure(
            row,
            IngestFailureKind::MissingRequiredField,
            format!("{} is empty", column),
        ));
    }
    serde_json::from_str(trimmed).map_err(|e| {
        failure(
            row,
            IngestFailureKind::MalformedJson,
            format!("{}: {}", column, e),
        )
    })
}

fn failure(row: &RawRow, kind: IngestFailureKind, detail: String) -> IngestFailure {
    let id = row.id.trim();
    IngestFailure {
        source: row.source.clone(),
        row_number: row.row_number,
        record_id: if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        },
        kind,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, ptid: &str, initial: &str, data: &str) -> RawRow {
        RawRow {
            source: "memory".to_string(),
            row_number: 1,
            id: id.to_string(),
            process_type_id: ptid.to_string(),
            initial_data: initial.to_string(),
            data: data.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ingest_valid_row() {
        let mut raw = row("42", "3", r#"{"Answer": "a"}"#, r#"{"Answer": "b"}"#);
        raw.user = Some("novak".to_string());
        raw.created = Some("2024-03-01".to_string());

        let record = ingest_row(&raw).unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.process_type_id, ProcessTypeId(3));
        assert_eq!(record.initial_payload["Answer"], "a");
        assert_eq!(record.ai_payload["Answer"], "b");
        assert_eq!(record.user.as_deref(), Some("novak"));
        assert_eq!(record.timestamps.created.as_deref(), Some("2024-03-01"));
    }

    #[test]
    fn test_ingest_trims_id_and_process_type() {
        let raw = row(" 42 ", " 3 ", "{}", "{}");
        let record = ingest_row(&raw).unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.process_type_id, ProcessTypeId(3));
    }

    #[test]
    fn test_ingest_rejects_empty_id() {
        let raw = row("  ", "3", "{}", "{}");
        let err = ingest_row(&raw).unwrap_err();
        assert_eq!(err.kind, IngestFailureKind::MissingRequiredField);
        assert_eq!(err.record_id, None);
        assert_eq!(err.detail, "id is empty");
        assert_eq!(err.row_number, 1);
        assert_eq!(err.source, "memory");
    }

    #[test]
    fn test_ingest_rejects_unparseable_process_type() {
        let raw = row("42", "abc", "{}", "{}");
        let err = ingest_row(&raw).unwrap_err();
        assert_eq!(err.kind, IngestFailureKind::MissingRequiredField);
        assert_eq!(err.record_id.as_deref(), Some("42"));
        assert!(err.detail.contains("abc"));
    }

    #[test]
    fn test_ingest_rejects_empty_payload() {
        let raw = row("42", "3", "", "{}");
        let err = ingest_row(&raw).unwrap_err();
        assert_eq!(err.kind, IngestFailureKind::MissingRequiredField);
        assert_eq!(err.detail, "InitialData is empty");
    }

    #[test]
    fn test_ingest_rejects_malformed_json() {
        let raw = row("42", "3", "{}", "{not json");
        let err = ingest_row(&raw).unwrap_err();
        assert_eq!(err.kind, IngestFailureKind::MalformedJson);
        assert!(err.detail.starts_with("Data:"));
        assert_eq!(err.record_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_ingest_maps_reader_error() {
        let raw = RawRow::failed("feedback.csv", 9, "field count mismatch");
        let err = ingest_row(&raw).unwrap_err();
        assert_eq!(err.kind, IngestFailureKind::MissingRequiredField);
        assert_eq!(err.row_number, 9);
        assert_eq!(err.source, "feedback.csv");
        assert!(err.detail.contains("field count mismatch"));
    }

    #[test]
    fn test_ingest_accepts_non_object_payload() {
        let raw = row("42", "3", "[1, 2]", "\"text\"");
        let record = ingest_row(&raw).unwrap();
        assert!(record.initial_payload.is_array());
        assert!(record.ai_payload.is_string());
    }

    #[test]
    fn test_failure_kind_as_str() {
        assert_eq!(IngestFailureKind::MalformedJson.as_str(), "MALFORMED_JSON");
        assert_eq!(
            IngestFailureKind::MissingRequiredField.as_str(),
            "MISSING_REQUIRED_FIELD"
        );
        assert_eq!(
            format!("{}", IngestFailureKind::MalformedJson),
            "MALFORMED_JSON"
        );
    }
}
