//! CSV reader for feedback exports.
//!
//! Handles the two shapes produced by the feedback collector:
//! - document rows with JSON payload columns (`InitialData`, `Data`),
//! - assistant rows with `Query`, `AnswerAI` and `UserSatisfactory` columns.
//!
//! Assistant rows are lifted into the canonical two-payload form here, at
//! the boundary. The reference payload becomes `{"UserSatisfactory": "y"}`
//! (a satisfied user is the reference outcome) and the AI payload carries
//! the flag together with the question and answer text, so downstream
//! stages never branch on shape.
//!
//! The whole file is read up front. A file that cannot be opened or lacks a
//! required column fails the run; a row that cannot be decoded becomes a
//! [`RawRow`] with `parse_error` set and reading continues.

use std::fs;
use std::path::PathBuf;

use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{SourceError, SourceResult};
use crate::schema::RowShape;
use crate::source::{FeedbackSource, RawRow};

/// Columns a document export must declare.
const DOCUMENT_COLUMNS: &[&str] = &["id", "ProcessTypeId", "InitialData", "Data"];

/// Columns an assistant export must declare.
const ASSISTANT_COLUMNS: &[&str] = &[
    "id",
    "ProcessTypeId",
    "Query",
    "AnswerAI",
    "UserSatisfactory",
];

/// CSV-backed feedback source.
pub struct CsvFeedbackSource {
    path: PathBuf,
    shape: RowShape,
    delimiter: u8,
}

impl CsvFeedbackSource {
    /// Create a reader for the given file and export shape.
    pub fn new(path: impl Into<PathBuf>, shape: RowShape, delimiter: u8) -> Self {
        CsvFeedbackSource {
            path: path.into(),
            shape,
            delimiter,
        }
    }
}

impl FeedbackSource for CsvFeedbackSource {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    fn rows(&self) -> SourceResult<Vec<RawRow>> {
        let text = fs::read_to_string(&self.path).map_err(|source| SourceError::Open {
            path: self.label(),
            source,
        })?;
        read_rows(&text, self.delimiter, self.shape, &self.label())
    }
}

/// Decode CSV text into raw rows.
fn read_rows(text: &str, delimiter: u8, shape: RowShape, label: &str) -> SourceResult<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .quote(b'"')
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|source| SourceError::Csv {
            path: label.to_string(),
            source,
        })?
        .clone();

    let required = match shape {
        RowShape::Document => DOCUMENT_COLUMNS,
        RowShape::Assistant => ASSISTANT_COLUMNS,
    };
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(SourceError::MissingHeader {
                path: label.to_string(),
                column: column.to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row_number = (index + 1) as u64;
        let decoded = result.and_then(|record| match shape {
            RowShape::Document => record
                .deserialize::<DocumentRow>(Some(&headers))
                .map(|row| row.into_raw(label, row_number)),
            RowShape::Assistant => record
                .deserialize::<AssistantRow>(Some(&headers))
                .map(|row| row.into_raw(label, row_number)),
        });
        match decoded {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(
                    source = %label,
                    row = row_number,
                    error = %e,
                    "Row could not be decoded"
                );
                rows.push(RawRow::failed(label, row_number, e.to_string()));
            }
        }
    }

    debug!(
        source = %label,
        shape = %shape,
        rows = rows.len(),
        "Read feedback rows"
    );
    Ok(rows)
}

// Serde targets for the two export shapes. Columns not listed here are
// ignored by the reader.

#[derive(Debug, Deserialize)]
struct DocumentRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    user: Option<String>,
    #[serde(default, rename = "createddate")]
    created: Option<String>,
    #[serde(default, rename = "starteddate")]
    started: Option<String>,
    #[serde(default, rename = "completeddate")]
    completed: Option<String>,
    #[serde(default, rename = "confirmeddate")]
    confirmed: Option<String>,
    #[serde(default, rename = "closedate")]
    closed: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default, rename = "canceleddate")]
    cancelled: Option<String>,
    #[serde(default, rename = "modifieddate")]
    modified: Option<String>,
    #[serde(default, rename = "sourcefilename")]
    source_file_name: Option<String>,
    #[serde(default, rename = "ProcessTypeId")]
    process_type_id: String,
    #[serde(default, rename = "InitialData")]
    initial_data: String,
    #[serde(default, rename = "Data")]
    data: String,
    #[serde(default, rename = "Note")]
    note: Option<String>,
    #[serde(default, rename = "ModuleId")]
    module_id: Option<String>,
}

impl DocumentRow {
    fn into_raw(self, source: &str, row_number: u64) -> RawRow {
        RawRow {
            source: source.to_string(),
            row_number,
            shape: RowShape::Document,
            id: self.id,
            user: self.user,
            state: self.state,
            created: self.created,
            started: self.started,
            completed: self.completed,
            confirmed: self.confirmed,
            closed: self.closed,
            cancelled: self.cancelled,
            modified: self.modified,
            source_file_name: self.source_file_name,
            note: self.note,
            module_id: self.module_id,
            process_type_id: self.process_type_id,
            initial_data: self.initial_data,
            data: self.data,
            parse_error: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AssistantRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    user: Option<String>,
    #[serde(default, rename = "createddate")]
    created: Option<String>,
    #[serde(default, rename = "starteddate")]
    started: Option<String>,
    #[serde(default, rename = "completeddate")]
    completed: Option<String>,
    #[serde(default, rename = "confirmeddate")]
    confirmed: Option<String>,
    #[serde(default, rename = "closedate")]
    closed: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default, rename = "canceleddate")]
    cancelled: Option<String>,
    #[serde(default, rename = "modifieddate")]
    modified: Option<String>,
    #[serde(default, rename = "sourcefilename")]
    source_file_name: Option<String>,
    #[serde(default, rename = "ProcessTypeId")]
    process_type_id: String,
    #[serde(default, rename = "Query")]
    query: Option<String>,
    #[serde(default, rename = "AnswerAI")]
    answer_ai: Option<String>,
    #[serde(default, rename = "UserSatisfactory")]
    user_satisfactory: Option<String>,
    #[serde(default, rename = "Note")]
    note: Option<String>,
    #[serde(default, rename = "ModuleId")]
    module_id: Option<String>,
}

impl AssistantRow {
    fn into_raw(self, source: &str, row_number: u64) -> RawRow {
        let reference = serde_json::json!({ "UserSatisfactory": "y" });
        let ai = serde_json::json!({
            "UserSatisfactory": self.user_satisfactory,
            "Query": self.query,
            "Answer": self.answer_ai,
        });
        RawRow {
            source: source.to_string(),
            row_number,
            shape: RowShape::Assistant,
            id: self.id,
            user: self.user,
            state: self.state,
            created: self.created,
            started: self.started,
            completed: self.completed,
            confirmed: self.confirmed,
            closed: self.closed,
            cancelled: self.cancelled,
            modified: self.modified,
            source_file_name: self.source_file_name,
            note: self.note,
            module_id: self.module_id,
            process_type_id: self.process_type_id,
            initial_data: reference.to_string(),
            data: ai.to_string(),
            parse_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_document_rows() {
        let text = "id;user;createddate;ProcessTypeId;InitialData;Data\n\
                    77;alice;2024-03-01 10:00;3;\"{\"\"Answer\"\": \"\"42\"\"}\";\"{\"\"Answer\"\": \"\"41\"\"}\"\n\
                    78;;;3;{};{}\n";
        let rows = read_rows(text, b';', RowShape::Document, "test.csv").unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].row_number, 1);
        assert_eq!(rows[0].source, "test.csv");
        assert_eq!(rows[0].shape, RowShape::Document);
        assert_eq!(rows[0].id, "77");
        assert_eq!(rows[0].user.as_deref(), Some("alice"));
        assert_eq!(rows[0].created.as_deref(), Some("2024-03-01 10:00"));
        assert_eq!(rows[0].process_type_id, "3");
        assert_eq!(rows[0].initial_data, "{\"Answer\": \"42\"}");
        assert_eq!(rows[0].data, "{\"Answer\": \"41\"}");
        assert!(rows[0].parse_error.is_none());

        assert_eq!(rows[1].row_number, 2);
        assert_eq!(rows[1].user, None);
        assert_eq!(rows[1].created, None);
    }

    #[test]
    fn test_read_rows_with_embedded_delimiter() {
        let text = "id;ProcessTypeId;InitialData;Data\n\
                    1;3;\"{\"\"Answer\"\": \"\"a;b\"\"}\";{}\n";
        let rows = read_rows(text, b';', RowShape::Document, "test.csv").unwrap();
        assert_eq!(rows[0].initial_data, "{\"Answer\": \"a;b\"}");
    }

    #[test]
    fn test_read_rows_custom_delimiter() {
        let text = "id,ProcessTypeId,InitialData,Data\n9,4,{},{}\n";
        let rows = read_rows(text, b',', RowShape::Document, "test.csv").unwrap();
        assert_eq!(rows[0].id, "9");
        assert_eq!(rows[0].process_type_id, "4");
    }

    #[test]
    fn test_undecodable_row_keeps_reading() {
        let text = "id;ProcessTypeId;InitialData;Data\n\
                    1;3;{};{}\n\
                    2;3;{}\n\
                    3;3;{};{}\n";
        let rows = read_rows(text, b';', RowShape::Document, "test.csv").unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].parse_error.is_none());
        assert!(rows[1].parse_error.is_some());
        assert_eq!(rows[1].row_number, 2);
        assert!(rows[2].parse_error.is_none());
        assert_eq!(rows[2].id, "3");
    }

    #[test]
    fn test_missing_required_column_fails() {
        let text = "id;ProcessTypeId;InitialData\n1;3;{}\n";
        let result = read_rows(text, b';', RowShape::Document, "test.csv");
        match result {
            Err(SourceError::MissingHeader { path, column }) => {
                assert_eq!(path, "test.csv");
                assert_eq!(column, "Data");
            }
            other => panic!("Expected MissingHeader, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_fails_header_check() {
        let result = read_rows("", b';', RowShape::Document, "test.csv");
        assert!(matches!(result, Err(SourceError::MissingHeader { .. })));
    }

    #[test]
    fn test_assistant_rows_are_lifted() {
        let text = "id;ProcessTypeId;Query;AnswerAI;UserSatisfactory\n\
                    5;11;Opening hours?;We open at nine.;y\n";
        let rows = read_rows(text, b';', RowShape::Assistant, "assistant.csv").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].shape, RowShape::Assistant);

        let reference: serde_json::Value = serde_json::from_str(&rows[0].initial_data).unwrap();
        assert_eq!(reference["UserSatisfactory"], "y");

        let ai: serde_json::Value = serde_json::from_str(&rows[0].data).unwrap();
        assert_eq!(ai["UserSatisfactory"], "y");
        assert_eq!(ai["Query"], "Opening hours?");
        assert_eq!(ai["Answer"], "We open at nine.");
    }

    #[test]
    fn test_assistant_empty_flag_becomes_null() {
        let text = "id;ProcessTypeId;Query;AnswerAI;UserSatisfactory\n\
                    6;11;Anything?;Sure.;\n";
        let rows = read_rows(text, b';', RowShape::Assistant, "assistant.csv").unwrap();
        let ai: serde_json::Value = serde_json::from_str(&rows[0].data).unwrap();
        assert!(ai["UserSatisfactory"].is_null());
    }

    #[test]
    fn test_unknown_columns_are_ignored() {
        let text = "id;ProcessTypeId;InitialData;Data;AnnotatedFilePath\n\
                    1;3;{};{};/tmp/x.pdf\n";
        let rows = read_rows(text, b';', RowShape::Document, "test.csv").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].parse_error.is_none());
    }
}
