//! The reconciliation engine.
//!
//! Pure pipeline from raw feedback rows to grouped reports and aggregate
//! metrics:
//!
//! ```text
//! RawRow ──▶ ingest ──▶ schema lookup ──▶ reconcile ──▶ group ──▶ metrics
//!               │             │
//!               ▼             ▼
//!        IngestFailure   RejectedRow
//! ```
//!
//! The per-row phase runs in parallel; order-preserving collection keeps
//! every run deterministic for a fixed input. Grouping and metrics are a
//! sequential fold over the ordered verdict list. Every input row lands in
//! exactly one of the three output lists: a report record, a rejected row,
//! or an ingestion failure.

pub mod compare;
pub mod group;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod reconcile;

pub use compare::{AttributeVerdict, VerdictStatus};
pub use group::UseCaseReport;
pub use ingest::{IngestFailure, IngestFailureKind};
pub use metrics::{AggregateSummary, AttributeStats, MatchCounts, MatchRate, UseCaseStats};
pub use reconcile::RecordVerdict;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::record::ProcessTypeId;
use crate::schema::SchemaRegistry;
use crate::source::RawRow;

/// Why a row was excluded from reconciliation despite ingesting cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// No schema is registered for the row's process type.
    UnknownProcessType,
    /// The row's export shape differs from the use case's declared shape.
    ShapeMismatch,
}

impl RejectReason {
    /// Get the reason as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::UnknownProcessType => "UNKNOWN_PROCESS_TYPE",
            RejectReason::ShapeMismatch => "SHAPE_MISMATCH",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A row the configuration does not cover.
///
/// Rejection is not a failure of the row itself: either its process type has
/// no schema, or the schema declares a different export shape than the one
/// the row was read from. Rejected rows are listed in the report so the gap
/// is visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// Label of the source the row came from.
    pub source: String,
    /// 1-based row number within the source.
    pub row_number: u64,
    /// Record identifier.
    pub record_id: String,
    /// The row's process type.
    pub process_type_id: ProcessTypeId,
    /// Rejection classification.
    pub reason: RejectReason,
    /// Human-readable detail for the rejection report.
    pub detail: String,
}

/// Everything one engine run produces.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Identifier of this run, for provenance in logs and the report.
    pub run_id: Uuid,
    /// When the run happened.
    pub generated_at: DateTime<Utc>,
    /// Rows read from all sources.
    pub input_rows: usize,
    /// Per-use-case reports, ascending by process type id.
    pub reports: Vec<UseCaseReport>,
    /// Aggregate statistics over the reports.
    pub summary: AggregateSummary,
    /// Rows with an unknown process type.
    pub rejected: Vec<RejectedRow>,
    /// Rows that failed ingestion.
    pub failures: Vec<IngestFailure>,
}

enum RowResult {
    Reconciled(RecordVerdict),
    Rejected(RejectedRow),
    Failed(IngestFailure),
}

/// The reconciliation engine. Holds the validated schema registry and runs
/// batches against it.
pub struct Reconciler {
    registry: SchemaRegistry,
}

impl Reconciler {
    /// Create an engine over a validated registry.
    pub fn new(registry: SchemaRegistry) -> Self {
        Reconciler { registry }
    }

    /// Run the pipeline over one batch of rows.
    pub fn run(&self, rows: Vec<RawRow>) -> RunOutcome {
        let input_rows = rows.len();
        debug!(input_rows, use_cases = self.registry.len(), "Starting run");

        let results: Vec<RowResult> = rows.par_iter().map(|row| self.process_row(row)).collect();

        let mut verdicts = Vec::new();
        let mut rejected = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                RowResult::Reconciled(verdict) => verdicts.push(verdict),
                RowResult::Rejected(row) => rejected.push(row),
                RowResult::Failed(failure) => failures.push(failure),
            }
        }

        let reports = group::group_verdicts(&self.registry, verdicts);
        let summary = metrics::summarize(&reports, input_rows, rejected.len(), failures.len());

        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            input_rows,
            reconciled = summary.reconciled_records,
            ok = summary.ok_records,
            rejected = summary.rejected_rows,
            failures = summary.ingest_failures,
            record_rate = %summary.record_rate().percent(),
            "Reconciliation complete"
        );

        RunOutcome {
            run_id,
            generated_at: Utc::now(),
            input_rows,
            reports,
            summary,
            rejected,
            failures,
        }
    }

    fn process_row(&self, row: &RawRow) -> RowResult {
        let record = match ingest::ingest_row(row) {
            Ok(record) => record,
            Err(failure) => return RowResult::Failed(failure),
        };
        match self.registry.get(record.process_type_id) {
            Some(schema) if schema.shape != row.shape => {
                debug!(
                    record_id = %record.id,
                    process_type_id = %record.process_type_id,
                    expected = %schema.shape,
                    actual = %row.shape,
                    "Row shape does not match use case"
                );
                RowResult::Rejected(RejectedRow {
                    source: row.source.clone(),
                    row_number: row.row_number,
                    record_id: record.id,
                    process_type_id: record.process_type_id,
                    reason: RejectReason::ShapeMismatch,
                    detail: format!(
                        "use case {} expects {} rows, row came from a {} source",
                        record.process_type_id, schema.shape, row.shape
                    ),
                })
            }
            Some(schema) => RowResult::Reconciled(reconcile::reconcile_record(schema, &record)),
            None => {
                debug!(
                    record_id = %record.id,
                    process_type_id = %record.process_type_id,
                    "No schema for process type"
                );
                RowResult::Rejected(RejectedRow {
                    source: row.source.clone(),
                    row_number: row.row_number,
                    record_id: record.id,
                    process_type_id: record.process_type_id,
                    reason: RejectReason::UnknownProcessType,
                    detail: format!(
                        "no schema for process type {}",
                        record.process_type_id
                    ),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSpec, EqualityPolicy, RowShape, UseCaseSchema};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_schemas(vec![
            UseCaseSchema {
                process_type_id: ProcessTypeId(1),
                name: "Purchase contract".to_string(),
                shape: RowShape::Document,
                attributes: vec![
                    AttributeSpec::exact("Answer").with_policy(EqualityPolicy::CaseInsensitive)
                ],
            },
            UseCaseSchema {
                process_type_id: ProcessTypeId(2),
                name: "Lease contract".to_string(),
                shape: RowShape::Document,
                attributes: vec![AttributeSpec::exact("Answer")],
            },
        ])
        .unwrap()
    }

    fn row(number: u64, id: &str, ptid: &str, initial: &str, data: &str) -> RawRow {
        RawRow {
            source: "memory".to_string(),
            row_number: number,
            id: id.to_string(),
            process_type_id: ptid.to_string(),
            initial_data: initial.to_string(),
            data: data.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_row_lands_in_exactly_one_list() {
        let engine = Reconciler::new(registry());
        let outcome = engine.run(vec![
            row(1, "a", "1", r#"{"Answer": "x"}"#, r#"{"Answer": "x"}"#),
            row(2, "b", "1", r#"{"Answer": "x"}"#, r#"{"Answer": "y"}"#),
            row(3, "c", "99", r#"{"Answer": "x"}"#, r#"{"Answer": "x"}"#),
            row(4, "d", "2", "{not json", "{}"),
            row(5, "", "2", "{}", "{}"),
        ]);

        let reconciled: usize = outcome.reports.iter().map(|r| r.records.len()).sum();
        assert_eq!(
            reconciled + outcome.rejected.len() + outcome.failures.len(),
            outcome.input_rows
        );
        assert_eq!(outcome.input_rows, 5);
        assert_eq!(reconciled, 2);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.failures.len(), 2);
    }

    #[test]
    fn test_rejected_row_carries_identity() {
        let engine = Reconciler::new(registry());
        let outcome = engine.run(vec![row(7, "x-1", "99", "{}", "{}")]);
        assert_eq!(outcome.rejected.len(), 1);
        let rejected = &outcome.rejected[0];
        assert_eq!(rejected.source, "memory");
        assert_eq!(rejected.row_number, 7);
        assert_eq!(rejected.record_id, "x-1");
        assert_eq!(rejected.process_type_id, ProcessTypeId(99));
        assert_eq!(rejected.reason, RejectReason::UnknownProcessType);
        assert!(rejected.detail.contains("99"));
        assert!(outcome.reports.is_empty());
        assert_eq!(outcome.summary.rejected_rows, 1);
    }

    #[test]
    fn test_row_shape_must_match_the_use_case() {
        let registry = SchemaRegistry::from_schemas(vec![UseCaseSchema {
            process_type_id: ProcessTypeId(11),
            name: "Support assistant".to_string(),
            shape: RowShape::Assistant,
            attributes: vec![AttributeSpec::exact("UserSatisfactory")],
        }])
        .unwrap();
        let engine = Reconciler::new(registry);

        // A document-shape row resolving to an assistant use case is
        // rejected, never reconciled.
        let document = row(
            1,
            "a",
            "11",
            r#"{"UserSatisfactory": "y"}"#,
            r#"{"UserSatisfactory": "y"}"#,
        );
        let mut assistant = row(
            2,
            "b",
            "11",
            r#"{"UserSatisfactory": "y"}"#,
            r#"{"UserSatisfactory": "y"}"#,
        );
        assistant.shape = RowShape::Assistant;

        let outcome = engine.run(vec![document, assistant]);
        assert_eq!(outcome.rejected.len(), 1);
        let rejected = &outcome.rejected[0];
        assert_eq!(rejected.record_id, "a");
        assert_eq!(rejected.reason, RejectReason::ShapeMismatch);
        assert!(rejected.detail.contains("assistant"));
        assert!(rejected.detail.contains("document"));

        // The matching-shape row reconciles normally.
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports[0].records.len(), 1);
        assert_eq!(outcome.reports[0].records[0].record_id, "b");
        assert_eq!(outcome.summary.rejected_rows, 1);
    }

    #[test]
    fn test_reject_reason_as_str() {
        assert_eq!(
            RejectReason::UnknownProcessType.as_str(),
            "UNKNOWN_PROCESS_TYPE"
        );
        assert_eq!(RejectReason::ShapeMismatch.as_str(), "SHAPE_MISMATCH");
        assert_eq!(format!("{}", RejectReason::ShapeMismatch), "SHAPE_MISMATCH");
    }

    #[test]
    fn test_records_keep_input_order_within_reports() {
        let engine = Reconciler::new(registry());
        let outcome = engine.run(vec![
            row(1, "first", "1", "{}", "{}"),
            row(2, "second", "2", "{}", "{}"),
            row(3, "third", "1", "{}", "{}"),
        ]);
        assert_eq!(outcome.reports.len(), 2);
        let ids: Vec<&str> = outcome.reports[0]
            .records
            .iter()
            .map(|r| r.record_id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "third"]);
    }

    #[test]
    fn test_summary_matches_outcome_lists() {
        let engine = Reconciler::new(registry());
        let outcome = engine.run(vec![
            row(1, "a", "1", r#"{"Answer": "x"}"#, r#"{"Answer": "X"}"#),
            row(2, "b", "2", r#"{"Answer": "x"}"#, r#"{"Answer": "X"}"#),
        ]);
        // Case-insensitive use case matches, exact one does not.
        assert_eq!(outcome.summary.reconciled_records, 2);
        assert_eq!(outcome.summary.ok_records, 1);
        assert_eq!(outcome.summary.record_rate().percent(), "50.00%");
        assert_eq!(outcome.summary.use_cases.len(), 2);
    }

    #[test]
    fn test_empty_batch() {
        let engine = Reconciler::new(registry());
        let outcome = engine.run(vec![]);
        assert_eq!(outcome.input_rows, 0);
        assert!(outcome.reports.is_empty());
        assert_eq!(outcome.summary.record_rate().percent(), "n/a");
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let rows = vec![
            row(1, "a", "1", r#"{"Answer": "x"}"#, r#"{"Answer": "x"}"#),
            row(2, "b", "2", r#"{"Answer": "x"}"#, r#"{"Answer": "y"}"#),
            row(3, "c", "99", "{}", "{}"),
            row(4, "d", "1", "{oops", "{}"),
        ];
        let engine = Reconciler::new(registry());
        let first = engine.run(rows.clone());
        let second = engine.run(rows);

        assert_eq!(
            serde_json::to_string(&first.reports).unwrap(),
            serde_json::to_string(&second.reports).unwrap()
        );
        assert_eq!(
            serde_json::to_string(&first.summary).unwrap(),
            serde_json::to_string(&second.summary).unwrap()
        );
        assert_eq!(first.rejected, second.rejected);
        assert_eq!(first.failures, second.failures);
    }
}
