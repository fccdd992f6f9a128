//! Report tables.
//!
//! Sink-independent rendering of a run into string tables: one table per
//! use case, a stack of summary tables, and a rejection table. The XLSX
//! exporter turns these into worksheets; tests assert on them directly.

use serde::Serialize;

use crate::engine::{RunOutcome, UseCaseReport};

/// A rendered table: a name, a header row, and string rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    /// Table name; used as the sheet or section title.
    pub name: String,
    /// Header row.
    pub headers: Vec<String>,
    /// Data rows, each as wide as the header row.
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Render one use-case report as a table.
///
/// Columns: record identity, then per attribute the payload title, the
/// reference value, the AI value and the status, then the trailing overall
/// column. Missing values render as empty cells; the status column alone
/// distinguishes missing from disagreement.
pub fn use_case_table(report: &UseCaseReport) -> ReportTable {
    let mut headers = vec!["Id".to_string(), "User".to_string(), "Created".to_string()];
    for spec in &report.attributes {
        headers.push(format!("{} (title)", spec.title));
        headers.push(format!("{} (reference)", spec.title));
        headers.push(format!("{} (AI)", spec.title));
        headers.push(format!("{} (status)", spec.title));
    }
    headers.push("Overall".to_string());

    let mut rows = Vec::with_capacity(report.records.len());
    for record in &report.records {
        let mut row = vec![
            record.record_id.clone(),
            record.user.clone().unwrap_or_default(),
            record.created.clone().unwrap_or_default(),
        ];
        for verdict in &record.verdicts {
            row.push(verdict.title.clone());
            row.push(verdict.reference.clone().unwrap_or_default());
            row.push(verdict.ai.clone().unwrap_or_default());
            row.push(verdict.status.to_string());
        }
        row.push(record.overall.to_string());
        rows.push(row);
    }

    ReportTable {
        name: format!("UC{} {}", report.process_type_id, report.name),
        headers,
        rows,
    }
}

/// Render the summary sections: run totals, per-use-case rates and merged
/// per-attribute rates.
pub fn summary_tables(outcome: &RunOutcome) -> Vec<ReportTable> {
    let summary = &outcome.summary;

    let totals = ReportTable {
        name: "Totals".to_string(),
        headers: vec!["Metric".to_string(), "Value".to_string()],
        rows: vec![
            vec!["Input rows".to_string(), summary.input_rows.to_string()],
            vec![
                "Reconciled records".to_string(),
                summary.reconciled_records.to_string(),
            ],
            vec!["OK records".to_string(), summary.ok_records.to_string()],
            vec![
                "Record match rate".to_string(),
                summary.record_rate().percent(),
            ],
            vec!["Rejected rows".to_string(), summary.rejected_rows.to_string()],
            vec![
                "Ingestion failures".to_string(),
                summary.ingest_failures.to_string(),
            ],
            vec![
                "Generated at".to_string(),
                outcome.generated_at.to_rfc3339(),
            ],
            vec!["Run id".to_string(), outcome.run_id.to_string()],
        ],
    };

    let use_cases = ReportTable {
        name: "Use cases".to_string(),
        headers: vec![
            "Process type".to_string(),
            "Use case".to_string(),
            "Records".to_string(),
            "OK".to_string(),
            "Match rate".to_string(),
        ],
        rows: summary
            .use_cases
            .iter()
            .map(|uc| {
                vec![
                    uc.process_type_id.to_string(),
                    uc.name.clone(),
                    uc.records.to_string(),
                    uc.ok_records.to_string(),
                    uc.record_rate().percent(),
                ]
            })
            .collect(),
    };

    let attributes = ReportTable {
        name: "Attributes".to_string(),
        headers: vec![
            "Attribute".to_string(),
            "OK".to_string(),
            "KO".to_string(),
            "Missing reference".to_string(),
            "Missing AI".to_string(),
            "Match rate".to_string(),
        ],
        rows: summary
            .attributes
            .iter()
            .map(|attr| {
                vec![
                    attr.title.clone(),
                    attr.counts.ok.to_string(),
                    attr.counts.ko.to_string(),
                    attr.counts.missing_reference.to_string(),
                    attr.counts.missing_ai.to_string(),
                    attr.rate().percent(),
                ]
            })
            .collect(),
    };

    vec![totals, use_cases, attributes]
}

/// Render rejected rows and ingestion failures as one table.
///
/// Rejections come first, then failures, each in batch order.
pub fn rejection_table(outcome: &RunOutcome) -> ReportTable {
    let mut rows = Vec::with_capacity(outcome.rejected.len() + outcome.failures.len());
    for rejected in &outcome.rejected {
        rows.push(vec![
            rejected.source.clone(),
            rejected.row_number.to_string(),
            rejected.record_id.clone(),
            rejected.reason.to_string(),
            rejected.detail.clone(),
        ]);
    }
    for failure in &outcome.failures {
        rows.push(vec![
            failure.source.clone(),
            failure.row_number.to_string(),
            failure.record_id.clone().unwrap_or_default(),
            failure.kind.to_string(),
            failure.detail.clone(),
        ]);
    }

    ReportTable {
        name: "Rejections".to_string(),
        headers: vec![
            "Source".to_string(),
            "Row".to_string(),
            "Record id".to_string(),
            "Reason".to_string(),
            "Detail".to_string(),
        ],
        rows,
    }
}
