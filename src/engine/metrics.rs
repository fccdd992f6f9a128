//! Match-rate metrics.
//!
//! Counts verdicts and folds them into per-use-case and aggregate
//! statistics:
//! - the record match rate counts OK records over all reconciled records,
//! - attribute match rates count OK over OK + KO, with `MISSING_*` verdicts
//!   excluded from the denominator and reported as separate counts.
//!
//! Rates are kept as exact numerator/denominator pairs until rendering. A
//! zero denominator renders as undefined, never as zero.

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;

use serde::{Deserialize, Serialize};

use crate::engine::compare::VerdictStatus;
use crate::engine::group::UseCaseReport;
use crate::record::ProcessTypeId;

// ============================================================================
// Counters
// ============================================================================

/// An exact match rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRate {
    /// Matching outcomes.
    pub matched: usize,
    /// Eligible outcomes.
    pub total: usize,
}

impl MatchRate {
    /// Fraction in `[0, 1]`, or `None` when nothing was eligible.
    pub fn fraction(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.matched as f64 / self.total as f64)
        }
    }

    /// Render as a fixed-precision percentage, `"n/a"` when undefined.
    pub fn percent(&self) -> String {
        match self.fraction() {
            Some(f) => format!("{:.2}%", f * 100.0),
            None => "n/a".to_string(),
        }
    }
}

/// Verdict counts for one attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    /// Agreements.
    pub ok: usize,
    /// Disagreements.
    pub ko: usize,
    /// Reference value absent.
    pub missing_reference: usize,
    /// AI value absent.
    pub missing_ai: usize,
}

impl MatchCounts {
    /// Record one verdict.
    pub fn add(&mut self, status: VerdictStatus) {
        match status {
            VerdictStatus::Ok => self.ok += 1,
            VerdictStatus::Ko => self.ko += 1,
            VerdictStatus::MissingReference => self.missing_reference += 1,
            VerdictStatus::MissingAi => self.missing_ai += 1,
        }
    }

    /// Fold another counter into this one.
    pub fn merge(&mut self, other: &MatchCounts) {
        self.ok += other.ok;
        self.ko += other.ko;
        self.missing_reference += other.missing_reference;
        self.missing_ai += other.missing_ai;
    }

    /// Verdicts eligible for the match rate, missing excluded.
    pub fn eligible(&self) -> usize {
        self.ok + self.ko
    }

    /// OK over eligible.
    pub fn rate(&self) -> MatchRate {
        MatchRate {
            matched: self.ok,
            total: self.eligible(),
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Counts and rate for one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeStats {
    /// Attribute key.
    pub key: String,
    /// Display title.
    pub title: String,
    /// Verdict counts.
    pub counts: MatchCounts,
}

impl AttributeStats {
    /// OK over eligible for this attribute.
    pub fn rate(&self) -> MatchRate {
        self.counts.rate()
    }
}

/// Statistics for one use case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCaseStats {
    /// Use case identifier.
    pub process_type_id: ProcessTypeId,
    /// Use case display name.
    pub name: String,
    /// Reconciled records in this use case.
    pub records: usize,
    /// Records with overall status OK.
    pub ok_records: usize,
    /// Per-attribute statistics, in schema order.
    pub attributes: Vec<AttributeStats>,
}

impl UseCaseStats {
    /// OK records over all records of the use case.
    pub fn record_rate(&self) -> MatchRate {
        MatchRate {
            matched: self.ok_records,
            total: self.records,
        }
    }
}

/// Whole-run statistics across every report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    /// Rows read from all sources.
    pub input_rows: usize,
    /// Records reconciled into a report.
    pub reconciled_records: usize,
    /// Reconciled records with overall status OK.
    pub ok_records: usize,
    /// Rows rejected for an unknown process type.
    pub rejected_rows: usize,
    /// Rows that failed ingestion.
    pub ingest_failures: usize,
    /// Per-use-case breakdown, ascending by process type id.
    pub use_cases: Vec<UseCaseStats>,
    /// Per-attribute counts merged across use cases by key. Titles come from
    /// the first use case that declares the key.
    pub attributes: Vec<AttributeStats>,
}

impl AggregateSummary {
    /// OK records over all reconciled records.
    pub fn record_rate(&self) -> MatchRate {
        MatchRate {
            matched: self.ok_records,
            total: self.reconciled_records,
        }
    }
}

// ============================================================================
// Computation
// ============================================================================

/// Compute per-use-case and aggregate statistics over the grouped reports.
pub fn summarize(
    reports: &[UseCaseReport],
    input_rows: usize,
    rejected_rows: usize,
    ingest_failures: usize,
) -> AggregateSummary {
    let mut use_cases = Vec::with_capacity(reports.len());
    let mut merged: Vec<AttributeStats> = Vec::new();
    let mut reconciled_records = 0;
    let mut ok_records = 0;

    for report in reports {
        let stats = summarize_report(report);
        reconciled_records += stats.records;
        ok_records += stats.ok_records;
        for attr in &stats.attributes {
            match merged.iter_mut().find(|m| m.key == attr.key) {
                Some(existing) => existing.counts.merge(&attr.counts),
                None => merged.push(attr.clone()),
            }
        }
        use_cases.push(stats);
    }

    AggregateSummary {
        input_rows,
        reconciled_records,
        ok_records,
        rejected_rows,
        ingest_failures,
        use_cases,
        attributes: merged,
    }
}

fn summarize_report(report: &UseCaseReport) -> UseCaseStats {
    let mut attributes: Vec<AttributeStats> = report
        .attributes
        .iter()
        .map(|spec| AttributeStats {
            key: spec.key.clone(),
            title: spec.title.clone(),
            counts: MatchCounts::default(),
        })
        .collect();

    let mut ok_records = 0;
    for record in &report.records {
        if record.overall.is_match() {
            ok_records += 1;
        }
        for verdict in &record.verdicts {
            if let Some(attr) = attributes.iter_mut().find(|a| a.key == verdict.key) {
                attr.counts.add(verdict.status);
            }
        }
    }

    UseCaseStats {
        process_type_id: report.process_type_id,
        name: report.name.clone(),
        records: report.records.len(),
        ok_records,
        attributes,
    }
}
