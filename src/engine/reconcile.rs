//! Per-record reconciliation.
//!
//! Applies a use-case schema to one record: normalizes both payloads
//! attribute by attribute, compares them, and folds the attribute verdicts
//! into the record's overall status. The overall status is OK only when
//! every attribute verdict is OK; a missing value forces KO the same way a
//! disagreement does.

use serde::{Deserialize, Serialize};

use crate::engine::compare::{compare_values, AttributeVerdict, VerdictStatus};
use crate::engine::normalize::normalize_attribute;
use crate::record::{FeedbackRecord, ProcessTypeId};
use crate::schema::UseCaseSchema;

/// All attribute verdicts for one record, plus the fields reports display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordVerdict {
    /// Record identifier.
    pub record_id: String,
    /// The record's use case.
    pub process_type_id: ProcessTypeId,
    /// Feedback author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Creation timestamp, verbatim from the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// One verdict per schema attribute, in schema order.
    pub verdicts: Vec<AttributeVerdict>,
    /// OK when every attribute verdict is OK, KO otherwise.
    pub overall: VerdictStatus,
}

/// Reconcile one record against its use-case schema.
pub fn reconcile_record(schema: &UseCaseSchema, record: &FeedbackRecord) -> RecordVerdict {
    let mut verdicts = Vec::with_capacity(schema.attributes.len());
    for spec in &schema.attributes {
        let reference = normalize_attribute(&record.initial_payload, &spec.key);
        let ai = normalize_attribute(&record.ai_payload, &spec.key);
        let status = compare_values(spec.policy, &reference.value, &ai.value);
        // Reference titles win over AI titles, which win over the schema.
        let title = reference
            .title
            .or(ai.title)
            .unwrap_or_else(|| spec.title.clone());
        verdicts.push(AttributeVerdict {
            key: spec.key.clone(),
            title,
            reference: reference.value.into_option(),
            ai: ai.value.into_option(),
            status,
        });
    }

    let overall = if verdicts.iter().all(|v| v.status.is_match()) {
        VerdictStatus::Ok
    } else {
        VerdictStatus::Ko
    };

    RecordVerdict {
        record_id: record.id.clone(),
        process_type_id: record.process_type_id,
        user: record.user.clone(),
        created: record.timestamps.created.clone(),
        verdicts,
        overall,
    }
}
