//! Grouping verdicts into per-use-case reports.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::reconcile::RecordVerdict;
use crate::record::ProcessTypeId;
use crate::schema::{AttributeSpec, SchemaRegistry};

/// All reconciled records of one use case, with the schema snapshot the
/// report is rendered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCaseReport {
    /// Use case identifier.
    pub process_type_id: ProcessTypeId,
    /// Use case display name.
    pub name: String,
    /// Attribute columns, in schema order.
    pub attributes: Vec<AttributeSpec>,
    /// Record verdicts, in batch order.
    pub records: Vec<RecordVerdict>,
}

/// Group verdicts by use case, ascending by process type id.
///
/// Records keep their batch order within each group. A use case with no
/// records produces no report.
pub fn group_verdicts(
    registry: &SchemaRegistry,
    verdicts: Vec<RecordVerdict>,
) -> Vec<UseCaseReport> {
    let mut grouped: BTreeMap<ProcessTypeId, Vec<RecordVerdict>> = BTreeMap::new();
    for verdict in verdicts {
        grouped
            .entry(verdict.process_type_id)
            .or_default()
            .push(verdict);
    }

    let mut reports = Vec::with_capacity(grouped.len());
    for (id, records) in grouped {
        // Verdicts only exist for process types the registry resolved.
        if let Some(schema) = registry.get(id) {
            reports.push(UseCaseReport {
                process_type_id: id,
                name: schema.name.clone(),
                attributes: schema.attributes.clone(),
                records,
            });
        }
    }
    reports
}
