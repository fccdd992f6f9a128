//! Use-case schema types and registry.
//!
//! Every feedback record belongs to a use case, identified by its
//! `ProcessTypeId`. A [`UseCaseSchema`] declares, per use case:
//! - which attributes of the JSON payloads take part in reconciliation,
//! - the display title of each attribute,
//! - the [`EqualityPolicy`] used to compare reference and AI values,
//! - the [`RowShape`] of the export rows the use case was captured from.
//!
//! Schemas are loaded from TOML files by [`loader`] and collected into a
//! [`SchemaRegistry`]. The registry is validated on construction; a run never
//! starts with a registry that has no use cases at all, duplicate use cases,
//! duplicate attribute keys, or a use case without attributes.

pub mod loader;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::record::ProcessTypeId;

// ============================================================================
// Vocabulary
// ============================================================================

/// Comparison policy for a single attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqualityPolicy {
    /// Byte equality after trimming surrounding whitespace.
    Exact,
    /// Equality after trimming and Unicode lowercasing.
    CaseInsensitive,
    /// Numeric equality within an absolute tolerance.
    ///
    /// Both sides are parsed as floating point numbers after trimming. When
    /// either side does not parse, the comparison falls back to the exact
    /// rule for that pair.
    Numeric {
        /// Maximum absolute difference still considered a match.
        tolerance: f64,
    },
}

impl EqualityPolicy {
    /// Get the policy name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EqualityPolicy::Exact => "exact",
            EqualityPolicy::CaseInsensitive => "case_insensitive",
            EqualityPolicy::Numeric { .. } => "numeric",
        }
    }
}

impl std::fmt::Display for EqualityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shape of the export rows a use case was captured from.
///
/// Document rows carry two JSON payloads (`InitialData` and `Data`) that are
/// compared attribute by attribute. Assistant rows carry a satisfaction flag
/// and free-text question/answer columns; the source adapter lifts them into
/// the same two-payload form so the rest of the pipeline never branches on
/// shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowShape {
    /// Document extraction rows with `InitialData` / `Data` payload columns.
    Document,
    /// Conversational assistant rows with `Query` / `AnswerAI` /
    /// `UserSatisfactory` columns.
    Assistant,
}

impl RowShape {
    /// Get the shape name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RowShape::Document => "document",
            RowShape::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for RowShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for RowShape {
    fn default() -> Self {
        RowShape::Document
    }
}

// ============================================================================
// Schema types
// ============================================================================

/// One reconciled attribute of a use case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Key looked up in both JSON payloads.
    pub key: String,
    /// Display title used in reports. Defaults to the key.
    pub title: String,
    /// How reference and AI values are compared.
    pub policy: EqualityPolicy,
}

impl AttributeSpec {
    /// Create an attribute compared with the exact policy.
    pub fn exact(key: impl Into<String>) -> Self {
        let key = key.into();
        AttributeSpec {
            title: key.clone(),
            key,
            policy: EqualityPolicy::Exact,
        }
    }

    /// Replace the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Replace the equality policy.
    pub fn with_policy(mut self, policy: EqualityPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Reconciliation schema for one use case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCaseSchema {
    /// Use case identifier, matched against the `ProcessTypeId` column.
    pub process_type_id: ProcessTypeId,
    /// Human-readable use case name.
    pub name: String,
    /// Shape of the export rows this use case produces.
    #[serde(default)]
    pub shape: RowShape,
    /// Attributes taking part in reconciliation, in report column order.
    pub attributes: Vec<AttributeSpec>,
}

// ============================================================================
// Registry
// ============================================================================

/// Validated collection of use-case schemas, ordered by process type.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: BTreeMap<ProcessTypeId, UseCaseSchema>,
}

impl SchemaRegistry {
    /// Build a registry from schemas, rejecting invalid configurations.
    ///
    /// Fails when the list is empty, a process type appears twice, a use
    /// case has no attributes, or a use case declares the same attribute key
    /// more than once. An empty configuration is run-fatal here so embedders
    /// get the same guarantee as the TOML loader.
    pub fn from_schemas(schemas: Vec<UseCaseSchema>) -> SchemaResult<Self> {
        if schemas.is_empty() {
            return Err(SchemaError::NoUseCases);
        }
        let mut map = BTreeMap::new();
        for schema in schemas {
            let id = schema.process_type_id;
            if schema.attributes.is_empty() {
                return Err(SchemaError::EmptyAttributes { id });
            }
            let mut seen = std::collections::BTreeSet::new();
            for attr in &schema.attributes {
                if !seen.insert(attr.key.clone()) {
                    return Err(SchemaError::DuplicateAttribute {
                        id,
                        key: attr.key.clone(),
                    });
                }
            }
            if map.insert(id, schema).is_some() {
                return Err(SchemaError::DuplicateProcessType { id });
            }
        }
        Ok(SchemaRegistry { schemas: map })
    }

    /// Look up the schema for a process type.
    pub fn get(&self, id: ProcessTypeId) -> Option<&UseCaseSchema> {
        self.schemas.get(&id)
    }

    /// Number of registered use cases.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry holds no schemas.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Iterate schemas in ascending process type order.
    pub fn iter(&self) -> impl Iterator<Item = &UseCaseSchema> {
        self.schemas.values()
    }
}
