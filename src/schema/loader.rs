//! TOML loader for use-case schemas.
//!
//! Reads every `*.toml` file in a directory, one use case per file:
//!
//! ```toml
//! process_type_id = 3
//! name = "Invoice extraction"
//! shape = "document"
//!
//! [[attributes]]
//! key = "Amount"
//! title = "Invoice amount"
//! policy = "numeric"
//! tolerance = 0.01
//! ```
//!
//! `title` defaults to the key, `policy` defaults to `"exact"` and `shape`
//! defaults to `"document"`. Files are read in lexicographic order and the
//! resulting registry is validated before any feedback row is touched.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{SchemaError, SchemaResult};
use crate::record::ProcessTypeId;
use crate::schema::{AttributeSpec, EqualityPolicy, RowShape, SchemaRegistry, UseCaseSchema};

// Raw deserialization targets. Policy strings are validated during
// conversion so errors name the offending attribute, not a serde path.

#[derive(Debug, Deserialize)]
struct RawUseCase {
    process_type_id: u32,
    name: String,
    #[serde(default)]
    shape: RowShape,
    #[serde(default)]
    attributes: Vec<RawAttribute>,
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    key: String,
    title: Option<String>,
    policy: Option<String>,
    tolerance: Option<f64>,
}

/// Load and validate every use-case schema in a directory.
///
/// Fails when the directory cannot be read, contains no TOML files, or any
/// file is invalid.
pub fn load_dir(dir: &Path) -> SchemaResult<SchemaRegistry> {
    let mut paths = list_schema_files(dir)?;
    paths.sort();
    if paths.is_empty() {
        return Err(SchemaError::NoSchemas {
            dir: dir.display().to_string(),
        });
    }

    let mut schemas = Vec::with_capacity(paths.len());
    for path in &paths {
        let schema = load_file(path)?;
        debug!(
            path = %path.display(),
            process_type_id = %schema.process_type_id,
            shape = %schema.shape,
            attributes = schema.attributes.len(),
            "Loaded use-case schema"
        );
        schemas.push(schema);
    }

    let registry = SchemaRegistry::from_schemas(schemas)?;
    info!(
        dir = %dir.display(),
        use_cases = registry.len(),
        "Schema registry ready"
    );
    Ok(registry)
}

/// Load a single use-case schema file.
pub fn load_file(path: &Path) -> SchemaResult<UseCaseSchema> {
    let text = fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let raw: RawUseCase = toml::from_str(&text).map_err(|source| SchemaError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    convert(raw)
}

fn list_schema_files(dir: &Path) -> SchemaResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| SchemaError::Read {
        path: dir.display().to_string(),
        source,
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SchemaError::Read {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);
        if path.is_file() && is_toml {
            paths.push(path);
        }
    }
    Ok(paths)
}

fn convert(raw: RawUseCase) -> SchemaResult<UseCaseSchema> {
    let mut attributes = Vec::with_capacity(raw.attributes.len());
    for attr in raw.attributes {
        attributes.push(convert_attribute(attr)?);
    }
    Ok(UseCaseSchema {
        process_type_id: ProcessTypeId(raw.process_type_id),
        name: raw.name,
        shape: raw.shape,
        attributes,
    })
}

fn convert_attribute(raw: RawAttribute) -> SchemaResult<AttributeSpec> {
    let policy_name = raw.policy.unwrap_or_else(|| "exact".to_string());
    let policy = match policy_name.to_lowercase().as_str() {
        "exact" => EqualityPolicy::Exact,
        "case_insensitive" => EqualityPolicy::CaseInsensitive,
        "numeric" => EqualityPolicy::Numeric {
            tolerance: raw.tolerance.unwrap_or(0.0),
        },
        _ => {
            return Err(SchemaError::UnknownPolicy {
                key: raw.key,
                policy: policy_name,
            })
        }
    };
    if raw.tolerance.is_some() && !matches!(policy, EqualityPolicy::Numeric { .. }) {
        return Err(SchemaError::ToleranceNotAllowed {
            key: raw.key,
            policy: policy_name,
        });
    }
    Ok(AttributeSpec {
        title: raw.title.unwrap_or_else(|| raw.key.clone()),
        key: raw.key,
        policy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> SchemaResult<UseCaseSchema> {
        let raw: RawUseCase = toml::from_str(text).expect("test TOML must parse");
        convert(raw)
    }

    #[test]
    fn test_convert_full_schema() {
        let schema = parse(
            r#"
            process_type_id = 3
            name = "Invoice extraction"
            shape = "document"

            [[attributes]]
            key = "Supplier"

            [[attributes]]
            key = "Amount"
            title = "Invoice amount"
            policy = "numeric"
            tolerance = 0.01
            "#,
        )
        .unwrap();

        assert_eq!(schema.process_type_id, ProcessTypeId(3));
        assert_eq!(schema.name, "Invoice extraction");
        assert_eq!(schema.shape, RowShape::Document);
        assert_eq!(schema.attributes.len(), 2);
        assert_eq!(schema.attributes[0].key, "Supplier");
        assert_eq!(schema.attributes[0].title, "Supplier");
        assert_eq!(schema.attributes[0].policy, EqualityPolicy::Exact);
        assert_eq!(schema.attributes[1].title, "Invoice amount");
        assert_eq!(
            schema.attributes[1].policy,
            EqualityPolicy::Numeric { tolerance: 0.01 }
        );
    }

    #[test]
    fn test_convert_defaults() {
        let schema = parse(
            r#"
            process_type_id = 8
            name = "Assistant"

            [[attributes]]
            key = "UserSatisfactory"
            policy = "case_insensitive"
            "#,
        )
        .unwrap();

        assert_eq!(schema.shape, RowShape::Document);
        assert_eq!(schema.attributes[0].policy, EqualityPolicy::CaseInsensitive);
    }

    #[test]
    fn test_convert_assistant_shape() {
        let schema = parse(
            r#"
            process_type_id = 11
            name = "Support chat"
            shape = "assistant"

            [[attributes]]
            key = "UserSatisfactory"
            "#,
        )
        .unwrap();
        assert_eq!(schema.shape, RowShape::Assistant);
    }

    #[test]
    fn test_convert_numeric_without_tolerance() {
        let schema = parse(
            r#"
            process_type_id = 1
            name = "Totals"

            [[attributes]]
            key = "Total"
            policy = "numeric"
            "#,
        )
        .unwrap();
        assert_eq!(
            schema.attributes[0].policy,
            EqualityPolicy::Numeric { tolerance: 0.0 }
        );
    }

    #[test]
    fn test_convert_policy_is_case_insensitive() {
        let schema = parse(
            r#"
            process_type_id = 1
            name = "Totals"

            [[attributes]]
            key = "Total"
            policy = "NUMERIC"
            "#,
        )
        .unwrap();
        assert_eq!(
            schema.attributes[0].policy,
            EqualityPolicy::Numeric { tolerance: 0.0 }
        );
    }

    #[test]
    fn test_convert_rejects_unknown_policy() {
        let result = parse(
            r#"
            process_type_id = 1
            name = "Bad"

            [[attributes]]
            key = "Answer"
            policy = "fuzzy"
            "#,
        );
        match result {
            Err(SchemaError::UnknownPolicy { key, policy }) => {
                assert_eq!(key, "Answer");
                assert_eq!(policy, "fuzzy");
            }
            other => panic!("Expected UnknownPolicy, got {:?}", other),
        }
    }

    #[test]
    fn test_convert_rejects_tolerance_on_exact_policy() {
        let result = parse(
            r#"
            process_type_id = 1
            name = "Bad"

            [[attributes]]
            key = "Answer"
            tolerance = 0.5
            "#,
        );
        match result {
            Err(SchemaError::ToleranceNotAllowed { key, policy }) => {
                assert_eq!(key, "Answer");
                assert_eq!(policy, "exact");
            }
            other => panic!("Expected ToleranceNotAllowed, got {:?}", other),
        }
    }
}
