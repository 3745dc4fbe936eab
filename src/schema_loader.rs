//! Optional JSON Schema validation for OSCAL documents.
//!
//! Parsing in `catalog::model` and `component::model` is deliberately lenient;
//! callers that want a strict gate load the published OSCAL schema for the
//! document type and check raw JSON before handing it to the parser.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// A compiled schema plus what could be read from its `$id`.
pub struct DocumentSchema {
    /// OSCAL model version embedded in `$id`, when it follows the
    /// `.../ns/oscal/<version>/...` convention.
    pub oscal_version: Option<String>,
    root_key: Option<String>,
    compiled: JSONSchema,
}

/// Controls how a schema is checked before compilation.
#[derive(Clone, Copy, Debug, Default)]
pub struct SchemaLoadOptions<'a> {
    /// Top-level property the schema must declare (`catalog`,
    /// `component-definition`). Loading fails when it is missing, so a
    /// catalog schema cannot silently be used to check components.
    pub root_key: Option<&'a str>,
}

impl DocumentSchema {
    pub fn load(path: &Path, options: SchemaLoadOptions<'_>) -> Result<Self> {
        let schema: Value = serde_json::from_reader(
            File::open(path).with_context(|| format!("opening schema {}", path.display()))?,
        )
        .with_context(|| format!("parsing schema {}", path.display()))?;
        Self::from_value(&schema, options).with_context(|| format!("loading schema {}", path.display()))
    }

    pub fn from_value(schema: &Value, options: SchemaLoadOptions<'_>) -> Result<Self> {
        if let Some(root_key) = options.root_key {
            if schema.pointer(&format!("/properties/{root_key}")).is_none() {
                bail!("schema does not declare top-level '{root_key}'");
            }
        }

        let compiled = JSONSchema::compile(schema).map_err(|err| anyhow!("compiling schema: {err}"))?;
        let oscal_version = schema
            .get("$id")
            .and_then(Value::as_str)
            .and_then(extract_oscal_version);
        debug!(?oscal_version, root_key = ?options.root_key, "compiled document schema");

        Ok(Self {
            oscal_version,
            root_key: options.root_key.map(str::to_string),
            compiled,
        })
    }

    pub fn is_valid(&self, document: &Value) -> bool {
        self.compiled.is_valid(document)
    }

    /// Fails with every violation, one per line, prefixed by its instance
    /// path.
    pub fn validate(&self, document: &Value) -> Result<()> {
        if let Err(errors) = self.compiled.validate(document) {
            let details = errors
                .map(|err| format!("{}: {err}", display_path(&err.instance_path.to_string())))
                .collect::<Vec<_>>()
                .join("\n");
            match &self.root_key {
                Some(root) => bail!("{root} document failed schema validation:\n{details}"),
                None => bail!("document failed schema validation:\n{details}"),
            }
        }
        Ok(())
    }
}

fn display_path(pointer: &str) -> &str {
    if pointer.is_empty() { "/" } else { pointer }
}

fn extract_oscal_version(id: &str) -> Option<String> {
    let (_, rest) = id.split_once("/oscal/")?;
    let version = rest.split('/').next()?;
    if !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn catalog_schema() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "$id": "http://csrc.nist.gov/ns/oscal/1.1.2/oscal-catalog-schema.json",
            "type": "object",
            "required": ["catalog"],
            "properties": {
                "catalog": {
                    "type": "object",
                    "required": ["uuid", "metadata"],
                    "properties": {"uuid": {"type": "string"}}
                }
            }
        })
    }

    #[test]
    fn reads_version_and_validates() -> Result<()> {
        let schema = DocumentSchema::from_value(
            &catalog_schema(),
            SchemaLoadOptions {
                root_key: Some("catalog"),
            },
        )?;
        assert_eq!(schema.oscal_version.as_deref(), Some("1.1.2"));
        assert!(schema.is_valid(&json!({"catalog": {"uuid": "x", "metadata": {}}})));

        let err = schema
            .validate(&json!({"catalog": {"uuid": 7}}))
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("catalog document failed schema validation"));
        assert!(err.contains("/catalog/uuid"));
        Ok(())
    }

    #[test]
    fn root_key_mismatch_is_rejected() {
        let result = DocumentSchema::from_value(
            &catalog_schema(),
            SchemaLoadOptions {
                root_key: Some("component-definition"),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn loads_from_disk() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{}", catalog_schema())?;
        let schema = DocumentSchema::load(file.path(), SchemaLoadOptions::default())?;
        assert!(!schema.is_valid(&json!({})));
        Ok(())
    }

    #[test]
    fn version_extraction_requires_oscal_namespace() {
        assert_eq!(extract_oscal_version("https://example.org/schema.json"), None);
        assert_eq!(
            extract_oscal_version("http://csrc.nist.gov/ns/oscal/1.0.4/x.json").as_deref(),
            Some("1.0.4")
        );
    }
}
