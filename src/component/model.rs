//! Deserializable representation of an OSCAL component definition.
//!
//! Only the fields the extractor reads or writes are typed; everything else
//! rides along in `extra` so a mutated document serializes back with the same
//! shape it arrived in.

use crate::catalog::Prop;
use crate::component::identity::Responsibility;
use crate::error::{BlueprintError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Top-level key every component document must carry.
pub const COMPONENT_DEFINITION_KEY: &str = "component-definition";
/// Property holding an implemented requirement's responsibility.
pub const RESPONSIBILITY_PROP: &str = "security_control_type";
pub const PROVIDER_PROP: &str = "provider";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(
        rename = "control-implementations",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub control_implementations: Vec<ControlImplementation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Requirements for one catalog version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlImplementation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "implemented-requirements", default)]
    pub implemented_requirements: Vec<ImplementedRequirement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImplementedRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(rename = "control-id")]
    pub control_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<Prop>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ComponentDocument {
    #[serde(rename = "component-definition")]
    component_definition: ComponentDefinition,
}

impl ControlImplementation {
    /// True when this implementation targets `version` (by description or
    /// source).
    pub fn matches_version(&self, version: &str) -> bool {
        self.description == version || self.source == version
    }

    pub fn requirement(&self, control_id: &str) -> Option<&ImplementedRequirement> {
        self.implemented_requirements
            .iter()
            .find(|req| req.control_id == control_id)
    }
}

impl ImplementedRequirement {
    fn prop(&self, name: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|prop| prop.name == name)
            .map(|prop| prop.value.as_str())
    }

    /// The `security_control_type` property, when present.
    pub fn responsibility(&self) -> Option<Responsibility> {
        self.prop(RESPONSIBILITY_PROP).map(Responsibility::from_str)
    }

    pub fn provider(&self) -> Option<&str> {
        self.prop(PROVIDER_PROP)
    }

    /// Set (or replace) a named property, keeping other props in order.
    pub fn set_prop(&mut self, name: &str, value: &str) {
        match self.props.iter_mut().find(|prop| prop.name == name) {
            Some(prop) => prop.value = value.to_string(),
            None => self.props.push(Prop {
                name: name.to_string(),
                value: value.to_string(),
                extra: Map::new(),
            }),
        }
    }
}

impl ComponentDefinition {
    /// Wrap back into `{"component-definition": {...}}`.
    pub fn to_document_value(&self) -> serde_json::Result<Value> {
        let mut root = Map::new();
        root.insert(COMPONENT_DEFINITION_KEY.to_string(), serde_json::to_value(self)?);
        Ok(Value::Object(root))
    }

    pub fn to_document_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ComponentDocumentRef {
            component_definition: self,
        })
    }
}

#[derive(Serialize)]
struct ComponentDocumentRef<'a> {
    #[serde(rename = "component-definition")]
    component_definition: &'a ComponentDefinition,
}

/// Parse a component definition from raw JSON bytes.
pub fn parse_component(bytes: &[u8]) -> Result<ComponentDefinition> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|err| BlueprintError::component_load(format!("invalid JSON: {err}")))?;
    parse_component_value(value)
}

/// Parse a component definition from an already-decoded JSON value.
///
/// The `component-definition` key is mandatory.
pub fn parse_component_value(value: Value) -> Result<ComponentDefinition> {
    if value.get(COMPONENT_DEFINITION_KEY).is_none() {
        return Err(BlueprintError::component_load(format!(
            "missing '{COMPONENT_DEFINITION_KEY}' key"
        )));
    }
    let document: ComponentDocument = serde_json::from_value(value)
        .map_err(|err| BlueprintError::component_load(err.to_string()))?;
    let definition = document.component_definition;
    debug!(components = definition.components.len(), "parsed component definition");
    Ok(definition)
}

/// Read and parse a component definition from disk.
pub fn load_component_from_path(path: &Path) -> anyhow::Result<ComponentDefinition> {
    use anyhow::Context;

    let data = fs::read(path).with_context(|| format!("reading component {}", path.display()))?;
    let definition =
        parse_component(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "component-definition": {
                "uuid": "11111111-1111-4111-8111-111111111111",
                "metadata": {"title": "OCISO", "version": "1.0"},
                "components": [{
                    "uuid": "22222222-2222-4222-8222-222222222222",
                    "type": "Policy",
                    "title": "OCISO",
                    "description": "Office of the CISO inherited controls.",
                    "purpose": "shared services",
                    "control-implementations": [{
                        "uuid": "33333333-3333-4333-8333-333333333333",
                        "source": "https://example.org/ars-5.0.json",
                        "description": "CMS_ARS_5_0",
                        "implemented-requirements": [{
                            "uuid": "44444444-4444-4444-8444-444444444444",
                            "control-id": "ac-1",
                            "description": "OCISO maintains the policy.",
                            "props": [
                                {"name": "security_control_type", "value": "Inherited"},
                                {"name": "provider", "value": "Yes"}
                            ]
                        }]
                    }]
                }]
            }
        })
    }

    #[test]
    fn parses_and_reads_requirement_props() {
        let definition = parse_component_value(document()).unwrap();
        let component = &definition.components[0];
        assert_eq!(component.kind, "Policy");
        let implementation = &component.control_implementations[0];
        assert!(implementation.matches_version("CMS_ARS_5_0"));
        assert!(implementation.matches_version("https://example.org/ars-5.0.json"));
        let req = implementation.requirement("ac-1").unwrap();
        assert_eq!(req.responsibility(), Some(Responsibility::Inherited));
        assert_eq!(req.provider(), Some("Yes"));
    }

    #[test]
    fn missing_wrapper_key_is_load_error() {
        let err = parse_component(br#"{"components": []}"#).unwrap_err();
        assert!(matches!(
            err,
            BlueprintError::DocumentLoad { kind: "component", .. }
        ));
        assert!(parse_component(b"[1, 2").is_err());
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let original = document();
        let definition = parse_component_value(original.clone()).unwrap();
        assert_eq!(definition.to_document_value().unwrap(), original);
        let reparsed = parse_component(definition.to_document_string().unwrap().as_bytes()).unwrap();
        assert_eq!(reparsed, definition);
    }

    #[test]
    fn set_prop_replaces_or_appends() {
        let mut req: ImplementedRequirement =
            serde_json::from_value(json!({"control-id": "ac-2", "description": "x"})).unwrap();
        req.set_prop(RESPONSIBILITY_PROP, "Shared");
        req.set_prop(RESPONSIBILITY_PROP, "Hybrid");
        assert_eq!(req.props.len(), 1);
        assert_eq!(req.responsibility(), Some(Responsibility::Hybrid));
        assert_eq!(req.provider(), None);
    }

    #[test]
    fn sparse_document_keeps_its_shape() {
        let original = json!({
            "component-definition": {
                "components": [{
                    "title": "X",
                    "control-implementations": [{
                        "description": "V",
                        "implemented-requirements": [{"control-id": "ac-1"}]
                    }]
                }]
            }
        });
        let definition = parse_component_value(original.clone()).unwrap();
        assert_eq!(definition.to_document_value().unwrap(), original);
    }
}
