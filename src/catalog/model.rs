//! Deserializable representation of an OSCAL catalog document.
//!
//! The types mirror the catalog JSON closely enough that both supported
//! dialects deserialize into the same structs: name/value pairs may arrive
//! under `props` (OSCAL 5.0) or `properties` (legacy ARS), and the document
//! may or may not be wrapped in a top-level `catalog` key. Unknown keys are
//! kept in `extra` so nothing is dropped if a caller re-serializes.

use crate::catalog::identity::CatalogDialect;
use crate::error::{BlueprintError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Full catalog: metadata, control families, and back matter.
pub struct Catalog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CatalogMetadata>,
    pub groups: Vec<Group>,
    #[serde(
        rename = "back-matter",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub back_matter: Option<BackMatter>,
    #[serde(skip)]
    pub dialect: CatalogDialect,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(
        rename = "oscal-version",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub oscal_version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Control family (e.g., `ac` / "Access Control").
pub struct Group {
    pub id: String,
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<Prop>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Prop>,
    #[serde(default)]
    pub controls: Vec<Control>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
/// One security control, possibly with nested enhancements.
pub struct Control {
    pub id: String,
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<Prop>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Prop>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<Control>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Recursive prose container (`statement`, `guidance`, `item`, ...).
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<Prop>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Prop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prose: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Part>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prop {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Control parameter: fixed values, a selection, or only a label.
pub struct Param {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Selection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Selection {
    #[serde(rename = "how-many", default, skip_serializing_if = "Option::is_none")]
    pub how_many: Option<String>,
    #[serde(default)]
    pub choice: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BackMatter {
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nodes that carry name/value pairs under either dialect key.
pub trait HasProps {
    fn props(&self) -> &[Prop];
    fn legacy_properties(&self) -> &[Prop];

    /// Value of the named property, checking `props` before `properties`.
    fn property(&self, name: &str) -> Option<&str> {
        self.props()
            .iter()
            .chain(self.legacy_properties())
            .find(|prop| prop.name == name)
            .map(|prop| prop.value.as_str())
    }

    fn has_any_props(&self) -> bool {
        !self.props().is_empty() || !self.legacy_properties().is_empty()
    }
}

macro_rules! impl_has_props {
    ($($ty:ty),*) => {
        $(impl HasProps for $ty {
            fn props(&self) -> &[Prop] {
                &self.props
            }

            fn legacy_properties(&self) -> &[Prop] {
                &self.properties
            }
        })*
    };
}

impl_has_props!(Group, Control, Part);

impl Control {
    /// The first direct part with the given name (`statement`, `guidance`).
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.name == name)
    }

    /// Resolved `label`, falling back to the title.
    pub fn label(&self) -> Result<String> {
        if let Some(label) = self.property("label") {
            return Ok(label.to_string());
        }
        if !self.has_any_props() {
            warn!(control_id = %self.id, "control has neither props nor properties; label falls back to title");
        }
        if self.title.trim().is_empty() {
            return Err(BlueprintError::SchemaDialect {
                control_id: self.id.clone(),
                field: "label".to_string(),
            });
        }
        Ok(self.title.clone())
    }

    /// Resolved `sort-id`, falling back per dialect.
    pub fn sort_id(&self, dialect: CatalogDialect) -> Result<String> {
        if let Some(sort_id) = self.property("sort-id") {
            return Ok(sort_id.to_string());
        }
        let fallback = dialect.sort_id_fallback(&self.id, &self.title);
        if fallback.trim().is_empty() {
            return Err(BlueprintError::SchemaDialect {
                control_id: self.id.clone(),
                field: "sort-id".to_string(),
            });
        }
        Ok(fallback)
    }
}

impl Part {
    /// Display label: the `label` property, else the part id.
    pub fn display_label(&self) -> String {
        self.property("label")
            .map(str::to_string)
            .or_else(|| self.id.clone())
            .unwrap_or_default()
    }
}

impl Catalog {
    pub fn title(&self) -> &str {
        self.metadata
            .as_ref()
            .map(|meta| meta.title.as_str())
            .unwrap_or_default()
    }

    /// Every control in document order, parents before their enhancements.
    pub fn controls_recursive(&self) -> Vec<&Control> {
        fn walk<'a>(control: &'a Control, acc: &mut Vec<&'a Control>) {
            acc.push(control);
            for child in &control.controls {
                walk(child, acc);
            }
        }

        let mut acc = Vec::new();
        for group in &self.groups {
            for control in &group.controls {
                walk(control, &mut acc);
            }
        }
        acc
    }
}

/// Parse a catalog from raw JSON bytes.
///
/// Accepts the unwrapped catalog object first and falls back to a
/// `{"catalog": {...}}` wrapper. The dialect is detected once here.
pub fn parse_catalog(bytes: &[u8]) -> Result<Catalog> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|err| BlueprintError::catalog_load(format!("invalid JSON: {err}")))?;
    parse_catalog_value(value)
}

/// Parse a catalog from an already-decoded JSON value.
pub fn parse_catalog_value(value: Value) -> Result<Catalog> {
    if !value.is_object() {
        return Err(BlueprintError::catalog_load("expected a JSON object"));
    }

    let mut catalog = match serde_json::from_value::<Catalog>(value.clone()) {
        Ok(catalog) => catalog,
        Err(unwrapped_err) => {
            let Some(inner) = value.get("catalog") else {
                return Err(BlueprintError::catalog_load(format!(
                    "missing 'catalog' key and not an unwrapped catalog ({unwrapped_err})"
                )));
            };
            serde_json::from_value::<Catalog>(inner.clone()).map_err(|wrapped_err| {
                BlueprintError::catalog_load(format!(
                    "unwrapped shape: {unwrapped_err}; wrapped shape: {wrapped_err}"
                ))
            })?
        }
    };

    catalog.dialect = detect_dialect(&catalog);
    debug!(
        dialect = catalog.dialect.as_str(),
        groups = catalog.groups.len(),
        "parsed catalog"
    );
    Ok(catalog)
}

/// Read and parse a catalog from disk.
pub fn load_catalog_from_path(path: &Path) -> anyhow::Result<Catalog> {
    use anyhow::Context;

    let data = fs::read(path).with_context(|| format!("reading catalog {}", path.display()))?;
    let catalog = parse_catalog(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(catalog)
}

fn detect_dialect(catalog: &Catalog) -> CatalogDialect {
    fn part_uses_legacy(part: &Part) -> bool {
        !part.properties.is_empty() || part.parts.iter().any(part_uses_legacy)
    }

    let legacy = catalog.groups.iter().any(|group| !group.properties.is_empty())
        || catalog.controls_recursive().into_iter().any(|control| {
            !control.properties.is_empty() || control.parts.iter().any(part_uses_legacy)
        });
    if legacy {
        CatalogDialect::Legacy
    } else {
        CatalogDialect::Oscal50
    }
}
