//! Read and edit the implemented requirements of one component.
//!
//! The extractor borrows a parsed [`ComponentDefinition`]. Reads hand back
//! references into it; edits clone the definition, apply exactly one change,
//! and return the new value. The borrowed original is never touched, so a
//! rejected edit leaves the caller's document exactly as it was. Writing the
//! result back to storage (and serializing concurrent writers) belongs to the
//! caller.

use crate::component::identity::Responsibility;
use crate::component::model::{
    Component, ComponentDefinition, ControlImplementation, ImplementedRequirement, PROVIDER_PROP,
    RESPONSIBILITY_PROP,
};
use crate::config::BlueprintConfig;
use crate::error::{BlueprintError, Result};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

pub const MULTIPLE_CONTROLS_MESSAGE: &str = "updating multiple controls is not supported";

/// A requirement to add. Responsibility and provider fall back to the
/// configured defaults when left unset.
#[derive(Clone, Debug, Default)]
pub struct RequirementDraft {
    pub control_id: String,
    pub description: String,
    pub responsibility: Option<Responsibility>,
    pub provider: Option<String>,
}

impl RequirementDraft {
    pub fn new(control_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            control_id: control_id.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn responsibility(mut self, responsibility: Responsibility) -> Self {
        self.responsibility = Some(responsibility);
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// Per-control narrative as listed in a component summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequirementSummary {
    pub narrative: String,
    pub responsibility: Option<Responsibility>,
    pub provider: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentSummary {
    pub title: String,
    pub description: String,
    /// Catalog version of the selected control implementation.
    pub standard: String,
    pub source: String,
    pub controls: BTreeMap<String, RequirementSummary>,
}

/// Fields a persistence layer derives from a component document on save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DerivedFields {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub controls: Vec<String>,
    pub supported_catalog_versions: Vec<String>,
}

#[derive(Clone, Copy, Debug)]
pub struct ComponentExtractor<'a> {
    definition: &'a ComponentDefinition,
    index: usize,
}

impl<'a> ComponentExtractor<'a> {
    /// Extractor over the first component in the definition.
    pub fn new(definition: &'a ComponentDefinition) -> Result<Self> {
        Self::for_component(definition, 0)
    }

    pub fn for_component(definition: &'a ComponentDefinition, index: usize) -> Result<Self> {
        if index >= definition.components.len() {
            return Err(BlueprintError::component_load(format!(
                "component index {index} out of range ({} components)",
                definition.components.len()
            )));
        }
        Ok(Self { definition, index })
    }

    pub fn definition(&self) -> &'a ComponentDefinition {
        self.definition
    }

    pub fn component(&self) -> &'a Component {
        &self.definition.components[self.index]
    }

    /// Every catalog version this component has narratives for.
    pub fn supported_catalog_versions(&self) -> Vec<String> {
        self.component()
            .control_implementations
            .iter()
            .map(|ci| ci.description.clone())
            .collect()
    }

    /// The implementation for `catalog_version`, or the first one when no
    /// version is given.
    pub fn implementation(&self, catalog_version: Option<&str>) -> Option<&'a ControlImplementation> {
        let implementations = &self.component().control_implementations;
        match catalog_version {
            Some(version) => implementations.iter().find(|ci| ci.matches_version(version)),
            None => implementations.first(),
        }
    }

    pub fn list_requirements(&self, catalog_version: Option<&str>) -> &'a [ImplementedRequirement] {
        self.implementation(catalog_version)
            .map(|ci| ci.implemented_requirements.as_slice())
            .unwrap_or_default()
    }

    pub fn get_requirement(
        &self,
        control_id: &str,
        catalog_version: Option<&str>,
    ) -> Result<&'a ImplementedRequirement> {
        self.implementation(catalog_version)
            .and_then(|ci| ci.requirement(control_id))
            .ok_or_else(|| BlueprintError::requirement_not_found(control_id, catalog_version))
    }

    /// Append a requirement; fails if the control already has one for this
    /// catalog version. A missing implementation for an explicit version is
    /// created.
    pub fn add_requirement(
        &self,
        draft: RequirementDraft,
        catalog_version: Option<&str>,
        config: &BlueprintConfig,
    ) -> Result<ComponentDefinition> {
        if self.get_requirement(&draft.control_id, catalog_version).is_ok() {
            return Err(BlueprintError::DuplicateRequirement {
                control_id: draft.control_id,
                catalog_version: catalog_version.map(str::to_string),
            });
        }

        let mut updated = self.definition.clone();
        let component = &mut updated.components[self.index];
        let ci_idx = match position_for(component, catalog_version) {
            Some(idx) => idx,
            None => {
                let Some(version) = catalog_version else {
                    return Err(BlueprintError::Validation(
                        "component has no control implementations; a catalog version is required"
                            .to_string(),
                    ));
                };
                component
                    .control_implementations
                    .push(new_implementation(component.uuid.as_deref(), version));
                component.control_implementations.len() - 1
            }
        };

        let implementation = &mut component.control_implementations[ci_idx];
        let requirement = build_requirement(implementation.uuid.as_deref(), draft, config);
        info!(
            component = %component.title,
            control_id = %requirement.control_id,
            catalog_version = %implementation.description,
            "adding implemented requirement"
        );
        implementation.implemented_requirements.push(requirement);
        Ok(updated)
    }

    /// Replace the narrative of an existing requirement in place.
    pub fn update_requirement(
        &self,
        control_id: &str,
        description: &str,
        catalog_version: Option<&str>,
    ) -> Result<ComponentDefinition> {
        let (mut updated, ci_idx, req_idx) = self.locate_for_edit(control_id, catalog_version)?;
        let component = &mut updated.components[self.index];
        component.control_implementations[ci_idx].implemented_requirements[req_idx].description =
            description.to_string();
        info!(component = %component.title, control_id, "updated implemented requirement");
        Ok(updated)
    }

    pub fn remove_requirement(
        &self,
        control_id: &str,
        catalog_version: Option<&str>,
    ) -> Result<ComponentDefinition> {
        let (mut updated, ci_idx, req_idx) = self.locate_for_edit(control_id, catalog_version)?;
        let component = &mut updated.components[self.index];
        component.control_implementations[ci_idx]
            .implemented_requirements
            .remove(req_idx);
        info!(component = %component.title, control_id, "removed implemented requirement");
        Ok(updated)
    }

    /// Apply a control-id to narrative map holding exactly one entry, adding
    /// the requirement or updating its narrative.
    pub fn apply_edits(
        &self,
        edits: &BTreeMap<String, String>,
        catalog_version: Option<&str>,
        config: &BlueprintConfig,
    ) -> Result<ComponentDefinition> {
        let mut entries = edits.iter();
        let (Some((control_id, narrative)), None) = (entries.next(), entries.next()) else {
            if edits.is_empty() {
                return Err(BlueprintError::Validation(
                    "no control narrative supplied".to_string(),
                ));
            }
            return Err(BlueprintError::Validation(MULTIPLE_CONTROLS_MESSAGE.to_string()));
        };

        match self.get_requirement(control_id, catalog_version) {
            Ok(_) => self.update_requirement(control_id, narrative, catalog_version),
            Err(err) if err.is_not_found() => self.add_requirement(
                RequirementDraft::new(control_id.as_str(), narrative.as_str()),
                catalog_version,
                config,
            ),
            Err(err) => Err(err),
        }
    }

    pub fn summary(&self, catalog_version: Option<&str>) -> ComponentSummary {
        let component = self.component();
        let implementation = self.implementation(catalog_version);
        let controls = self
            .list_requirements(catalog_version)
            .iter()
            .map(|req| {
                (
                    req.control_id.clone(),
                    RequirementSummary {
                        narrative: req.description.clone(),
                        responsibility: req.responsibility(),
                        provider: req.provider().map(str::to_string),
                    },
                )
            })
            .collect();

        ComponentSummary {
            title: component.title.clone(),
            description: component.description.clone(),
            standard: implementation
                .map(|ci| ci.description.clone())
                .unwrap_or_default(),
            source: implementation.map(|ci| ci.source.clone()).unwrap_or_default(),
            controls,
        }
    }

    fn locate_for_edit(
        &self,
        control_id: &str,
        catalog_version: Option<&str>,
    ) -> Result<(ComponentDefinition, usize, usize)> {
        let component = self.component();
        let located = position_for(component, catalog_version).and_then(|ci_idx| {
            component.control_implementations[ci_idx]
                .implemented_requirements
                .iter()
                .position(|req| req.control_id == control_id)
                .map(|req_idx| (ci_idx, req_idx))
        });
        match located {
            Some((ci_idx, req_idx)) => Ok((self.definition.clone(), ci_idx, req_idx)),
            None => Err(BlueprintError::requirement_not_found(
                control_id,
                catalog_version,
            )),
        }
    }
}

/// Description, type, addressed controls, and catalog versions of the first
/// component.
pub fn derive_fields(definition: &ComponentDefinition) -> Result<DerivedFields> {
    let extractor = ComponentExtractor::new(definition)?;
    let component = extractor.component();

    let mut controls: Vec<String> = Vec::new();
    for implementation in &component.control_implementations {
        for requirement in &implementation.implemented_requirements {
            if !controls.contains(&requirement.control_id) {
                controls.push(requirement.control_id.clone());
            }
        }
    }

    Ok(DerivedFields {
        description: component.description.clone(),
        kind: component.kind.to_lowercase(),
        controls,
        supported_catalog_versions: extractor.supported_catalog_versions(),
    })
}

/// Empty "this system" component a new project starts with.
pub fn create_private_component(
    project_title: &str,
    catalog_version: &str,
    config: &BlueprintConfig,
) -> ComponentDefinition {
    let title = crate::project::private_component_title(project_title, config);
    let definition_uuid = derive_uuid(None, &format!("component-definition:{title}"));
    let component_uuid = derive_uuid(Some(definition_uuid.as_str()), &format!("component:{title}"));

    ComponentDefinition {
        uuid: Some(definition_uuid),
        metadata: Some(json!({"title": title, "version": "0.1"})),
        components: vec![Component {
            uuid: Some(component_uuid.clone()),
            kind: "this-system".to_string(),
            title: title.clone(),
            description: format!("{project_title} default system component"),
            control_implementations: vec![new_implementation(Some(component_uuid.as_str()), catalog_version)],
            extra: Map::new(),
        }],
        extra: Map::new(),
    }
}

fn position_for(component: &Component, catalog_version: Option<&str>) -> Option<usize> {
    match catalog_version {
        Some(version) => component
            .control_implementations
            .iter()
            .position(|ci| ci.matches_version(version)),
        None if component.control_implementations.is_empty() => None,
        None => Some(0),
    }
}

fn new_implementation(parent_uuid: Option<&str>, catalog_version: &str) -> ControlImplementation {
    ControlImplementation {
        uuid: Some(derive_uuid(
            parent_uuid,
            &format!("control-implementation:{catalog_version}"),
        )),
        source: catalog_version.to_string(),
        description: catalog_version.to_string(),
        implemented_requirements: Vec::new(),
        extra: Map::new(),
    }
}

fn build_requirement(
    parent_uuid: Option<&str>,
    draft: RequirementDraft,
    config: &BlueprintConfig,
) -> ImplementedRequirement {
    let mut requirement = ImplementedRequirement {
        uuid: Some(derive_uuid(
            parent_uuid,
            &format!("implemented-requirement:{}", draft.control_id),
        )),
        control_id: draft.control_id,
        description: draft.description,
        props: Vec::new(),
        extra: Map::<String, Value>::new(),
    };
    let responsibility = draft
        .responsibility
        .unwrap_or_else(|| config.default_responsibility.clone());
    requirement.set_prop(RESPONSIBILITY_PROP, responsibility.as_str());
    let provider = draft
        .provider
        .unwrap_or_else(|| config.default_provider.clone());
    if !provider.is_empty() {
        requirement.set_prop(PROVIDER_PROP, &provider);
    }
    requirement
}

/// Deterministic v5 uuid scoped under the parent's uuid when it parses.
fn derive_uuid(parent_uuid: Option<&str>, name: &str) -> String {
    let namespace = parent_uuid
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .unwrap_or(Uuid::NAMESPACE_URL);
    Uuid::new_v5(&namespace, name.as_bytes()).to_string()
}
