//! Per-control aggregation across the components attached to a project.
//!
//! For one control id the aggregator asks every attached component for its
//! narrative under the project's catalog version, buckets the answers into the
//! project's private narrative and the inherited ones, and rolls the
//! individual responsibilities up into a single verdict. A component that
//! does not address the control is skipped; that is the normal case, not an
//! error.

use crate::catalog::{CatalogNavigator, SimplifiedControl};
use crate::component::{
    ComponentDefinition, ComponentExtractor, ComponentId, ComponentStatus, Responsibility,
};
use crate::error::Result;
use crate::project::{ControlStatus, Project, ProjectControl};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A component attached to a project, with its parsed document.
#[derive(Clone, Copy, Debug)]
pub struct AttachedComponent<'a> {
    pub id: &'a ComponentId,
    pub title: &'a str,
    pub status: ComponentStatus,
    pub definition: &'a ComponentDefinition,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AggregatedControlView {
    pub responsibility: Responsibility,
    pub components: ComponentNarratives,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ComponentNarratives {
    /// Keyed by component title.
    pub inherited: BTreeMap<String, InheritedNarrative>,
    pub private: PrivateNarrative,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InheritedNarrative {
    pub description: String,
    pub responsibility: Responsibility,
    pub provider: Option<String>,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrivateNarrative {
    pub description: Option<String>,
    pub enabled: bool,
}

impl Default for PrivateNarrative {
    fn default() -> Self {
        Self {
            description: None,
            enabled: true,
        }
    }
}

/// Catalog half of the per-control detail: the simplified control plus the
/// catalog title it came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogControlData {
    #[serde(flatten)]
    pub control: SimplifiedControl,
    pub version: String,
}

/// Everything the presentation layer shows for one project control.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProjectControlView {
    pub control_id: String,
    pub status: ControlStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub catalog_data: CatalogControlData,
    pub component_data: AggregatedControlView,
}

/// Roll individual responsibilities into one verdict.
///
/// None -> `Allocated`; one -> that value; two or more -> `Hybrid`.
pub fn reduce_responsibility(values: &[Responsibility]) -> Responsibility {
    match values {
        [] => Responsibility::Allocated,
        [single] => single.clone(),
        _ => Responsibility::Hybrid,
    }
}

/// Merge every attached component's narrative for `control_id`.
///
/// `project_control` supplies the disabled-narrative set; without it every
/// narrative is enabled.
pub fn aggregate_control(
    control_id: &str,
    catalog_version: &str,
    components: &[AttachedComponent<'_>],
    project_control: Option<&ProjectControl>,
) -> AggregatedControlView {
    let mut narratives = ComponentNarratives::default();
    let mut responsibilities = Vec::new();
    let mut private_seen = false;

    for attached in components {
        let Ok(extractor) = ComponentExtractor::new(attached.definition) else {
            warn!(component = %attached.title, "component definition has no components; skipping");
            continue;
        };
        let requirement = match extractor.get_requirement(control_id, Some(catalog_version)) {
            Ok(requirement) => requirement,
            Err(_) => {
                debug!(
                    component = %attached.title,
                    bucket = attached.status.bucket(),
                    control_id,
                    "component does not address control"
                );
                continue;
            }
        };

        let responsibility = requirement.responsibility().unwrap_or_default();
        responsibilities.push(responsibility.clone());
        let enabled = project_control
            .map(|row| row.is_narrative_enabled(attached.id))
            .unwrap_or(true);

        match attached.status {
            ComponentStatus::System => {
                if private_seen {
                    warn!(
                        component = %attached.title,
                        control_id,
                        "more than one private component addresses this control; keeping the first"
                    );
                    continue;
                }
                private_seen = true;
                narratives.private = PrivateNarrative {
                    description: Some(requirement.description.clone()),
                    enabled,
                };
            }
            ComponentStatus::Public => {
                narratives.inherited.insert(
                    attached.title.to_string(),
                    InheritedNarrative {
                        description: requirement.description.clone(),
                        responsibility,
                        provider: requirement.provider().map(str::to_string),
                        enabled,
                    },
                );
            }
        }
    }

    AggregatedControlView {
        responsibility: reduce_responsibility(&responsibilities),
        components: narratives,
    }
}

/// Catalog data, status, and aggregated narratives for one project control.
pub fn project_control_view(
    project: &Project,
    navigator: &CatalogNavigator<'_>,
    row: &ProjectControl,
    components: &[AttachedComponent<'_>],
) -> Result<ProjectControlView> {
    let control = navigator.simplified_view(&row.control_id)?;
    let component_data = aggregate_control(
        &row.control_id,
        project.catalog_version.as_str(),
        components,
        Some(row),
    );

    Ok(ProjectControlView {
        control_id: row.control_id.clone(),
        status: row.status,
        remarks: row.remarks.clone(),
        catalog_data: CatalogControlData {
            control,
            version: navigator.catalog_title().to_string(),
        },
        component_data,
    })
}
