//! Project-side bookkeeping around catalog controls.
//!
//! A project binds one catalog version and a set of components. Each catalog
//! control gets a [`ProjectControl`] row when the project is created; rows are
//! mutated by status updates and never removed on their own.

use crate::catalog::{CatalogNavigator, CatalogVersion};
use crate::component::ComponentId;
use crate::config::BlueprintConfig;
use crate::error::{BlueprintError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub acronym: String,
    pub catalog_version: CatalogVersion,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    #[default]
    NotStarted,
    Incomplete,
    Complete,
    NotApplicable,
}

impl ControlStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlStatus::NotStarted => "not_started",
            ControlStatus::Incomplete => "incomplete",
            ControlStatus::Complete => "complete",
            ControlStatus::NotApplicable => "not_applicable",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "not_started" => Ok(ControlStatus::NotStarted),
            "incomplete" => Ok(ControlStatus::Incomplete),
            "complete" => Ok(ControlStatus::Complete),
            "not_applicable" => Ok(ControlStatus::NotApplicable),
            other => Err(BlueprintError::Validation(format!(
                "unknown control status '{other}' (expected not_started|incomplete|complete|not_applicable)"
            ))),
        }
    }
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project x control association.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectControl {
    pub control_id: String,
    #[serde(default)]
    pub status: ControlStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Attached components whose narrative is hidden for this control.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub disabled_narratives: BTreeSet<ComponentId>,
}

impl ProjectControl {
    pub fn new(control_id: impl Into<String>) -> Self {
        Self {
            control_id: control_id.into(),
            status: ControlStatus::NotStarted,
            remarks: None,
            disabled_narratives: BTreeSet::new(),
        }
    }

    pub fn set_status(&mut self, status: ControlStatus) {
        self.status = status;
    }

    /// Empty or whitespace-only remarks clear the field.
    pub fn set_remarks(&mut self, remarks: Option<&str>) {
        self.remarks = remarks
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
    }

    pub fn disable_narrative(&mut self, component: ComponentId) -> bool {
        self.disabled_narratives.insert(component)
    }

    pub fn enable_narrative(&mut self, component: &ComponentId) -> bool {
        self.disabled_narratives.remove(component)
    }

    pub fn is_narrative_enabled(&self, component: &ComponentId) -> bool {
        !self.disabled_narratives.contains(component)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProjectProgress {
    pub completed: usize,
    pub total: usize,
}

/// One `not_started` row per catalog control, enhancements included.
pub fn seed_project_controls(navigator: &CatalogNavigator<'_>) -> Vec<ProjectControl> {
    let rows: Vec<ProjectControl> = navigator
        .list_control_ids(true)
        .into_iter()
        .map(ProjectControl::new)
        .collect();
    debug!(rows = rows.len(), "seeded project controls");
    rows
}

pub fn progress(rows: &[ProjectControl]) -> ProjectProgress {
    ProjectProgress {
        completed: rows
            .iter()
            .filter(|row| row.status == ControlStatus::Complete)
            .count(),
        total: rows.len(),
    }
}

/// Title of the private "this system" component for a project.
pub fn private_component_title(project_title: &str, config: &BlueprintConfig) -> String {
    format!("{project_title}{}", config.private_component_suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog_value;
    use serde_json::json;

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!(
            ControlStatus::parse("not_applicable").unwrap(),
            ControlStatus::NotApplicable
        );
        assert_eq!(ControlStatus::Complete.to_string(), "complete");
        let err = ControlStatus::parse("done").unwrap_err();
        assert!(matches!(err, BlueprintError::Validation(_)));
    }

    #[test]
    fn seeding_covers_nested_controls_and_progress_counts_complete() {
        let catalog = parse_catalog_value(json!({"groups": [{
            "id": "ac", "title": "Access Control",
            "controls": [
                {"id": "ac-1", "title": "Policy"},
                {"id": "ac-2", "title": "Accounts", "controls": [{"id": "ac-2.1", "title": "Automated"}]}
            ]
        }]}))
        .unwrap();
        let nav = CatalogNavigator::new(&catalog).unwrap();
        let mut rows = seed_project_controls(&nav);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.status == ControlStatus::NotStarted));

        rows[0].set_status(ControlStatus::Complete);
        rows[2].set_status(ControlStatus::Incomplete);
        assert_eq!(
            progress(&rows),
            ProjectProgress {
                completed: 1,
                total: 3
            }
        );
    }

    #[test]
    fn narratives_toggle_per_component() {
        let mut row = ProjectControl::new("ac-1");
        let ociso = ComponentId::from("ociso");
        assert!(row.is_narrative_enabled(&ociso));
        assert!(row.disable_narrative(ociso.clone()));
        assert!(!row.disable_narrative(ociso.clone()));
        assert!(!row.is_narrative_enabled(&ociso));
        assert!(row.enable_narrative(&ociso));
        assert!(row.is_narrative_enabled(&ociso));

        row.set_remarks(Some("  "));
        assert_eq!(row.remarks, None);
        row.set_remarks(Some("reviewed"));
        assert_eq!(row.remarks.as_deref(), Some("reviewed"));
    }

    #[test]
    fn private_title_uses_configured_suffix() {
        let config = BlueprintConfig::default();
        assert_eq!(private_component_title("Rover", &config), "Rover private");
    }
}
