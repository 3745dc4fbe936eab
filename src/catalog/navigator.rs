//! Read-only traversal and lookup over a parsed catalog.
//!
//! The navigator borrows a [`Catalog`] and builds an id index once, rejecting
//! duplicate control ids the same way a malformed catalog would be rejected at
//! load time. Every query is dialect-agnostic: property reads go through
//! [`HasProps`](crate::catalog::HasProps), and the dialect recorded at parse time only decides fallbacks.

use crate::catalog::identity::{CatalogDialect, sort_control_ids};
use crate::catalog::model::{Catalog, Control, Group, Part, Resource};
use crate::error::{BlueprintError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// One labelled line of a control statement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatementLine {
    pub label: String,
    pub text: String,
}

/// Normalized per-control record consumed by the aggregator and callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimplifiedControl {
    pub label: String,
    pub sort_id: String,
    pub title: String,
    pub family: Option<String>,
    pub description: String,
    pub implementation: String,
    pub guidance: String,
    pub next_id: String,
}

/// Parameter values as presented to narrative authors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Values(Vec<String>),
    Selection { how_many: String, choices: Vec<String> },
    Label(Option<String>),
}

/// Derived fields a persistence layer stores per catalog control.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ControlRow {
    pub control_id: String,
    pub label: String,
    pub sort_id: String,
    pub title: String,
}

#[derive(Debug)]
pub struct CatalogNavigator<'a> {
    catalog: &'a Catalog,
    by_id: BTreeMap<&'a str, &'a Control>,
    sorted_ids: Vec<&'a str>,
}

impl<'a> CatalogNavigator<'a> {
    /// Index the catalog. Fails when control or group ids repeat.
    pub fn new(catalog: &'a Catalog) -> Result<Self> {
        let mut group_ids = BTreeSet::new();
        for group in &catalog.groups {
            if !group_ids.insert(group.id.as_str()) {
                return Err(BlueprintError::catalog_load(format!(
                    "duplicate group id {}",
                    group.id
                )));
            }
        }

        let mut by_id = BTreeMap::new();
        for control in catalog.controls_recursive() {
            if control.id.trim().is_empty() {
                return Err(BlueprintError::catalog_load("encountered control with no id"));
            }
            if by_id.insert(control.id.as_str(), control).is_some() {
                return Err(BlueprintError::catalog_load(format!(
                    "duplicate control id {}",
                    control.id
                )));
            }
        }

        let mut sorted_ids: Vec<&str> = by_id.keys().copied().collect();
        sort_control_ids(&mut sorted_ids);
        debug!(controls = by_id.len(), "indexed catalog");

        Ok(Self {
            catalog,
            by_id,
            sorted_ids,
        })
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn dialect(&self) -> CatalogDialect {
        self.catalog.dialect
    }

    /// Catalog title from metadata; reported as the catalog "version".
    pub fn catalog_title(&self) -> &'a str {
        self.catalog.title()
    }

    /// Groups in document order.
    pub fn list_groups(&self) -> &'a [Group] {
        &self.catalog.groups
    }

    pub fn group_title(&self, group_id: &str) -> Option<&'a str> {
        self.catalog
            .groups
            .iter()
            .find(|group| group.id == group_id)
            .map(|group| group.title.as_str())
    }

    /// Control ids in document order; `recursive` also yields enhancements
    /// right after their parent.
    pub fn list_control_ids(&self, recursive: bool) -> Vec<&'a str> {
        if recursive {
            return self
                .catalog
                .controls_recursive()
                .into_iter()
                .map(|control| control.id.as_str())
                .collect();
        }
        self.catalog
            .groups
            .iter()
            .flat_map(|group| group.controls.iter())
            .map(|control| control.id.as_str())
            .collect()
    }

    /// Every control id in numeric-aware sorted order.
    pub fn sorted_control_ids(&self) -> &[&'a str] {
        &self.sorted_ids
    }

    pub fn get_control(&self, control_id: &str) -> Result<&'a Control> {
        self.by_id
            .get(control_id)
            .copied()
            .ok_or_else(|| BlueprintError::ControlNotFound(control_id.to_string()))
    }

    /// Family whose id equals the first two characters of the control id,
    /// compared case-insensitively.
    pub fn get_group_for_control(&self, control_id: &str) -> Option<&'a Group> {
        let prefix: String = control_id.chars().take(2).collect::<String>().to_lowercase();
        self.catalog
            .groups
            .iter()
            .find(|group| group.id.to_lowercase() == prefix)
    }

    /// The id after `control_id` in sorted order, or `""` when it is last or
    /// unknown.
    pub fn next_control_id(&self, control_id: &str) -> String {
        match self.sorted_ids.iter().position(|id| *id == control_id) {
            Some(idx) => match self.sorted_ids.get(idx + 1) {
                Some(next) => (*next).to_string(),
                None => {
                    debug!(control_id, "no controls after this one");
                    String::new()
                }
            },
            None => {
                warn!(control_id, "cannot determine next control; id not in catalog");
                String::new()
            }
        }
    }

    /// Flattened `(label, prose)` pairs under the control's `statement` part,
    /// depth-first.
    pub fn get_control_statement(&self, control: &Control) -> Vec<StatementLine> {
        let mut lines = Vec::new();
        if let Some(statement) = control.part("statement") {
            collect_statement_lines(&statement.parts, &mut lines);
        }
        lines
    }

    /// One normalized record for the control regardless of catalog dialect.
    pub fn simplified_view(&self, control_id: &str) -> Result<SimplifiedControl> {
        let control = self.get_control(control_id)?;
        let family = self
            .get_group_for_control(control_id)
            .map(|group| group.title.clone());

        Ok(SimplifiedControl {
            label: control.label()?,
            sort_id: control.sort_id(self.dialect())?,
            title: control.title.clone(),
            family,
            description: self.description(control),
            implementation: part_prose(control, "implementation"),
            guidance: part_prose(control, "guidance"),
            next_id: self.next_control_id(control_id),
        })
    }

    /// Parameter id to allowed values, selection, or label.
    pub fn control_parameters(&self, control: &Control) -> BTreeMap<String, ParameterValue> {
        control
            .params
            .iter()
            .map(|param| {
                let value = if !param.values.is_empty() {
                    ParameterValue::Values(param.values.clone())
                } else if let Some(select) = &param.select {
                    ParameterValue::Selection {
                        how_many: select.how_many.clone().unwrap_or_else(|| "one".to_string()),
                        choices: select.choice.clone(),
                    }
                } else {
                    ParameterValue::Label(param.label.clone())
                };
                (param.id.clone(), value)
            })
            .collect()
    }

    pub fn parameter_label<'c>(&self, control: &'c Control, param_id: &str) -> Option<&'c str> {
        control
            .params
            .iter()
            .find(|param| param.id == param_id)
            .and_then(|param| param.label.as_deref())
    }

    pub fn resource_by_uuid(&self, uuid: &str) -> Option<&'a Resource> {
        self.catalog
            .back_matter
            .as_ref()?
            .resources
            .iter()
            .find(|resource| resource.uuid == uuid)
    }

    /// Rows seeded for every control (recursive order) when a catalog is
    /// stored.
    pub fn control_rows(&self) -> Result<Vec<ControlRow>> {
        self.catalog
            .controls_recursive()
            .into_iter()
            .map(|control| {
                Ok(ControlRow {
                    control_id: control.id.clone(),
                    label: control.label()?,
                    sort_id: control.sort_id(self.dialect())?,
                    title: control.title.clone(),
                })
            })
            .collect()
    }

    fn description(&self, control: &Control) -> String {
        let mut out: Vec<String> = Vec::new();
        if let Some(prose) = control.part("statement").and_then(|part| part.prose.as_deref()) {
            out.push(prose.to_string());
        }
        out.extend(
            self.get_control_statement(control)
                .into_iter()
                .map(|line| {
                    if line.label.is_empty() {
                        line.text
                    } else {
                        format!("{} {}", line.label, line.text)
                    }
                }),
        );
        out.join("\n")
    }
}

fn collect_statement_lines(parts: &[Part], acc: &mut Vec<StatementLine>) {
    for part in parts {
        if let Some(prose) = &part.prose {
            acc.push(StatementLine {
                label: part.display_label(),
                text: prose.clone(),
            });
        }
        collect_statement_lines(&part.parts, acc);
    }
}

fn part_prose(control: &Control, name: &str) -> String {
    control
        .part(name)
        .and_then(|part| part.prose.clone())
        .unwrap_or_default()
}
