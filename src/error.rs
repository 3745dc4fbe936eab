//! Error taxonomy for the catalog/component core.
//!
//! Every operation in the core is pure, so none of these are retried; callers
//! decide whether a lookup miss is fatal or simply "not addressed".

use thiserror::Error;

/// Errors surfaced by parsing, navigation, extraction, and aggregation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlueprintError {
    /// Input is not JSON or lacks the required top-level key under every
    /// accepted shape.
    #[error("unable to load {kind} document: {reason}")]
    DocumentLoad { kind: &'static str, reason: String },

    #[error("control '{0}' not found in catalog")]
    ControlNotFound(String),

    /// The component does not address the control for the requested catalog
    /// version.
    #[error("implemented requirement for control '{control_id}' not found{}", version_suffix(.catalog_version))]
    RequirementNotFound {
        control_id: String,
        catalog_version: Option<String>,
    },

    #[error("control '{control_id}' already has an implemented requirement{}", version_suffix(.catalog_version))]
    DuplicateRequirement {
        control_id: String,
        catalog_version: Option<String>,
    },

    /// The request itself is malformed (batch edits, unknown status values).
    #[error("{0}")]
    Validation(String),

    /// A required field has no property under either dialect key and no
    /// usable fallback.
    #[error("control '{control_id}' has no usable '{field}' under props, properties, or fallback")]
    SchemaDialect { control_id: String, field: String },
}

impl BlueprintError {
    pub(crate) fn catalog_load(reason: impl Into<String>) -> Self {
        BlueprintError::DocumentLoad {
            kind: "catalog",
            reason: reason.into(),
        }
    }

    pub(crate) fn component_load(reason: impl Into<String>) -> Self {
        BlueprintError::DocumentLoad {
            kind: "component",
            reason: reason.into(),
        }
    }

    pub(crate) fn requirement_not_found(control_id: &str, catalog_version: Option<&str>) -> Self {
        BlueprintError::RequirementNotFound {
            control_id: control_id.to_string(),
            catalog_version: catalog_version.map(str::to_string),
        }
    }

    /// True for lookup misses the aggregator treats as "not addressed".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BlueprintError::ControlNotFound(_) | BlueprintError::RequirementNotFound { .. }
        )
    }
}

fn version_suffix(version: &Option<String>) -> String {
    match version {
        Some(version) => format!(" for catalog version '{version}'"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, BlueprintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_mention_control_and_version() {
        let err = BlueprintError::requirement_not_found("ac-1", Some("CMS_ARS_5_0"));
        let message = err.to_string();
        assert!(message.contains("ac-1"));
        assert!(message.contains("CMS_ARS_5_0"));
        assert!(err.is_not_found());

        let dup = BlueprintError::DuplicateRequirement {
            control_id: "ac-2".to_string(),
            catalog_version: None,
        };
        assert_eq!(
            dup.to_string(),
            "control 'ac-2' already has an implemented requirement"
        );
        assert!(!dup.is_not_found());
    }
}
