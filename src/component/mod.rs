//! Component definitions and their control narratives.
//!
//! `model` parses the `component-definition` document, `extractor` reads and
//! edits the implemented requirements of one component, and `identity` holds
//! the responsibility and status vocabulary shared with the aggregator.

pub mod extractor;
pub mod identity;
pub mod model;

pub use extractor::{
    ComponentExtractor, ComponentSummary, DerivedFields, MULTIPLE_CONTROLS_MESSAGE,
    RequirementDraft, RequirementSummary, create_private_component, derive_fields,
};
pub use identity::{ComponentId, ComponentStatus, Responsibility};
pub use model::{
    COMPONENT_DEFINITION_KEY, Component, ComponentDefinition, ControlImplementation,
    ImplementedRequirement, PROVIDER_PROP, RESPONSIBILITY_PROP, load_component_from_path,
    parse_component, parse_component_value,
};
