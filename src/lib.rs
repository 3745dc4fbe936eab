//! Shared library for the OSCAL blueprint tools.
//!
//! The crate reads OSCAL catalogs and component definitions, answers control
//! queries against a catalog, edits the narratives a component carries for a
//! control, and merges every attached component's narrative into one
//! per-control view for a project. The binaries under `src/bin` are thin
//! wrappers over the functions re-exported here.

use tracing_subscriber::EnvFilter;

pub mod aggregate;
pub mod catalog;
pub mod component;
pub mod config;
pub mod error;
pub mod project;
pub mod schema_loader;

pub use aggregate::{
    AggregatedControlView, AttachedComponent, CatalogControlData, ComponentNarratives,
    InheritedNarrative, PrivateNarrative, ProjectControlView, aggregate_control,
    project_control_view, reduce_responsibility,
};
pub use catalog::{
    Catalog, CatalogDialect, CatalogNavigator, CatalogRepository, CatalogVersion, Control,
    SimplifiedControl, load_catalog_from_path, parse_catalog,
};
pub use component::{
    ComponentDefinition, ComponentExtractor, ComponentId, ComponentStatus, RequirementDraft,
    Responsibility, create_private_component, derive_fields, load_component_from_path,
    parse_component,
};
pub use config::BlueprintConfig;
pub use error::{BlueprintError, Result};
pub use project::{
    ControlStatus, Project, ProjectControl, ProjectProgress, progress, seed_project_controls,
};
pub use schema_loader::{DocumentSchema, SchemaLoadOptions};

/// Install the stderr log subscriber used by the binaries.
///
/// Filtering follows `RUST_LOG`; without it only warnings and errors are
/// shown so stdout stays clean JSON. Calling this twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
