//! OSCAL catalog wiring.
//!
//! `model` parses catalog JSON in either supported dialect, `navigator`
//! answers read-only queries over one parsed catalog, and `repository` keeps
//! several catalogs addressable by version. Types in `identity` are the small
//! keys shared with components and projects.

pub mod identity;
pub mod model;
pub mod navigator;
pub mod repository;

pub use identity::{CatalogDialect, CatalogVersion, ControlSortKey, sort_control_ids};
pub use model::{
    BackMatter, Catalog, CatalogMetadata, Control, Group, HasProps, Link, Param, Part, Prop,
    Resource, Selection, load_catalog_from_path, parse_catalog, parse_catalog_value,
};
pub use navigator::{
    CatalogNavigator, ControlRow, ParameterValue, SimplifiedControl, StatementLine,
};
pub use repository::CatalogRepository;
