//! Holds parsed catalogs for lookup by catalog version.
//!
//! Projects and components both reference a catalog by version string, so the
//! repository keeps selection explicit even when several catalog versions are
//! loaded side by side.

use crate::catalog::identity::CatalogVersion;
use crate::catalog::model::{Catalog, Control};
use crate::catalog::navigator::CatalogNavigator;
use crate::error::{BlueprintError, Result};
use std::collections::BTreeMap;

#[derive(Default)]
/// In-memory store of catalogs keyed by `CatalogVersion`.
pub struct CatalogRepository {
    catalogs: BTreeMap<CatalogVersion, Catalog>,
}

impl CatalogRepository {
    /// Register a catalog, replacing any catalog already stored for `version`.
    pub fn register(&mut self, version: CatalogVersion, catalog: Catalog) {
        self.catalogs.insert(version, catalog);
    }

    pub fn get(&self, version: &CatalogVersion) -> Option<&Catalog> {
        self.catalogs.get(version)
    }

    /// Registered versions in stable order.
    pub fn versions(&self) -> impl Iterator<Item = &CatalogVersion> {
        self.catalogs.keys()
    }

    /// Build a navigator for a registered catalog.
    pub fn navigator(&self, version: &CatalogVersion) -> Result<CatalogNavigator<'_>> {
        let catalog = self.get(version).ok_or_else(|| {
            BlueprintError::catalog_load(format!("no catalog registered for version {version}"))
        })?;
        CatalogNavigator::new(catalog)
    }

    /// Resolve a control inside a registered catalog, searching nested
    /// enhancements too.
    pub fn find_control(&self, version: &CatalogVersion, control_id: &str) -> Option<&Control> {
        self.get(version)?
            .controls_recursive()
            .into_iter()
            .find(|control| control.id == control_id)
    }
}
