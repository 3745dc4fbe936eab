use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Catalog version key (e.g., `CMS_ARS_5_0`).
///
/// Component control implementations carry the same string in their
/// `description` (or `source`), which is how a project's catalog version is
/// joined against component narratives.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogVersion(pub String);

impl CatalogVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CatalogVersion {
    fn from(value: &str) -> Self {
        CatalogVersion(value.to_string())
    }
}

/// Which property key layout a catalog uses.
///
/// Selected once when the catalog is parsed. `Legacy` is the ARS 3.1 style
/// document that stores name/value pairs under `properties`; `Oscal50` is the
/// OSCAL 1.x / ARS 5.0 layout that uses `props`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogDialect {
    Legacy,
    #[default]
    Oscal50,
}

impl CatalogDialect {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogDialect::Legacy => "legacy",
            CatalogDialect::Oscal50 => "oscal_5_0",
        }
    }

    /// Fallback for a control's `sort-id` when no sort-id property exists.
    ///
    /// Legacy catalogs fall back to the control id; 5.0 catalogs fall back to
    /// the title.
    pub fn sort_id_fallback(self, id: &str, title: &str) -> String {
        match self {
            CatalogDialect::Legacy => id.to_string(),
            CatalogDialect::Oscal50 => title.to_string(),
        }
    }
}

/// Numeric-aware ordering key for control ids.
///
/// The id is split on `-`; the trailing segment is read as a float and the
/// rest (re-joined with `-`) is the primary key. `ac-2` < `ac-2.1` < `ac-3` <
/// `ac-10`. Ids whose suffix is not numeric sort after the numeric ones in
/// the same family; remaining ties fall back to the raw id.
#[derive(Clone, Debug)]
pub struct ControlSortKey<'a> {
    prefix: &'a str,
    number: Option<f64>,
    raw: &'a str,
}

impl<'a> ControlSortKey<'a> {
    pub fn new(control_id: &'a str) -> Self {
        match control_id.rsplit_once('-') {
            Some((prefix, suffix)) => ControlSortKey {
                prefix,
                number: suffix.parse::<f64>().ok().filter(|n| n.is_finite()),
                raw: control_id,
            },
            None => ControlSortKey {
                prefix: control_id,
                number: None,
                raw: control_id,
            },
        }
    }
}

impl Ord for ControlSortKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prefix
            .cmp(other.prefix)
            .then_with(|| match (self.number, other.number) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| self.raw.cmp(other.raw))
    }
}

impl PartialOrd for ControlSortKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ControlSortKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ControlSortKey<'_> {}

/// Sort control ids in place using [`ControlSortKey`].
pub fn sort_control_ids<S: AsRef<str>>(ids: &mut [S]) {
    ids.sort_by(|a, b| ControlSortKey::new(a.as_ref()).cmp(&ControlSortKey::new(b.as_ref())));
}
