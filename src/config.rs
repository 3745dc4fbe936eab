//! Explicit defaults for generated narrative fields.
//!
//! Values come from built-in defaults, then an optional JSON file named by
//! `BLUEPRINT_CONFIG`, then individual environment overrides. Empty
//! environment values are ignored so an exported-but-blank variable does not
//! wipe out a file setting.

use crate::component::Responsibility;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const CONFIG_PATH_ENV: &str = "BLUEPRINT_CONFIG";
pub const DEFAULT_RESPONSIBILITY_ENV: &str = "BLUEPRINT_DEFAULT_RESPONSIBILITY";
pub const DEFAULT_PROVIDER_ENV: &str = "BLUEPRINT_DEFAULT_PROVIDER";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueprintConfig {
    /// Responsibility stamped on requirements added without one.
    pub default_responsibility: Responsibility,
    /// Provider stamped on requirements added without one; empty means the
    /// `provider` prop is omitted.
    pub default_provider: String,
    /// Appended to a project title to name its private component.
    pub private_component_suffix: String,
}

impl Default for BlueprintConfig {
    fn default() -> Self {
        Self {
            default_responsibility: Responsibility::Allocated,
            default_provider: String::new(),
            private_component_suffix: " private".to_string(),
        }
    }
}

impl BlueprintConfig {
    /// Load defaults, the optional config file, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match non_empty_env(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(
            non_empty_env(DEFAULT_RESPONSIBILITY_ENV).as_deref(),
            non_empty_env(DEFAULT_PROVIDER_ENV).as_deref(),
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("parsing config {}", path.display()))
    }

    fn apply_overrides(&mut self, responsibility: Option<&str>, provider: Option<&str>) {
        if let Some(value) = responsibility {
            self.default_responsibility = Responsibility::from_str(value);
        }
        if let Some(value) = provider {
            self.default_provider = value.to_string();
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_allocated_and_empty_provider() {
        let config = BlueprintConfig::default();
        assert_eq!(config.default_responsibility, Responsibility::Allocated);
        assert!(config.default_provider.is_empty());
        assert_eq!(config.private_component_suffix, " private");
    }

    #[test]
    fn file_values_merge_with_defaults() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, r#"{{"default_responsibility": "Hybrid"}}"#)?;
        let config = BlueprintConfig::from_file(file.path())?;
        assert_eq!(config.default_responsibility, Responsibility::Hybrid);
        assert_eq!(config.private_component_suffix, " private");
        Ok(())
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = BlueprintConfig::default();
        config.apply_overrides(Some("shared"), Some("CMS"));
        assert_eq!(config.default_responsibility, Responsibility::Shared);
        assert_eq!(config.default_provider, "CMS");

        config.apply_overrides(None, None);
        assert_eq!(config.default_provider, "CMS");
    }
}
