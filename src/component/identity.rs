use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Stable identifier of a stored component (database key, file stem, ...).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub String);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(value: &str) -> Self {
        ComponentId(value.to_string())
    }
}

/// Who fulfils a control for a component (`security_control_type`).
///
/// Known variants keep serialization consistent; `Other` preserves values that
/// component authors invent without failing the whole document.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub enum Responsibility {
    #[default]
    Allocated,
    Shared,
    Inherited,
    Hybrid,
    Other(String),
}

/// Whether a component is a project's own narrative or a shared one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// Project-private "this system" component.
    System,
    /// Public component whose narratives are inherited.
    Public,
}

impl ComponentStatus {
    /// Bucket name used in aggregated views.
    pub fn bucket(self) -> &'static str {
        match self {
            ComponentStatus::System => "private",
            ComponentStatus::Public => "inherited",
        }
    }
}

impl Serialize for Responsibility {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Responsibility {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_str(&value))
    }
}

impl fmt::Display for Responsibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Responsibility {
    pub fn as_str(&self) -> &str {
        match self {
            Responsibility::Allocated => "Allocated",
            Responsibility::Shared => "Shared",
            Responsibility::Inherited => "Inherited",
            Responsibility::Hybrid => "Hybrid",
            Responsibility::Other(value) => value.as_str(),
        }
    }

    /// Case-insensitive for the known values; anything else is kept verbatim.
    pub fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "allocated" => Responsibility::Allocated,
            "shared" => Responsibility::Shared,
            "inherited" => Responsibility::Inherited,
            "hybrid" => Responsibility::Hybrid,
            _ => Responsibility::Other(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responsibility_round_trips_known_and_unknown() {
        let known = Responsibility::Inherited;
        let json = serde_json::to_string(&known).unwrap();
        assert_eq!(json, "\"Inherited\"");
        let back: Responsibility = serde_json::from_str(&json).unwrap();
        assert_eq!(back, known);

        let lower: Responsibility = serde_json::from_str("\"hybrid\"").unwrap();
        assert_eq!(lower, Responsibility::Hybrid);

        let custom: Responsibility = serde_json::from_str("\"Customer Configured\"").unwrap();
        assert_eq!(
            custom,
            Responsibility::Other("Customer Configured".to_string())
        );
        assert_eq!(
            serde_json::to_string(&custom).unwrap(),
            "\"Customer Configured\""
        );
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ComponentStatus::System).unwrap(),
            "\"system\""
        );
        assert_eq!(ComponentStatus::Public.bucket(), "inherited");
        assert_eq!(ComponentStatus::System.bucket(), "private");
    }
}
