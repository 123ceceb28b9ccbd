//! Enumerations shared with the hosted database.
//!
//! Each enum mirrors a Postgres enum in the `public` schema and serializes to
//! the same lowercase labels PostgREST returns.

use serde::{Deserialize, Serialize};

/// Application role recorded in `user_roles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    /// Can open the admin panel.
    Admin,
    /// Regular signed-in user.
    Farmer,
}

impl AppRole {
    /// The label stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Farmer => "farmer",
        }
    }
}

impl std::fmt::Display for AppRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "farmer" => Ok(Self::Farmer),
            _ => Err(format!("invalid app role: {s}")),
        }
    }
}

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    /// The label stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crop type used by both `crops` and `crop_advisory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropType {
    Maize,
    Beans,
    Potatoes,
    Tomatoes,
    Cabbage,
    Wheat,
    Rice,
    Coffee,
    Tea,
    Sugarcane,
    Other,
}

impl CropType {
    /// Every crop type, in database enum order.
    pub const ALL: [Self; 11] = [
        Self::Maize,
        Self::Beans,
        Self::Potatoes,
        Self::Tomatoes,
        Self::Cabbage,
        Self::Wheat,
        Self::Rice,
        Self::Coffee,
        Self::Tea,
        Self::Sugarcane,
        Self::Other,
    ];

    /// The label stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Maize => "maize",
            Self::Beans => "beans",
            Self::Potatoes => "potatoes",
            Self::Tomatoes => "tomatoes",
            Self::Cabbage => "cabbage",
            Self::Wheat => "wheat",
            Self::Rice => "rice",
            Self::Coffee => "coffee",
            Self::Tea => "tea",
            Self::Sugarcane => "sugarcane",
            Self::Other => "other",
        }
    }

    /// Human-readable name for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Maize => "Maize",
            Self::Beans => "Beans",
            Self::Potatoes => "Potatoes",
            Self::Tomatoes => "Tomatoes",
            Self::Cabbage => "Cabbage",
            Self::Wheat => "Wheat",
            Self::Rice => "Rice",
            Self::Coffee => "Coffee",
            Self::Tea => "Tea",
            Self::Sugarcane => "Sugarcane",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for CropType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for CropType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|crop| crop.as_str() == s)
            .ok_or_else(|| format!("invalid crop type: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_role_labels_match_database() {
        assert_eq!(serde_json::to_string(&AppRole::Admin).unwrap(), "\"admin\"");
        assert_eq!("farmer".parse::<AppRole>().unwrap(), AppRole::Farmer);
        assert!("superuser".parse::<AppRole>().is_err());
    }

    #[test]
    fn test_crop_type_from_str_covers_all_variants() {
        for crop in CropType::ALL {
            assert_eq!(crop.as_str().parse::<CropType>().unwrap(), crop);
        }
        assert!("banana".parse::<CropType>().is_err());
    }

    #[test]
    fn test_crop_type_deserializes_database_label() {
        let crop: CropType = serde_json::from_str("\"sugarcane\"").unwrap();
        assert_eq!(crop, CropType::Sugarcane);
        assert_eq!(crop.to_string(), "Sugarcane");
    }

    #[test]
    fn test_alert_severity_default_is_info() {
        assert_eq!(AlertSeverity::default(), AlertSeverity::Info);
        assert_eq!(AlertSeverity::Critical.to_string(), "critical");
    }
}
