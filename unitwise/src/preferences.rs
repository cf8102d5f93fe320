use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Could not read preferences: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not write preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, PreferencesError>;

/// User settings that influence evaluation and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Preferences {
    /// Unit in which angles without an explicit unit are interpreted, and in
    /// which inverse trigonometric functions report their results. Radians
    /// if not set.
    pub preferred_angle_unit: Option<CompactString>,

    /// Unit scheme used to pick display units, like `Metric`.
    pub preferred_unit_scheme: Option<CompactString>,

    pub display_short_unit_names: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            preferred_angle_unit: None,
            preferred_unit_scheme: None,
            display_short_unit_names: true,
        }
    }
}

impl Preferences {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn with_angle_unit(mut self, unit: &str) -> Self {
        self.preferred_angle_unit = Some(unit.into());
        self
    }

    pub fn with_unit_scheme(mut self, scheme: &str) -> Self {
        self.preferred_unit_scheme = Some(scheme.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let preferences = Preferences::from_toml_str("").unwrap();
        assert_eq!(preferences, Preferences::default());
        assert!(preferences.display_short_unit_names);
        assert_eq!(preferences.preferred_angle_unit, None);
    }

    #[test]
    fn kebab_case_keys() {
        let preferences = Preferences::from_toml_str(
            r#"
            preferred-angle-unit = "deg"
            preferred-unit-scheme = "Metric"
            display-short-unit-names = false
            "#,
        )
        .unwrap();
        assert_eq!(
            preferences,
            Preferences {
                preferred_angle_unit: Some("deg".into()),
                preferred_unit_scheme: Some("Metric".into()),
                display_short_unit_names: false,
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Preferences::from_toml_str("angle-unit = \"deg\""),
            Err(PreferencesError::Parse(_))
        ));
    }

    #[test]
    fn round_trip_through_toml() {
        let preferences = Preferences::default()
            .with_angle_unit("deg")
            .with_unit_scheme("Metric");
        let toml = preferences.to_toml_string().unwrap();
        assert_eq!(Preferences::from_toml_str(&toml).unwrap(), preferences);
    }
}
