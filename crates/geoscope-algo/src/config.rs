//! Analysis settings.
//!
//! [`AnalysisConfig`] groups the knobs of every solver in this crate. It is
//! read from TOML, where any omitted value falls back to its default.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::autocorr::StatsError;
use crate::milp::MilpBackend;
use crate::routing::SubtourStrategy;

/// Settings for every analysis, one section each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub inference: InferenceConfig,
    pub routing: RoutingConfig,
    pub location: LocationConfig,
}

/// Permutation inference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Number of random permutations.
    pub permutations: usize,

    /// Base seed; every draw derives its own seed from it.
    pub seed: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            permutations: 999,
            seed: 12345,
        }
    }
}

impl InferenceConfig {
    pub fn validate(&self) -> Result<(), StatsError> {
        if self.permutations == 0 {
            return Err(StatsError::InvalidConfig(
                "permutations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Vehicle routing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// First fleet size tried.
    pub min_vehicles: usize,

    /// Largest fleet size tried before giving up.
    pub max_vehicles: usize,

    pub subtour_strategy: SubtourStrategy,

    /// Upper bound on customers for exhaustive subtour enumeration.
    pub max_exhaustive_customers: usize,

    /// Upper bound on lazy cut rounds per fleet size.
    pub max_cut_rounds: usize,

    pub backend: MilpBackend,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            min_vehicles: 1,
            max_vehicles: 5,
            subtour_strategy: SubtourStrategy::default(),
            max_exhaustive_customers: 12,
            max_cut_rounds: 100,
            backend: MilpBackend::default(),
        }
    }
}

/// Location set covering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Maximum client-facility cost that counts as covered.
    pub service_radius: f64,

    pub backend: MilpBackend,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            service_radius: 3000.0,
            backend: MilpBackend::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("invalid analysis configuration")
    }

    /// Load from a TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Write as pretty TOML, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let contents = toml::to_string_pretty(self).context("serializing configuration")?;
        std::fs::write(path, contents).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.inference.permutations, 999);
        assert_eq!(config.inference.seed, 12345);
        assert_eq!(config.routing.max_vehicles, 5);
        assert_eq!(config.routing.subtour_strategy, SubtourStrategy::Lazy);
        assert!((config.location.service_radius - 3000.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_config_parsing() {
        let toml = r#"
            [inference]
            permutations = 99

            [routing]
            max_vehicles = 3
            subtour_strategy = "exhaustive"
        "#;

        let config = AnalysisConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.inference.permutations, 99);
        assert_eq!(config.inference.seed, 12345);
        assert_eq!(config.routing.max_vehicles, 3);
        assert_eq!(config.routing.min_vehicles, 1);
        assert_eq!(config.routing.subtour_strategy, SubtourStrategy::Exhaustive);
        assert_eq!(config.location, LocationConfig::default());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = AnalysisConfig::default();
        config.inference.permutations = 199;
        config.location.service_radius = 750.0;

        let temp = NamedTempFile::new().unwrap();
        config.save_to(temp.path()).unwrap();

        let loaded = AnalysisConfig::load_from(temp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = AnalysisConfig::load_from("/nonexistent/geoscope.toml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/geoscope.toml"));
    }

    #[test]
    fn test_validate_rejects_zero_permutations() {
        let config = InferenceConfig {
            permutations: 0,
            ..InferenceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_significance_level_is_not_a_setting() {
        let toml = toml::to_string(&AnalysisConfig::default()).unwrap();
        assert!(!toml.contains("alpha"));
    }
}
