//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading fleet
//! configurations from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::{RateCard, VehicleModel};

use super::types::{FleetConfig, FleetMetadata, SettlementConfig};

/// Loads and provides access to fleet configuration.
///
/// # Directory Structure
///
/// ```text
/// config/fleet/
/// ├── fleet.yaml           # Fleet name, currency, settlement settings
/// └── vehicle_models/
///     └── sedan.yaml       # One vehicle model and its rate card per file
/// ```
///
/// # Example
///
/// ```no_run
/// use fare_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/fleet").unwrap();
///
/// let card = loader.get_rate_card("sedan").unwrap();
/// println!("Outstation rate: {}/km", card.per_km_rate);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: FleetConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `fleet.yaml` or the `vehicle_models` directory is missing
    /// - the directory holds no vehicle model files
    /// - any file contains invalid YAML or lacks a required field
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fare_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/fleet")?;
    /// # Ok::<(), fare_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<FleetMetadata>(&path.join("fleet.yaml"))?;
        let vehicle_models = Self::load_vehicle_models(&path.join("vehicle_models"))?;

        Ok(Self {
            config: FleetConfig::new(metadata, vehicle_models),
        })
    }

    /// Builds a loader from already-parsed parts.
    pub fn from_parts(metadata: FleetMetadata, vehicle_models: Vec<VehicleModel>) -> Self {
        Self {
            config: FleetConfig::new(metadata, vehicle_models),
        }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every vehicle model file from the models directory.
    fn load_vehicle_models(models_dir: &Path) -> EngineResult<Vec<VehicleModel>> {
        let models_dir_str = models_dir.display().to_string();

        if !models_dir.exists() {
            return Err(EngineError::ConfigNotFound {
                path: models_dir_str,
            });
        }

        let entries = fs::read_dir(models_dir).map_err(|_| EngineError::ConfigNotFound {
            path: models_dir_str.clone(),
        })?;

        let mut models = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: models_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                models.push(Self::load_yaml::<VehicleModel>(&path)?);
            }
        }

        if models.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no vehicle model files found)", models_dir_str),
            });
        }

        Ok(models)
    }

    /// Returns the underlying fleet configuration.
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Returns the fleet metadata.
    pub fn fleet(&self) -> &FleetMetadata {
        self.config.fleet()
    }

    /// Returns the driver settlement settings.
    pub fn settlement(&self) -> &SettlementConfig {
        &self.config.fleet().settlement
    }

    /// Gets a vehicle model by id.
    ///
    /// Returns `VehicleModelNotFound` if no model has that id.
    pub fn get_vehicle_model(&self, id: &str) -> EngineResult<&VehicleModel> {
        self.config
            .vehicle_models()
            .get(id)
            .ok_or_else(|| EngineError::VehicleModelNotFound { id: id.to_string() })
    }

    /// Gets the rate card of a vehicle model.
    pub fn get_rate_card(&self, vehicle_model: &str) -> EngineResult<&RateCard> {
        self.get_vehicle_model(vehicle_model)
            .map(|model| &model.rate_card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/fleet"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.fleet().currency, "INR");
        assert_eq!(loader.config().vehicle_models().len(), 3);
        assert!(!loader.settlement().include_night_allowance);
    }

    #[test]
    fn test_get_rate_card() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let card = loader.get_rate_card("sedan").unwrap();
        assert_eq!(card.min_local_hour, dec("8"));
        assert_eq!(card.local_hour_rate, dec("250"));
        assert_eq!(card.per_km_rate, dec("12"));
        assert_eq!(card.min_km_per_day, dec("250"));
    }

    #[test]
    fn test_unknown_vehicle_model_returns_error() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let err = loader.get_rate_card("limousine").unwrap_err();
        assert!(matches!(err, EngineError::VehicleModelNotFound { id } if id == "limousine"));
    }

    #[test]
    fn test_missing_directory_is_config_not_found() {
        let err = ConfigLoader::load("./config/does-not-exist").unwrap_err();
        assert!(matches!(err, EngineError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_settlement_defaults_when_section_absent() {
        let metadata: FleetMetadata =
            serde_yaml::from_str("name: Test Cabs\ncurrency: INR\n").unwrap();
        let loader = ConfigLoader::from_parts(metadata, vec![]);
        assert!(!loader.settlement().include_night_allowance);
    }
}
