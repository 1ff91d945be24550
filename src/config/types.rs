//! Configuration types for the fleet.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::models::VehicleModel;

/// Settings governing driver settlement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettlementConfig {
    /// Whether a booking's night charge is passed on to the driver as an
    /// allowance on top of reimbursed expenses.
    #[serde(default)]
    pub include_night_allowance: bool,
}

/// Metadata about the fleet, read from `fleet.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct FleetMetadata {
    /// The operator's name.
    pub name: String,
    /// ISO currency code amounts are expressed in (e.g., "INR").
    pub currency: String,
    /// Driver settlement settings.
    #[serde(default)]
    pub settlement: SettlementConfig,
}

/// The complete fleet configuration.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Fleet metadata.
    metadata: FleetMetadata,
    /// Vehicle models keyed by id.
    vehicle_models: BTreeMap<String, VehicleModel>,
}

impl FleetConfig {
    /// Creates a new FleetConfig from its component parts.
    pub fn new(metadata: FleetMetadata, vehicle_models: Vec<VehicleModel>) -> Self {
        let vehicle_models = vehicle_models
            .into_iter()
            .map(|model| (model.id.clone(), model))
            .collect();
        Self {
            metadata,
            vehicle_models,
        }
    }

    /// Returns the fleet metadata.
    pub fn fleet(&self) -> &FleetMetadata {
        &self.metadata
    }

    /// Returns all vehicle models, keyed by id.
    pub fn vehicle_models(&self) -> &BTreeMap<String, VehicleModel> {
        &self.vehicle_models
    }
}
