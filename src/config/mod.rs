//! Configuration loading and management for the fare engine.
//!
//! This module loads the fleet configuration from YAML files: operator
//! metadata, driver settlement settings, and one rate card per vehicle
//! model.
//!
//! # Example
//!
//! ```no_run
//! use fare_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/fleet").unwrap();
//! println!("Loaded fleet: {}", config.fleet().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{FleetConfig, FleetMetadata, SettlementConfig};
