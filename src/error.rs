//! Error types for the Fare Engine.
//!
//! Only configuration loading and host store failures surface as errors.
//! Everything that can go wrong inside a recompute cycle (missing inputs,
//! reversed ranges, unresolved references) degrades to a safe default and
//! is reported as an [`Advisory`](crate::models::Advisory) instead.

use thiserror::Error;

/// The main error type for the Fare Engine.
///
/// # Example
///
/// ```
/// use fare_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/fleet.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/fleet.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Vehicle model was not found in the fleet configuration.
    #[error("Vehicle model not found: {id}")]
    VehicleModelNotFound {
        /// The vehicle model identifier that was not found.
        id: String,
    },

    /// The host store returned a record of a different doctype than requested.
    #[error("Record '{reference}' is not a {expected}")]
    RecordTypeMismatch {
        /// The `doctype/id` reference that was requested.
        reference: String,
        /// The doctype the caller expected.
        expected: String,
    },

    /// The host store failed to read or write.
    #[error("Record store error: {message}")]
    StoreError {
        /// A description of the store failure.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
