//! Error types for the core-sim crate

use thiserror::Error;

/// Returned when a sensor type name does not match any known type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown sensor type: {0}")]
pub struct ParseSensorTypeError(pub String);
