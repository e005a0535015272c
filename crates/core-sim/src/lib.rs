//! envsim Core Sim: Pure-logic reading generator
//!
//! # Overview
//!
//! This crate produces plausible environmental telemetry for sensors that do
//! not physically exist. Each simulated sensor carries a small piece of state
//! (last value, trend, pollution scenario) and every call to the generator
//! advances that state by one tick.
//!
//! # Key Principles
//!
//! This crate is **pure logic** with zero knowledge of:
//! - Timers or async runtimes
//! - Message buses or transports
//! - Sensor lifecycle (who is running, who is stopped)
//!
//! The lifecycle controller in the root crate owns scheduling and calls into
//! this crate once per tick.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐
//! │  SensorType  │────>│   TypeProfile    │  (immutable, enum-indexed)
//! └──────────────┘     └────────┬─────────┘
//!                               │
//!                               ▼
//! ┌──────────────┐     ┌──────────────────┐     ┌───────────┐
//! │ StateRegistry│<───>│ ReadingGenerator │────>│  Reading  │
//! │ (per sensor) │     │  (one tick)      │     └───────────┘
//! └──────────────┘     └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use envsim_core_sim::{ReadingGenerator, SensorType};
//!
//! let generator = ReadingGenerator::default();
//! let reading = generator.generate(SensorType::Temperature, 1);
//!
//! assert!(reading.value >= 5.0 && reading.value <= 45.0);
//! assert_eq!(reading.unit, "CELSIUS");
//! ```

pub mod diurnal;
pub mod error;
pub mod generator;
pub mod profile;
pub mod scenario;
pub mod state;

pub use error::ParseSensorTypeError;
pub use generator::{GeneratorConfig, Reading, ReadingGenerator};
pub use profile::{SensorType, TypeProfile};
pub use scenario::PollutionScenario;
pub use state::{SensorId, SimulationState, StateRegistry};

/// Bounds of the per-sensor trend value
pub const TREND_LIMIT: f64 = 0.4;
