/*!
 * envsim - virtual environmental sensor fleet simulator
 *
 * Runs a fleet of simulated sensors, each emitting a plausible time series
 * on a message bus:
 * - Per-type profiles with diurnal cycles, pollution regimes and burst events
 * - One scheduled task per active sensor, started and stopped by bus signals
 * - Automatic deactivation after repeated publish failures
 * - Fleet restoration from the backend's sensor directory on startup
 * - Periodic bus reachability checks
 */

pub mod config;
pub mod controller;
pub mod directory;
pub mod error;
pub mod health;
pub mod logging;
pub mod service;
pub mod table;

// Re-export commonly used types
pub use config::{DirectoryConfig, LogLevel, SimulatorConfig};
pub use controller::{
    ControllerConfig, LifecycleController, RestoreReport, SensorSpec, StartOutcome,
    StatusChangeOutcome, StopOutcome,
};
pub use directory::{SensorDirectory, SensorRecord, StaticSensorDirectory};
pub use error::{Result, SimError};
pub use health::{HealthCheck, HealthMonitor};
pub use service::{ServiceStats, SimulatorService};
pub use table::{ActiveSensorEntry, ActiveSensorTable};

#[cfg(feature = "http-directory")]
pub use directory::HttpSensorDirectory;

pub use envsim_bus as bus;
pub use envsim_core_sim as sim;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
