/*!
 * Logging and tracing initialization
 */

use std::fs::File;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::SimulatorConfig;
use crate::error::{Result, SimError};

/// Effective level after applying the verbose override
pub fn effective_level(config: &SimulatorConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

/// Directive used when `RUST_LOG` is unset
pub fn default_directive(level: Level) -> String {
    let level = level.to_string().to_lowercase();
    format!("envsim={0},envsim_core_sim={0},envsim_bus={0}", level)
}

/// Initialize structured logging based on configuration
pub fn init_logging(config: &SimulatorConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(effective_level(config))))
        .map_err(|e| SimError::Config(format!("Failed to create log filter: {}", e)))?;

    if let Some(ref log_path) = config.log_file {
        init_file_logging(log_path, env_filter)?;
    } else {
        init_stdout_logging(env_filter);
    }

    Ok(())
}

fn init_stdout_logging(env_filter: EnvFilter) {
    let fmt_layer = fmt::layer().compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// JSON lines to a file, tagged with thread ids
fn init_file_logging(log_path: &Path, env_filter: EnvFilter) -> Result<()> {
    let file = File::create(log_path).map_err(|e| {
        SimError::Config(format!(
            "Failed to create log file {}: {}",
            log_path.display(),
            e
        ))
    })?;

    let fmt_layer = fmt::layer()
        .with_writer(file)
        .with_thread_ids(true)
        .with_ansi(false)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}

/// Initialize logging for tests; safe to call from every test
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("envsim=debug"));

        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok(); // Ignore error if already initialized
    });
}
