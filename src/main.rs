//! envsim CLI - run the simulator or print backfill history.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use envsim::bus::{Channel, InMemoryBus, MessageBus, SensorReadingEvent};
use envsim::error::{EXIT_RUNTIME, EXIT_SUCCESS};
use envsim::logging::init_logging;
use envsim::sim::{GeneratorConfig, ReadingGenerator, SensorType};
use envsim::{SensorDirectory, SimError, SimulatorConfig, SimulatorService, StaticSensorDirectory};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// envsim - virtual environmental sensor simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the simulator until interrupted
    Run {
        /// TOML configuration file
        #[arg(short, long, env = "ENVSIM_CONFIG")]
        config: Option<PathBuf>,

        /// Sensor directory listing URL (overrides the config file)
        #[arg(long, env = "ENVSIM_DIRECTORY_URL")]
        directory_url: Option<String>,

        /// Enable debug logging
        #[arg(short, long)]
        debug: bool,
    },

    /// Print backfill readings for one sensor as JSON lines
    History {
        /// Sensor type (e.g. TEMPERATURE, air_quality)
        #[arg(short = 't', long = "type")]
        sensor_type: SensorType,

        /// Number of readings
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// Sensor identity stamped on the readings
        #[arg(short, long, default_value = "1")]
        sensor_id: u64,

        /// Owner stamped on the readings
        #[arg(short, long, default_value = "local")]
        owner: String,
    },

    /// Print the profile table
    Profiles,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match execute(cli).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<SimError>()
                .map(SimError::exit_code)
                .unwrap_or(EXIT_RUNTIME)
        }
    };
    std::process::exit(code);
}

async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            config,
            directory_url,
            debug,
        } => run(config, directory_url, debug).await,
        Command::History {
            sensor_type,
            count,
            sensor_id,
            owner,
        } => history(sensor_type, count, sensor_id, &owner),
        Command::Profiles => {
            profiles();
            Ok(())
        }
    }
}

async fn run(config_path: Option<PathBuf>, directory_url: Option<String>, debug: bool) -> Result<()> {
    let mut config = match config_path {
        Some(ref path) => SimulatorConfig::from_file(path)?,
        None => SimulatorConfig::default(),
    };
    if directory_url.is_some() {
        config.directory.url = directory_url;
    }
    config.verbose |= debug;
    config.validate().map_err(SimError::Config)?;

    init_logging(&config)?;

    // No external broker transport is bundled; everything runs in-process.
    // Readings are echoed below, so the bus keeps no journal.
    let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::with_journal_capacity(0));
    let directory = build_directory(&config)?;

    let service = SimulatorService::new(&config, bus.clone(), directory);

    // Echo readings so a local run shows what would reach the backend
    let mut readings = bus.subscribe(Channel::SensorReading).await?;
    let echo = tokio::spawn(async move {
        while let Some(message) = readings.recv().await {
            match message.decode::<SensorReadingEvent>() {
                Ok(r) => info!(
                    sensor_id = r.sensor_identity,
                    value = r.value,
                    unit = %r.unit,
                    "📡 reading"
                ),
                Err(e) => warn!("Undecodable reading: {}", e),
            }
        }
    });

    if let Some(report) = service.start().await? {
        info!(
            started = report.started,
            failed = report.failed.len(),
            "Restored fleet"
        );
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    info!("Interrupt received, shutting down");

    service.stop().await;
    echo.abort();
    Ok(())
}

fn build_directory(config: &SimulatorConfig) -> Result<Option<Arc<dyn SensorDirectory>>> {
    if let Some(url) = &config.directory.url {
        #[cfg(feature = "http-directory")]
        {
            let directory =
                envsim::HttpSensorDirectory::new(url.clone(), config.directory.timeout())?;
            return Ok(Some(Arc::new(directory)));
        }
        #[cfg(not(feature = "http-directory"))]
        anyhow::bail!(
            "directory url {} configured but envsim was built without http-directory",
            url
        );
    }

    if config.sensors.is_empty() {
        warn!("No sensor directory or static sensors configured; waiting for bus signals");
        return Ok(None);
    }
    Ok(Some(Arc::new(StaticSensorDirectory::new(
        config.sensors.clone(),
    ))))
}

fn history(sensor_type: SensorType, count: usize, sensor_id: u64, owner: &str) -> Result<()> {
    let generator = ReadingGenerator::new(GeneratorConfig::default());
    for reading in generator.batch_history(sensor_type, sensor_id, count) {
        let event = SensorReadingEvent::from_reading(sensor_id, owner, &reading);
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

fn profiles() {
    println!(
        "{:<12} {:>8} {:>8} {:>8} {:>8} {:<8} {:>9} {:>6}",
        "TYPE", "BASE", "VARIANCE", "MIN", "MAX", "UNIT", "INTERVAL", "DRIFT"
    );
    for sensor_type in SensorType::ALL {
        let p = sensor_type.profile();
        println!(
            "{:<12} {:>8} {:>8} {:>8} {:>8} {:<8} {:>7}ms {:>6}",
            sensor_type.as_str(),
            p.base_value,
            p.variance,
            p.min,
            p.max,
            p.unit,
            p.update_interval_ms,
            p.drift_rate
        );
    }
}
