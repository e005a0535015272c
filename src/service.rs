//! SimulatorService: the long-lived in-process entry point
//!
//! ```text
//!  sensor-created ───────┐
//!                        ├─► listeners ─► LifecycleController ─► sensor tasks ─► bus
//!  sensor-status-change ─┘                        ▲
//!  SensorDirectory ─── restore on start ──────────┘
//!  HealthMonitor ───── ping every interval
//! ```
//!
//! The service is constructed once per process and handed to whoever needs
//! it; there is no global instance. An unreachable bus never stops it from
//! starting: listeners keep retrying their subscription every health
//! interval.

use crate::config::SimulatorConfig;
use crate::controller::{ControllerConfig, LifecycleController, RestoreReport};
use crate::directory::SensorDirectory;
use crate::error::Result;
use crate::health::{HealthCheck, HealthMonitor};
use crate::table::ActiveSensorEntry;
use envsim_bus::{
    BusMessage, Channel, MessageBus, SensorCreatedEvent, SensorStatusChangeEvent, Subscription,
};
use envsim_core_sim::{ReadingGenerator, SensorId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Snapshot returned by [`SimulatorService::get_stats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub is_running: bool,
    pub active_sensor_count: usize,
    /// Sum of current consecutive failure counts
    pub total_error_count: u64,
    /// Sensors with at least one outstanding failure
    pub sensors_with_errors: usize,
    pub last_health_check: Option<HealthCheck>,
}

struct RunningTasks {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

pub struct SimulatorService {
    controller: LifecycleController,
    health: Arc<HealthMonitor>,
    directory: Option<Arc<dyn SensorDirectory>>,
    resubscribe_interval: Duration,
    running: Mutex<Option<RunningTasks>>,
}

impl SimulatorService {
    pub fn new(
        config: &SimulatorConfig,
        bus: Arc<dyn MessageBus>,
        directory: Option<Arc<dyn SensorDirectory>>,
    ) -> Self {
        let generator = Arc::new(ReadingGenerator::new(config.generator));
        let controller = LifecycleController::new(
            generator,
            bus.clone(),
            ControllerConfig {
                error_threshold: config.error_threshold,
            },
        );
        let health = Arc::new(HealthMonitor::new(bus, config.health_check_interval()));

        Self {
            controller,
            health,
            directory,
            resubscribe_interval: config.health_check_interval(),
            running: Mutex::new(None),
        }
    }

    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    /// Subscribe to lifecycle signals, restore the fleet, then start the
    /// listeners and the health loop. Calling `start` twice is a no-op.
    ///
    /// Subscriptions are opened before restoration so no signal sent while
    /// restoring is lost. A failed subscription or restoration is logged; the
    /// service still runs and picks sensors up from later signals.
    pub async fn start(&self) -> Result<Option<RestoreReport>> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            info!("Simulator already running");
            return Ok(None);
        }

        info!("🚀 envsim simulator v{}", env!("CARGO_PKG_VERSION"));

        let created = try_subscribe(self.controller.bus(), Channel::SensorCreated).await;
        let status_changes =
            try_subscribe(self.controller.bus(), Channel::SensorStatusChange).await;

        let report = match &self.directory {
            Some(directory) => match self.controller.restore_on_startup(directory.as_ref()).await {
                Ok(report) => Some(report),
                Err(e) => {
                    error!("Fleet restoration failed: {}", e);
                    None
                }
            },
            None => {
                debug!("No sensor directory configured, skipping restoration");
                None
            }
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = vec![
            self.spawn_listener(Channel::SensorCreated, created, shutdown_rx.clone()),
            self.spawn_listener(
                Channel::SensorStatusChange,
                status_changes,
                shutdown_rx.clone(),
            ),
            self.health.clone().spawn(shutdown_rx),
        ];

        *running = Some(RunningTasks {
            shutdown_tx,
            handles,
        });
        info!("✨ Simulator running");
        Ok(report)
    }

    /// Stop listeners and the health loop, then cancel every sensor task.
    /// No status events are emitted for the cancelled sensors.
    pub async fn stop(&self) {
        let Some(tasks) = self.running.lock().await.take() else {
            debug!("Simulator not running, ignoring stop");
            return;
        };

        let _ = tasks.shutdown_tx.send(true);
        for handle in tasks.handles {
            if let Err(e) = handle.await {
                warn!("Background task ended abnormally: {}", e);
            }
        }

        let cancelled = self.controller.stop_all().await;
        info!(cancelled, "🛑 Simulator stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn get_stats(&self) -> ServiceStats {
        let sensors = self.controller.active_sensors().await;
        ServiceStats {
            is_running: self.is_running().await,
            active_sensor_count: sensors.len(),
            total_error_count: sensors.iter().map(|s| s.error_count as u64).sum(),
            sensors_with_errors: sensors.iter().filter(|s| s.error_count > 0).count(),
            last_health_check: self.health.last_check(),
        }
    }

    pub async fn get_sensor_status(&self, id: SensorId) -> Option<ActiveSensorEntry> {
        self.controller.get_sensor_status(id).await
    }

    fn spawn_listener(
        &self,
        channel: Channel,
        subscription: Option<Subscription>,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(listen(
            self.controller.clone(),
            channel,
            subscription,
            self.resubscribe_interval,
            shutdown,
        ))
    }
}

async fn try_subscribe(bus: &Arc<dyn MessageBus>, channel: Channel) -> Option<Subscription> {
    match bus.subscribe(channel).await {
        Ok(subscription) => Some(subscription),
        Err(e) => {
            warn!(channel = %channel, "⚠️  Subscribe failed, will retry: {}", e);
            None
        }
    }
}

/// Drive one inbound channel until shutdown, resubscribing whenever the
/// subscription is missing or closed.
async fn listen(
    controller: LifecycleController,
    channel: Channel,
    mut subscription: Option<Subscription>,
    retry: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let Some(mut active) = subscription.take() else {
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = tokio::time::sleep(retry) => {}
            }
            subscription = try_subscribe(controller.bus(), channel).await;
            if subscription.is_some() {
                info!(channel = %channel, "🔌 Subscribed after retry");
            }
            continue;
        };

        debug!(channel = %channel, "Listening for lifecycle signals");
        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                message = active.recv() => match message {
                    Some(message) => dispatch(&controller, &message).await,
                    None => {
                        warn!(channel = %channel, "Subscription closed by the bus");
                        break;
                    }
                },
            }
        }
    }
}

/// Decode one inbound message and hand it to the controller.
///
/// Malformed payloads are logged and dropped.
async fn dispatch(controller: &LifecycleController, message: &BusMessage) {
    match message.channel {
        Channel::SensorCreated => match message.decode::<SensorCreatedEvent>() {
            Ok(event) => {
                controller.on_external_create(&event).await;
            }
            Err(e) => warn!(channel = %message.channel, "Dropping malformed payload: {}", e),
        },
        Channel::SensorStatusChange => match message.decode::<SensorStatusChangeEvent>() {
            Ok(event) => {
                controller.on_external_status_change(&event).await;
            }
            Err(e) => warn!(channel = %message.channel, "Dropping malformed payload: {}", e),
        },
        other => debug!(channel = %other, "Ignoring message on outbound channel"),
    }
}
