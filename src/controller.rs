//! Lifecycle Controller: starts, stops and restores simulated sensors
//!
//! # State machine
//!
//! ```text
//!            start / create / activate
//!   Stopped ──────────────────────────► Running ──┐
//!      ▲                                   │      │ tick: publish reading
//!      │     stop / deactivate             │ ◄────┘
//!      ├───────────────────────────────────┘
//!      │
//!      │     error_count reaches threshold
//!      └──────────── Errored ◄─────────── Running
//! ```
//!
//! Every running sensor owns one tokio task driven by an interval at its
//! type's cadence. Ticks for one sensor run inside that single task, so they
//! never overlap. `stop` aborts the task and waits for it to finish before
//! returning, so no tick fires after `stop` returns.

use crate::directory::{SensorDirectory, SensorRecord};
use crate::error::Result;
use crate::table::{ActiveSensorEntry, ActiveSensorTable};
use chrono::Utc;
use envsim_bus::{
    publish_event, MessageBus, SensorCreatedEvent, SensorReadingEvent, SensorStatus,
    SensorStatusChangeEvent, SensorStatusEvent,
};
use envsim_core_sim::{ReadingGenerator, SensorId, SensorType};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

/// Tunables of the controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Consecutive publish failures that stop a sensor
    pub error_threshold: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { error_threshold: 3 }
    }
}

/// Everything needed to run one sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSpec {
    pub id: SensorId,
    pub display_name: String,
    pub sensor_type: SensorType,
    pub owner_id: String,
}

impl SensorSpec {
    pub fn new(
        id: SensorId,
        display_name: impl Into<String>,
        sensor_type: SensorType,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            sensor_type,
            owner_id: owner_id.into(),
        }
    }
}

impl From<&SensorCreatedEvent> for SensorSpec {
    fn from(event: &SensorCreatedEvent) -> Self {
        Self::new(
            event.sensor_identity,
            event.display_name.clone(),
            event.sensor_type,
            event.owner_id.clone(),
        )
    }
}

impl From<&SensorStatusChangeEvent> for SensorSpec {
    fn from(event: &SensorStatusChangeEvent) -> Self {
        Self::new(
            event.sensor_identity,
            event.display_name.clone(),
            event.sensor_type,
            event.owner_id.clone(),
        )
    }
}

impl TryFrom<&SensorRecord> for SensorSpec {
    type Error = crate::error::SimError;

    fn try_from(record: &SensorRecord) -> Result<Self> {
        Ok(Self::new(
            record.id,
            record.sensor_id.clone(),
            record.parsed_type()?,
            record.user_id.clone(),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    /// Creation event for a sensor that is not active
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChangeOutcome {
    Started,
    Stopped,
    Unchanged,
}

/// Result of one scheduled tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    Published,
    PublishFailed { error_count: u32 },
    ThresholdReached { error_count: u32 },
    /// The slot disappeared while the tick was in flight
    Discarded,
}

/// Summary of a startup restoration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    pub started: usize,
    pub already_running: usize,
    pub skipped_inactive: usize,
    /// Sensors that could not be started, with the reason
    pub failed: Vec<(SensorId, String)>,
}

struct Inner {
    generator: Arc<ReadingGenerator>,
    bus: Arc<dyn MessageBus>,
    table: ActiveSensorTable,
    config: ControllerConfig,
}

/// Owner of the active sensor table and every sensor task.
///
/// Cheap to clone; all clones share the same table.
#[derive(Clone)]
pub struct LifecycleController {
    inner: Arc<Inner>,
}

impl LifecycleController {
    pub fn new(
        generator: Arc<ReadingGenerator>,
        bus: Arc<dyn MessageBus>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                generator,
                bus,
                table: ActiveSensorTable::new(),
                config,
            }),
        }
    }

    pub fn generator(&self) -> &Arc<ReadingGenerator> {
        &self.inner.generator
    }

    pub fn bus(&self) -> &Arc<dyn MessageBus> {
        &self.inner.bus
    }

    pub fn table(&self) -> &ActiveSensorTable {
        &self.inner.table
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Begin generating readings for `spec`. Idempotent per identity.
    pub async fn start(&self, spec: SensorSpec) -> StartOutcome {
        let period = spec.sensor_type.profile().update_interval();
        let entry = ActiveSensorEntry {
            sensor_id: spec.id,
            display_name: spec.display_name.clone(),
            sensor_type: spec.sensor_type,
            owner_id: spec.owner_id.clone(),
            error_count: 0,
            last_reading_at: None,
            started_at: Utc::now(),
        };

        let inserted = self
            .inner
            .table
            .insert_with(entry, |epoch| {
                let controller = self.clone();
                let task_spec = spec.clone();
                tokio::spawn(async move { controller.run_sensor(task_spec, epoch, period).await })
            })
            .await;

        if !inserted {
            info!(sensor_id = spec.id, "Sensor already running, ignoring start");
            return StartOutcome::AlreadyRunning;
        }

        info!(
            sensor_id = spec.id,
            sensor_type = %spec.sensor_type,
            owner_id = %spec.owner_id,
            interval_ms = period.as_millis() as u64,
            "▶️  Sensor simulation started"
        );
        self.emit_status(spec.id, &spec.owner_id, SensorStatus::Active)
            .await;
        StartOutcome::Started
    }

    /// Stop generating readings for `id`. No-op (and no event) if not running.
    pub async fn stop(&self, id: SensorId) -> StopOutcome {
        let Some(slot) = self.inner.table.remove(id).await else {
            debug!(sensor_id = id, "Sensor not running, ignoring stop");
            return StopOutcome::NotRunning;
        };

        slot.handle.abort();
        // Cancelled is the expected outcome; a panic inside a tick is logged
        if let Err(e) = slot.handle.await {
            if e.is_panic() {
                error!(sensor_id = id, "Sensor task panicked: {}", e);
            }
        }

        self.inner.generator.reset_state(id);
        info!(sensor_id = id, "⏹️  Sensor simulation stopped");
        self.emit_status(id, &slot.entry.owner_id, SensorStatus::Inactive)
            .await;
        StopOutcome::Stopped
    }

    /// React to a sensor being created elsewhere
    pub async fn on_external_create(&self, event: &SensorCreatedEvent) -> StartOutcome {
        if !event.active {
            debug!(
                sensor_id = event.sensor_identity,
                "Created sensor is inactive, not starting"
            );
            return StartOutcome::Skipped;
        }
        self.start(SensorSpec::from(event)).await
    }

    /// React to a sensor being activated or deactivated elsewhere
    pub async fn on_external_status_change(
        &self,
        event: &SensorStatusChangeEvent,
    ) -> StatusChangeOutcome {
        let running = self.inner.table.contains(event.sensor_identity).await;
        match (running, event.active) {
            (true, false) => match self.stop(event.sensor_identity).await {
                StopOutcome::Stopped => StatusChangeOutcome::Stopped,
                StopOutcome::NotRunning => StatusChangeOutcome::Unchanged,
            },
            (false, true) => match self.start(SensorSpec::from(event)).await {
                StartOutcome::Started => StatusChangeOutcome::Started,
                _ => StatusChangeOutcome::Unchanged,
            },
            _ => {
                debug!(
                    sensor_id = event.sensor_identity,
                    active = event.active,
                    "Status change matches current state"
                );
                StatusChangeOutcome::Unchanged
            }
        }
    }

    /// Start every active sensor known to `directory`.
    ///
    /// Only a failed listing is an error; a sensor that cannot be started is
    /// logged and recorded in the report.
    pub async fn restore_on_startup(
        &self,
        directory: &dyn SensorDirectory,
    ) -> Result<RestoreReport> {
        let records = directory.list_sensors().await?;
        let mut report = RestoreReport::default();

        for record in &records {
            if !record.active {
                report.skipped_inactive += 1;
                continue;
            }

            let spec = match SensorSpec::try_from(record) {
                Ok(spec) => spec,
                Err(e) => {
                    warn!(sensor_id = record.id, "Skipping sensor during restore: {}", e);
                    report.failed.push((record.id, e.to_string()));
                    continue;
                }
            };

            match self.start(spec).await {
                StartOutcome::Started => report.started += 1,
                StartOutcome::AlreadyRunning | StartOutcome::Skipped => {
                    report.already_running += 1
                }
            }
        }

        info!(
            listed = records.len(),
            started = report.started,
            skipped_inactive = report.skipped_inactive,
            failed = report.failed.len(),
            "🔁 Fleet restoration complete"
        );
        Ok(report)
    }

    /// Cancel every sensor task without emitting status events.
    ///
    /// Used on shutdown: sensors stay active in the backend and are restored
    /// by the next process. Returns the number of tasks cancelled.
    pub async fn stop_all(&self) -> usize {
        let slots = self.inner.table.drain().await;
        let count = slots.len();
        for slot in slots {
            slot.handle.abort();
            let _ = slot.handle.await;
            self.inner.generator.reset_state(slot.entry.sensor_id);
        }
        if count > 0 {
            info!(count, "Cancelled all sensor tasks");
        }
        count
    }

    pub async fn get_sensor_status(&self, id: SensorId) -> Option<ActiveSensorEntry> {
        self.inner.table.get(id).await
    }

    pub async fn active_sensors(&self) -> Vec<ActiveSensorEntry> {
        self.inner.table.snapshot().await
    }

    pub async fn is_running(&self, id: SensorId) -> bool {
        self.inner.table.contains(id).await
    }

    /// Per-sensor task body
    async fn run_sensor(self, spec: SensorSpec, epoch: u64, period: Duration) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.tick(&spec, epoch).await {
                TickOutcome::Published => {}
                TickOutcome::PublishFailed { error_count } => {
                    debug!(sensor_id = spec.id, error_count, "Tick failed, sensor keeps running");
                }
                TickOutcome::Discarded => return,
                TickOutcome::ThresholdReached { error_count } => {
                    debug!(sensor_id = spec.id, error_count, "Error threshold reached");
                    break;
                }
            }
        }

        self.deactivate_after_errors(&spec, epoch).await;
    }

    async fn tick(&self, spec: &SensorSpec, epoch: u64) -> TickOutcome {
        let reading = self.inner.generator.generate(spec.sensor_type, spec.id);
        let event = SensorReadingEvent::from_reading(spec.id, &spec.owner_id, &reading);

        match publish_event(self.inner.bus.as_ref(), &event).await {
            Ok(()) => {
                if !self
                    .inner
                    .table
                    .record_success(spec.id, epoch, reading.timestamp)
                    .await
                {
                    return TickOutcome::Discarded;
                }
                trace!(sensor_id = spec.id, value = reading.value, unit = %reading.unit, "Published reading");
                TickOutcome::Published
            }
            Err(e) => {
                let Some(error_count) = self.inner.table.record_failure(spec.id, epoch).await
                else {
                    return TickOutcome::Discarded;
                };
                warn!(
                    sensor_id = spec.id,
                    error_count,
                    "⚠️  Failed to publish reading: {}",
                    e
                );
                if error_count >= self.inner.config.error_threshold {
                    TickOutcome::ThresholdReached { error_count }
                } else {
                    TickOutcome::PublishFailed { error_count }
                }
            }
        }
    }

    /// Threshold path, run from inside the sensor's own task
    async fn deactivate_after_errors(&self, spec: &SensorSpec, epoch: u64) {
        // Someone else stopped the sensor first; they own the events
        if self
            .inner
            .table
            .remove_if_epoch(spec.id, epoch)
            .await
            .is_none()
        {
            return;
        }

        self.inner.generator.reset_state(spec.id);
        error!(
            sensor_id = spec.id,
            threshold = self.inner.config.error_threshold,
            "❌ Sensor stopped after repeated publish failures"
        );
        self.emit_status(spec.id, &spec.owner_id, SensorStatus::Inactive)
            .await;
        self.emit_status(spec.id, &spec.owner_id, SensorStatus::Error)
            .await;
    }

    async fn emit_status(&self, id: SensorId, owner_id: &str, status: SensorStatus) -> bool {
        let event = SensorStatusEvent::now(id, owner_id.to_string(), status);
        match publish_event(self.inner.bus.as_ref(), &event).await {
            Ok(()) => true,
            Err(e) => {
                warn!(sensor_id = id, status = %status, "Failed to emit status event: {}", e);
                false
            }
        }
    }
}
