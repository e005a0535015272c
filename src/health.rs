//! Health Monitor: periodic reachability check of the message bus
//!
//! Independent of per-sensor scheduling and never touches sensor state. A
//! failed check is not retried; the next scheduled check is the retry.

use chrono::{DateTime, Utc};
use envsim_bus::MessageBus;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Outcome of one reachability check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub checked_at: DateTime<Utc>,
    pub reachable: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Statistics for the health monitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthMonitorStats {
    /// Total checks performed
    pub check_count: u64,
    /// Checks that found the bus unreachable
    pub failure_count: u64,
}

#[derive(Debug, Default)]
struct HealthState {
    last: Option<HealthCheck>,
    stats: HealthMonitorStats,
}

pub struct HealthMonitor {
    bus: Arc<dyn MessageBus>,
    interval: Duration,
    state: Mutex<HealthState>,
}

impl HealthMonitor {
    pub fn new(bus: Arc<dyn MessageBus>, interval: Duration) -> Self {
        Self {
            bus,
            interval,
            state: Mutex::new(HealthState::default()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn lock(&self) -> MutexGuard<'_, HealthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ping the bus once and record the result
    pub async fn check_once(&self) -> HealthCheck {
        let started = Instant::now();
        let result = self.bus.ping().await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let check = HealthCheck {
            checked_at: Utc::now(),
            reachable: result.is_ok(),
            latency_ms,
            error: result.err().map(|e| e.to_string()),
        };

        let mut state = self.lock();
        let was_reachable = state.last.as_ref().map(|c| c.reachable);
        match (was_reachable, check.reachable) {
            (Some(false), true) => info!(latency_ms, "✅ Message bus reachable again"),
            (Some(true) | None, false) => error!(
                "❌ Message bus unreachable: {}",
                check.error.as_deref().unwrap_or("unknown")
            ),
            (Some(false), false) => warn!("Message bus still unreachable"),
            _ => debug!(latency_ms, "Message bus reachable"),
        }

        state.stats.check_count += 1;
        if !check.reachable {
            state.stats.failure_count += 1;
        }
        state.last = Some(check.clone());
        check
    }

    pub fn last_check(&self) -> Option<HealthCheck> {
        self.lock().last.clone()
    }

    pub fn stats(&self) -> HealthMonitorStats {
        self.lock().stats
    }

    /// Run checks every interval until `shutdown` flips to true.
    ///
    /// The first check happens immediately.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "🩺 Health monitor active | Interval: {}s",
                self.interval.as_secs()
            );
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {
                        self.check_once().await;
                    }
                }
            }
            debug!("Health monitor stopped");
        })
    }
}
