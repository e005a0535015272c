//! Active Sensor Table: which sensors currently have a live generation task
//!
//! Each running sensor owns exactly one slot. A slot carries the task handle
//! plus an epoch number assigned at insertion; ticks write back through the
//! epoch so a task that outlives its slot (stopped, then restarted under the
//! same identity) can never touch the new slot.

use chrono::{DateTime, Utc};
use envsim_core_sim::{SensorId, SensorType};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Point-in-time view of one running sensor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSensorEntry {
    pub sensor_id: SensorId,
    pub display_name: String,
    pub sensor_type: SensorType,
    pub owner_id: String,
    /// Consecutive publish failures since the last success
    pub error_count: u32,
    pub last_reading_at: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
}

pub(crate) struct SensorSlot {
    pub(crate) entry: ActiveSensorEntry,
    pub(crate) epoch: u64,
    pub(crate) handle: JoinHandle<()>,
}

/// Shared table of running sensors
#[derive(Default)]
pub struct ActiveSensorTable {
    slots: RwLock<HashMap<SensorId, SensorSlot>>,
    next_epoch: AtomicU64,
}

impl ActiveSensorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a slot for `entry` unless the sensor is already present.
    ///
    /// `spawn` runs under the table's write lock and receives the slot's
    /// epoch, so check-and-insert is atomic with respect to concurrent starts.
    /// Returns false (and never calls `spawn`) when the sensor is present.
    pub(crate) async fn insert_with<F>(&self, entry: ActiveSensorEntry, spawn: F) -> bool
    where
        F: FnOnce(u64) -> JoinHandle<()>,
    {
        let mut slots = self.slots.write().await;
        if slots.contains_key(&entry.sensor_id) {
            return false;
        }

        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let handle = spawn(epoch);
        slots.insert(
            entry.sensor_id,
            SensorSlot {
                entry,
                epoch,
                handle,
            },
        );
        true
    }

    /// Remove the slot for `id` regardless of epoch
    pub(crate) async fn remove(&self, id: SensorId) -> Option<SensorSlot> {
        self.slots.write().await.remove(&id)
    }

    /// Remove the slot for `id` only if it still belongs to `epoch`
    pub(crate) async fn remove_if_epoch(&self, id: SensorId, epoch: u64) -> Option<SensorSlot> {
        let mut slots = self.slots.write().await;
        match slots.get(&id) {
            Some(slot) if slot.epoch == epoch => slots.remove(&id),
            _ => None,
        }
    }

    /// Remove every slot
    pub(crate) async fn drain(&self) -> Vec<SensorSlot> {
        self.slots.write().await.drain().map(|(_, slot)| slot).collect()
    }

    /// Record a successful publish; false if the slot is gone
    pub(crate) async fn record_success(
        &self,
        id: SensorId,
        epoch: u64,
        at: DateTime<Utc>,
    ) -> bool {
        let mut slots = self.slots.write().await;
        match slots.get_mut(&id) {
            Some(slot) if slot.epoch == epoch => {
                slot.entry.error_count = 0;
                slot.entry.last_reading_at = Some(at);
                true
            }
            _ => false,
        }
    }

    /// Record a failed publish; returns the new consecutive failure count,
    /// or None if the slot is gone
    pub(crate) async fn record_failure(&self, id: SensorId, epoch: u64) -> Option<u32> {
        let mut slots = self.slots.write().await;
        match slots.get_mut(&id) {
            Some(slot) if slot.epoch == epoch => {
                slot.entry.error_count = slot.entry.error_count.saturating_add(1);
                Some(slot.entry.error_count)
            }
            _ => None,
        }
    }

    pub async fn get(&self, id: SensorId) -> Option<ActiveSensorEntry> {
        self.slots.read().await.get(&id).map(|slot| slot.entry.clone())
    }

    pub async fn contains(&self, id: SensorId) -> bool {
        self.slots.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    /// Every running sensor, ordered by identity
    pub async fn snapshot(&self) -> Vec<ActiveSensorEntry> {
        let mut entries: Vec<ActiveSensorEntry> = self
            .slots
            .read()
            .await
            .values()
            .map(|slot| slot.entry.clone())
            .collect();
        entries.sort_by_key(|e| e.sensor_id);
        entries
    }
}
