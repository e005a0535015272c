//! JSON payloads carried on each channel
//!
//! Field names are camelCase on the wire. Owner identifiers are carried as
//! strings; numeric owner ids sent by producers are accepted and stringified.

use crate::bus::BusEvent;
use crate::channel::Channel;
use chrono::{DateTime, Utc};
use envsim_core_sim::{Reading, SensorId, SensorType};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Payload of `sensor-created`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorCreatedEvent {
    pub sensor_identity: SensorId,
    pub display_name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    #[serde(deserialize_with = "deserialize_owner_id")]
    pub owner_id: String,
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload of `sensor-status-change`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorStatusChangeEvent {
    pub sensor_identity: SensorId,
    pub display_name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    #[serde(deserialize_with = "deserialize_owner_id")]
    pub owner_id: String,
    pub active: bool,
}

/// Payload of `sensor-reading`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReadingEvent {
    pub sensor_identity: SensorId,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub unit: String,
    #[serde(deserialize_with = "deserialize_owner_id")]
    pub owner_id: String,
}

impl SensorReadingEvent {
    pub fn from_reading(sensor_identity: SensorId, owner_id: &str, reading: &Reading) -> Self {
        Self {
            sensor_identity,
            timestamp: reading.timestamp,
            value: reading.value,
            unit: reading.unit.clone(),
            owner_id: owner_id.to_string(),
        }
    }
}

/// Lifecycle status reported on `sensor-status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Active,
    Inactive,
    Error,
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorStatus::Active => write!(f, "active"),
            SensorStatus::Inactive => write!(f, "inactive"),
            SensorStatus::Error => write!(f, "error"),
        }
    }
}

/// Payload of `sensor-status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorStatusEvent {
    pub sensor_identity: SensorId,
    #[serde(deserialize_with = "deserialize_owner_id")]
    pub owner_id: String,
    pub status: SensorStatus,
    pub timestamp: DateTime<Utc>,
}

impl SensorStatusEvent {
    /// Status event stamped with the current time
    pub fn now(sensor_identity: SensorId, owner_id: String, status: SensorStatus) -> Self {
        Self {
            sensor_identity,
            owner_id,
            status,
            timestamp: Utc::now(),
        }
    }
}

impl BusEvent for SensorCreatedEvent {
    const CHANNEL: Channel = Channel::SensorCreated;
}

impl BusEvent for SensorStatusChangeEvent {
    const CHANNEL: Channel = Channel::SensorStatusChange;
}

impl BusEvent for SensorReadingEvent {
    const CHANNEL: Channel = Channel::SensorReading;
}

impl BusEvent for SensorStatusEvent {
    const CHANNEL: Channel = Channel::SensorStatus;
}

/// Accept an owner id sent either as a JSON string or a JSON integer
pub fn deserialize_owner_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
