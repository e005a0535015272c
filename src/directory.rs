//! Sensor directory: the backend's record of which sensors exist
//!
//! Only consulted once, at startup, to restore the sensors that were active
//! when the previous process went away.

use crate::error::{Result, SimError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use envsim_bus::events::deserialize_owner_id;
use envsim_core_sim::{SensorId, SensorType};
use serde::{Deserialize, Serialize};

/// One sensor as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorRecord {
    /// Numeric identity used on the bus
    pub id: SensorId,

    /// Human-facing name
    #[serde(alias = "displayName")]
    pub sensor_id: String,

    /// Raw type string; parsed per record so one bad entry cannot sink the listing
    #[serde(rename = "type")]
    pub sensor_type: String,

    #[serde(deserialize_with = "deserialize_owner_id")]
    pub user_id: String,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl SensorRecord {
    pub fn parsed_type(&self) -> Result<SensorType> {
        Ok(self.sensor_type.parse::<SensorType>()?)
    }
}

/// Source of truth for the sensor fleet
#[async_trait]
pub trait SensorDirectory: Send + Sync {
    /// Every known sensor, active or not
    async fn list_sensors(&self) -> Result<Vec<SensorRecord>>;
}

/// Fixed listing, used for config-seeded fleets and in tests
#[derive(Debug, Clone, Default)]
pub struct StaticSensorDirectory {
    records: Vec<SensorRecord>,
    unavailable: Option<String>,
}

impl StaticSensorDirectory {
    pub fn new(records: Vec<SensorRecord>) -> Self {
        Self {
            records,
            unavailable: None,
        }
    }

    /// A directory whose every query fails with `reason`
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            unavailable: Some(reason.into()),
        }
    }
}

#[async_trait]
impl SensorDirectory for StaticSensorDirectory {
    async fn list_sensors(&self) -> Result<Vec<SensorRecord>> {
        match &self.unavailable {
            Some(reason) => Err(SimError::Directory(reason.clone())),
            None => Ok(self.records.clone()),
        }
    }
}

/// Response shapes accepted from the listing endpoint
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Bare(Vec<SensorRecord>),
    Wrapped {
        #[serde(alias = "data")]
        sensors: Vec<SensorRecord>,
    },
}

impl Listing {
    fn into_records(self) -> Vec<SensorRecord> {
        match self {
            Listing::Bare(records) => records,
            Listing::Wrapped { sensors } => sensors,
        }
    }
}

/// Parse a listing body, either a bare array or `{"sensors": [...]}` / `{"data": [...]}`
pub fn parse_listing(body: &str) -> Result<Vec<SensorRecord>> {
    let listing: Listing = serde_json::from_str(body)?;
    Ok(listing.into_records())
}

/// Directory backed by the backend's HTTP sensor listing
#[cfg(feature = "http-directory")]
#[derive(Debug, Clone)]
pub struct HttpSensorDirectory {
    client: reqwest::Client,
    url: String,
}

#[cfg(feature = "http-directory")]
impl HttpSensorDirectory {
    pub fn new(url: impl Into<String>, timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SimError::Directory(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "http-directory")]
#[async_trait]
impl SensorDirectory for HttpSensorDirectory {
    async fn list_sensors(&self) -> Result<Vec<SensorRecord>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SimError::Directory(format!("GET {} failed: {}", self.url, e)))?;

        let body = response
            .text()
            .await
            .map_err(|e| SimError::Directory(format!("Failed to read listing body: {}", e)))?;

        let records = parse_listing(&body)?;
        tracing::debug!(url = %self.url, count = records.len(), "Fetched sensor listing");
        Ok(records)
    }
}
