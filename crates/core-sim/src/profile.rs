//! Sensor types and their immutable generation profiles
//!
//! Every sensor type maps to exactly one [`TypeProfile`]. The profiles live in
//! a constant table indexed by the enum discriminant and are never mutated.

use crate::error::ParseSensorTypeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Kind of environmental quantity a simulated sensor measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorType {
    Temperature = 0,
    Humidity = 1,
    AirQuality = 2,
    Light = 3,
    Noise = 4,
    Co2 = 5,
}

/// Generation parameters for one sensor type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeProfile {
    /// Typical resting value
    pub base_value: f64,
    /// Characteristic spread, scales noise and burst events
    pub variance: f64,
    /// Hard lower bound for every reading
    pub min: f64,
    /// Hard upper bound for every reading
    pub max: f64,
    /// Unit label attached to readings
    pub unit: &'static str,
    /// Cadence of the scheduled tick
    pub update_interval_ms: u64,
    /// Multiplier applied to the trend on every tick
    pub drift_rate: f64,
}

impl TypeProfile {
    /// Width of the valid value range
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Absolute value located at `fraction` of the range (0.0 = min, 1.0 = max)
    pub fn at_fraction(&self, fraction: f64) -> f64 {
        self.min + self.range() * fraction
    }

    /// Position of `value` within the range as a fraction
    pub fn fraction_of(&self, value: f64) -> f64 {
        (value - self.min) / self.range()
    }

    /// Clamp `value` into `[min, max]`
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Midpoint of the valid range
    pub fn midpoint(&self) -> f64 {
        self.at_fraction(0.5)
    }

    /// Tick cadence as a [`Duration`]
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}

const PROFILES: [TypeProfile; 6] = [
    // Temperature
    TypeProfile {
        base_value: 22.0,
        variance: 3.0,
        min: 5.0,
        max: 45.0,
        unit: "CELSIUS",
        update_interval_ms: 5_000,
        drift_rate: 0.1,
    },
    // Humidity
    TypeProfile {
        base_value: 55.0,
        variance: 10.0,
        min: 10.0,
        max: 95.0,
        unit: "PERCENT",
        update_interval_ms: 7_000,
        drift_rate: 0.2,
    },
    // AirQuality
    TypeProfile {
        base_value: 50.0,
        variance: 30.0,
        min: 0.0,
        max: 500.0,
        unit: "AQI",
        update_interval_ms: 10_000,
        drift_rate: 0.5,
    },
    // Light
    TypeProfile {
        base_value: 400.0,
        variance: 200.0,
        min: 0.0,
        max: 2_000.0,
        unit: "LUX",
        update_interval_ms: 6_000,
        drift_rate: 2.0,
    },
    // Noise
    TypeProfile {
        base_value: 45.0,
        variance: 10.0,
        min: 20.0,
        max: 120.0,
        unit: "DECIBEL",
        update_interval_ms: 5_000,
        drift_rate: 0.3,
    },
    // Co2
    TypeProfile {
        base_value: 600.0,
        variance: 150.0,
        min: 350.0,
        max: 5_000.0,
        unit: "PPM",
        update_interval_ms: 12_000,
        drift_rate: 5.0,
    },
];

impl SensorType {
    /// All sensor types in table order
    pub const ALL: [SensorType; 6] = [
        SensorType::Temperature,
        SensorType::Humidity,
        SensorType::AirQuality,
        SensorType::Light,
        SensorType::Noise,
        SensorType::Co2,
    ];

    /// The immutable profile for this type
    pub fn profile(self) -> &'static TypeProfile {
        &PROFILES[self as usize]
    }

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "TEMPERATURE",
            SensorType::Humidity => "HUMIDITY",
            SensorType::AirQuality => "AIR_QUALITY",
            SensorType::Light => "LIGHT",
            SensorType::Noise => "NOISE",
            SensorType::Co2 => "CO2",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = ParseSensorTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        SensorType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ParseSensorTypeError(s.to_string()))
    }
}

/// Deserialization goes through [`FromStr`], so payloads and listings accept
/// the same spellings.
impl<'de> Deserialize<'de> for SensorType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_table_is_indexed_by_type() {
        assert_eq!(SensorType::Temperature.profile().unit, "CELSIUS");
        assert_eq!(SensorType::Humidity.profile().unit, "PERCENT");
        assert_eq!(SensorType::AirQuality.profile().unit, "AQI");
        assert_eq!(SensorType::Light.profile().unit, "LUX");
        assert_eq!(SensorType::Noise.profile().unit, "DECIBEL");
        assert_eq!(SensorType::Co2.profile().unit, "PPM");
    }

    #[test]
    fn test_profiles_are_well_formed() {
        for sensor_type in SensorType::ALL {
            let p = sensor_type.profile();
            assert!(p.min < p.max, "{} has an empty range", sensor_type);
            assert!(p.base_value >= p.min && p.base_value <= p.max);
            assert!(p.variance > 0.0);
            assert!((5_000..=12_000).contains(&p.update_interval_ms));
        }
    }

    #[test]
    fn test_temperature_bounds() {
        let p = SensorType::Temperature.profile();
        assert_eq!(p.min, 5.0);
        assert_eq!(p.max, 45.0);
        assert_eq!(p.update_interval(), Duration::from_millis(5_000));
        assert_eq!(p.midpoint(), 25.0);
    }

    #[test]
    fn test_fraction_helpers() {
        let p = SensorType::Noise.profile();
        assert_eq!(p.at_fraction(0.0), 20.0);
        assert_eq!(p.at_fraction(1.0), 120.0);
        assert!((p.fraction_of(70.0) - 0.5).abs() < 1e-9);
        assert_eq!(p.clamp(500.0), 120.0);
        assert_eq!(p.clamp(-3.0), 20.0);
    }

    #[test]
    fn test_parse_sensor_type() {
        assert_eq!("TEMPERATURE".parse::<SensorType>(), Ok(SensorType::Temperature));
        assert_eq!("air_quality".parse::<SensorType>(), Ok(SensorType::AirQuality));
        assert_eq!("air-quality".parse::<SensorType>(), Ok(SensorType::AirQuality));
        assert_eq!(" co2 ".parse::<SensorType>(), Ok(SensorType::Co2));
        assert!("PRESSURE".parse::<SensorType>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&SensorType::AirQuality).unwrap();
        assert_eq!(json, "\"AIR_QUALITY\"");
        let parsed: SensorType = serde_json::from_str("\"CO2\"").unwrap();
        assert_eq!(parsed, SensorType::Co2);
    }

    #[test]
    fn test_deserialize_matches_from_str() {
        for raw in ["\"temperature\"", "\"Air-Quality\"", "\"co2\""] {
            let parsed: SensorType = serde_json::from_str(raw).unwrap();
            let text: String = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed, text.parse().unwrap());
        }
        assert!(serde_json::from_str::<SensorType>("\"PRESSURE\"").is_err());
        assert!(serde_json::from_str::<SensorType>("3").is_err());
    }
}
