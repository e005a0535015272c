//! Time-of-day shaping per sensor type
//!
//! Temperature, humidity and light follow smooth sinusoids. Noise, CO2 and
//! air quality follow step functions keyed to rush hours and occupancy.
//! Modifiers are expressed in the sensor's own unit, scaled by its variance.

use crate::profile::SensorType;
use chrono::{DateTime, Timelike, Utc};
use std::f64::consts::PI;

/// Fractional hour of day (0.0 ..< 24.0) for a timestamp
pub fn hour_of_day(at: DateTime<Utc>) -> f64 {
    at.hour() as f64 + at.minute() as f64 / 60.0
}

fn is_rush_hour(hour: f64) -> bool {
    (7.0..9.0).contains(&hour) || (17.0..19.0).contains(&hour)
}

fn is_night(hour: f64) -> bool {
    !(6.0..22.0).contains(&hour)
}

/// Diurnal modifier for `sensor_type` at fractional `hour`
pub fn modifier(sensor_type: SensorType, hour: f64) -> f64 {
    let variance = sensor_type.profile().variance;
    match sensor_type {
        // Peaks mid-afternoon, bottoms out before dawn
        SensorType::Temperature => (2.0 * PI * (hour - 9.0) / 24.0).sin() * variance,
        // Mirrors temperature: relative humidity is highest in the cool morning
        SensorType::Humidity => -(2.0 * PI * (hour - 9.0) / 24.0).sin() * variance,
        SensorType::Light => {
            if (6.0..20.0).contains(&hour) {
                (PI * (hour - 6.0) / 14.0).sin() * variance
            } else {
                -variance
            }
        }
        SensorType::Noise => {
            if is_rush_hour(hour) {
                variance
            } else if is_night(hour) {
                -0.5 * variance
            } else {
                0.0
            }
        }
        SensorType::Co2 => {
            if (9.0..17.0).contains(&hour) {
                0.5 * variance
            } else if is_night(hour) {
                -0.3 * variance
            } else {
                0.0
            }
        }
        SensorType::AirQuality => {
            if is_rush_hour(hour) {
                0.5 * variance
            } else {
                0.0
            }
        }
    }
}
