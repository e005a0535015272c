//! Reading Generator: one stochastic tick per call
//!
//! # Algorithm
//!
//! ```text
//! state absent? ──> seed scenario (weighted) + value inside scenario band
//!      │
//!      ▼
//! regime shift (2%) ──> re-roll scenario
//!      │
//!      ▼
//! candidate = last
//!           + drift_rate × trend
//!           + U(±0.3 × variance)
//!           + 0.2 × diurnal(hour)
//!           + event (5%, ±variance burst)
//!      │
//!      ▼
//! scenario pull (×0.85 / ×1.25) ──> clamp [min, max] ──> persist ──> Reading
//! ```
//!
//! The generator never fails: every path ends in a clamp, so readings always
//! sit inside the profile bounds regardless of scenario or event.

use crate::diurnal;
use crate::profile::{SensorType, TypeProfile};
use crate::scenario::PollutionScenario;
use crate::state::{SensorId, SimulationState, StateRegistry};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Largest trend increment applied per tick
const TREND_STEP: f64 = 0.05;

/// Noise amplitude as a fraction of the profile variance
const NOISE_FACTOR: f64 = 0.3;

/// Weight of the diurnal modifier in the candidate value
const DIURNAL_WEIGHT: f64 = 0.2;

/// Tunable probabilities of the generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Chance per tick that the scenario is re-rolled
    #[serde(default = "default_regime_shift_probability")]
    pub regime_shift_probability: f64,

    /// Chance per tick of a one-off spike or drop
    #[serde(default = "default_event_probability")]
    pub event_probability: f64,
}

fn default_regime_shift_probability() -> f64 {
    0.02
}

fn default_event_probability() -> f64 {
    0.05
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            regime_shift_probability: default_regime_shift_probability(),
            event_probability: default_event_probability(),
        }
    }
}

impl GeneratorConfig {
    /// Configuration that never changes a sensor's scenario once seeded
    pub fn pinned_scenarios() -> Self {
        Self {
            regime_shift_probability: 0.0,
            ..Default::default()
        }
    }

    /// Validate that both probabilities lie in `[0, 1]`
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.regime_shift_probability) {
            return Err("regime_shift_probability must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.event_probability) {
            return Err("event_probability must be within [0, 1]".to_string());
        }
        Ok(())
    }
}

/// A single emitted measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Value rounded to two decimals
    pub value: f64,
    /// Unit of the sensor type
    pub unit: String,
    /// Emission time
    pub timestamp: DateTime<Utc>,
}

/// Stateful generator for every simulated sensor in the process
#[derive(Debug, Default)]
pub struct ReadingGenerator {
    config: GeneratorConfig,
    states: StateRegistry,
}

impl ReadingGenerator {
    /// Create a generator with the given probabilities
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            states: StateRegistry::new(),
        }
    }

    /// Generator configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Underlying state registry
    pub fn states(&self) -> &StateRegistry {
        &self.states
    }

    /// Produce the next reading for `id`, stamped with the current time
    pub fn generate(&self, sensor_type: SensorType, id: SensorId) -> Reading {
        self.generate_at(sensor_type, id, Utc::now())
    }

    /// Produce the next reading for `id` as if it were `at`
    pub fn generate_at(&self, sensor_type: SensorType, id: SensorId, at: DateTime<Utc>) -> Reading {
        self.generate_at_with_rng(sensor_type, id, at, &mut rand::rng())
    }

    /// Produce the next reading using a caller-supplied random source
    pub fn generate_at_with_rng<R: Rng>(
        &self,
        sensor_type: SensorType,
        id: SensorId,
        at: DateTime<Utc>,
        rng: &mut R,
    ) -> Reading {
        let profile = sensor_type.profile();

        let mut state = match self.states.get(id) {
            Some(state) => state,
            None => {
                let state = SimulationState::seed(profile, rng);
                debug!(
                    sensor_id = id,
                    sensor_type = %sensor_type,
                    scenario = %state.scenario,
                    initial_value = state.last_value,
                    "Seeded simulation state"
                );
                state
            }
        };

        let hour = diurnal::hour_of_day(at);
        let value = self.advance(sensor_type, profile, &mut state, hour, rng);
        self.states.put(id, state);

        trace!(sensor_id = id, value, scenario = %state.scenario, "Generated reading");

        Reading {
            value: round2(value),
            unit: profile.unit.to_string(),
            timestamp: at,
        }
    }

    /// Advance `state` by one tick and return the new unrounded value
    fn advance<R: Rng>(
        &self,
        sensor_type: SensorType,
        profile: &TypeProfile,
        state: &mut SimulationState,
        hour: f64,
        rng: &mut R,
    ) -> f64 {
        if chance(rng, self.config.regime_shift_probability) {
            let previous = state.scenario;
            state.scenario = PollutionScenario::roll(rng);
            if previous != state.scenario {
                debug!(from = %previous, to = %state.scenario, "Scenario shift");
            }
        }

        let diurnal = diurnal::modifier(sensor_type, hour);

        let event = if chance(rng, self.config.event_probability) {
            let magnitude = profile.variance * rng.random_range(0.5..1.5);
            if rng.random_bool(0.5) {
                magnitude
            } else {
                -magnitude
            }
        } else {
            0.0
        };

        state.bump_trend(rng.random_range(-TREND_STEP..=TREND_STEP));

        let noise_span = NOISE_FACTOR * profile.variance;
        let candidate = state.last_value
            + profile.drift_rate * state.trend
            + rng.random_range(-noise_span..=noise_span)
            + DIURNAL_WEIGHT * diurnal
            + event;

        let value = profile.clamp(state.scenario.pull(profile, candidate));
        state.last_value = value;
        value
    }

    /// Forget the state of `id`; the next reading re-seeds it.
    ///
    /// Returns whether a state existed.
    pub fn reset_state(&self, id: SensorId) -> bool {
        self.states.remove(id)
    }

    /// Current state of `id`, if seeded
    pub fn state_of(&self, id: SensorId) -> Option<SimulationState> {
        self.states.get(id)
    }

    /// Replace the state of `id`
    pub fn set_state(&self, id: SensorId, state: SimulationState) {
        self.states.put(id, state);
    }

    /// Generate `count` readings for backfill.
    ///
    /// Values follow the normal forward recurrence; timestamps are labelled
    /// backwards from now in steps of the type's update interval, so the
    /// first reading carries the newest timestamp.
    pub fn batch_history(&self, sensor_type: SensorType, id: SensorId, count: usize) -> Vec<Reading> {
        self.batch_history_from(sensor_type, id, count, Utc::now())
    }

    /// [`Self::batch_history`] anchored at `newest`
    pub fn batch_history_from(
        &self,
        sensor_type: SensorType,
        id: SensorId,
        count: usize,
        newest: DateTime<Utc>,
    ) -> Vec<Reading> {
        let step = chrono::Duration::milliseconds(sensor_type.profile().update_interval_ms as i64);
        let mut rng = rand::rng();
        (0..count)
            .map(|i| {
                let at = newest - step * i as i32;
                self.generate_at_with_rng(sensor_type, id, at, &mut rng)
            })
            .collect()
    }
}

/// Bernoulli trial that tolerates probabilities outside `[0, 1]`
fn chance<R: Rng>(rng: &mut R, probability: f64) -> bool {
    rng.random::<f64>() < probability
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
