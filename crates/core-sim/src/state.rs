//! Per-sensor simulation state and the registry that holds it

use crate::profile::TypeProfile;
use crate::scenario::PollutionScenario;
use crate::TREND_LIMIT;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Stable numeric identity of a simulated sensor
pub type SensorId = u64;

/// Random-walk state carried between ticks of one sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Last emitted (unrounded) value, always within the profile bounds
    pub last_value: f64,
    /// Slow-moving drift direction, bounded to `[-0.4, 0.4]`
    pub trend: f64,
    /// Current pollution regime
    pub scenario: PollutionScenario,
}

impl SimulationState {
    /// Seed a fresh state: weighted scenario and a value inside its band
    pub fn seed<R: Rng>(profile: &TypeProfile, rng: &mut R) -> Self {
        let scenario = PollutionScenario::roll(rng);
        Self::seed_with_scenario(profile, scenario, rng)
    }

    /// Seed a fresh state for a specific scenario
    pub fn seed_with_scenario<R: Rng>(
        profile: &TypeProfile,
        scenario: PollutionScenario,
        rng: &mut R,
    ) -> Self {
        Self {
            last_value: scenario.seed_value(profile, rng),
            trend: 0.0,
            scenario,
        }
    }

    /// Nudge the trend by a small increment, keeping it bounded
    pub fn bump_trend(&mut self, increment: f64) {
        self.trend = (self.trend + increment).clamp(-TREND_LIMIT, TREND_LIMIT);
    }
}

/// Registry of simulation states keyed by sensor identity.
///
/// Critical sections are short and never span an await point, so a plain
/// mutex is enough. Ticks for the same sensor are serialized by the caller.
#[derive(Debug, Default)]
pub struct StateRegistry {
    states: Mutex<HashMap<SensorId, SimulationState>>,
}

impl StateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SensorId, SimulationState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the state for `id`, if one exists
    pub fn get(&self, id: SensorId) -> Option<SimulationState> {
        self.lock().get(&id).copied()
    }

    /// Store the state for `id`, replacing any previous one
    pub fn put(&self, id: SensorId, state: SimulationState) {
        self.lock().insert(id, state);
    }

    /// Drop the state for `id`; returns whether a state existed
    pub fn remove(&self, id: SensorId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Number of sensors with state
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no sensor has state
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every state
    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::SensorType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seed_is_within_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for sensor_type in SensorType::ALL {
            let profile = sensor_type.profile();
            for _ in 0..100 {
                let state = SimulationState::seed(profile, &mut rng);
                assert!(state.last_value >= profile.min && state.last_value <= profile.max);
                assert_eq!(state.trend, 0.0);
            }
        }
    }

    #[test]
    fn test_trend_is_clamped() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = SimulationState::seed(SensorType::Light.profile(), &mut rng);
        for _ in 0..50 {
            state.bump_trend(0.05);
        }
        assert_eq!(state.trend, TREND_LIMIT);
        for _ in 0..100 {
            state.bump_trend(-0.05);
        }
        assert_eq!(state.trend, -TREND_LIMIT);
    }

    #[test]
    fn test_registry_put_get_remove() {
        let registry = StateRegistry::new();
        assert!(registry.is_empty());

        let state = SimulationState {
            last_value: 20.0,
            trend: 0.1,
            scenario: PollutionScenario::Clean,
        };
        registry.put(9, state);
        assert_eq!(registry.get(9), Some(state));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(9));
        assert!(!registry.remove(9));
        assert_eq!(registry.get(9), None);
    }
}
