//! Pollution scenarios: coarse regimes that bias a sensor's readings
//!
//! A scenario never moves a value outside the profile bounds. It only decides
//! where a freshly seeded sensor starts and which way the value is nudged
//! when it strays from the scenario's preferred band.

use crate::profile::TypeProfile;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nudge applied when a value sits above the scenario's band
pub const PULL_DOWN: f64 = 0.85;

/// Nudge applied when a value sits below the scenario's band
pub const PULL_UP: f64 = 1.25;

/// Pollution regime of one simulated sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollutionScenario {
    Clean,
    Moderate,
    Polluted,
    Critical,
}

/// Relative weights used for seeding and regime shifts
const WEIGHTS: [(PollutionScenario, u32); 4] = [
    (PollutionScenario::Clean, 2),
    (PollutionScenario::Moderate, 3),
    (PollutionScenario::Polluted, 1),
    (PollutionScenario::Critical, 1),
];

impl PollutionScenario {
    /// All scenarios, least to most severe
    pub const ALL: [PollutionScenario; 4] = [
        PollutionScenario::Clean,
        PollutionScenario::Moderate,
        PollutionScenario::Polluted,
        PollutionScenario::Critical,
    ];

    /// Draw a scenario from the weighted distribution
    /// {clean: 2, moderate: 3, polluted: 1, critical: 1}
    pub fn roll<R: Rng>(rng: &mut R) -> Self {
        let total: u32 = WEIGHTS.iter().map(|(_, w)| w).sum();
        let mut pick = rng.random_range(0..total);
        for (scenario, weight) in WEIGHTS {
            if pick < weight {
                return scenario;
            }
            pick -= weight;
        }
        PollutionScenario::Moderate
    }

    /// Weight of this scenario in the seeding distribution
    pub fn weight(&self) -> u32 {
        WEIGHTS
            .iter()
            .find(|(s, _)| s == self)
            .map(|(_, w)| *w)
            .unwrap_or(0)
    }

    /// Fractional band of the range used to place a freshly seeded value
    pub fn seed_band(&self) -> (f64, f64) {
        match self {
            PollutionScenario::Clean => (0.20, 0.50),
            PollutionScenario::Moderate => (0.30, 0.60),
            PollutionScenario::Polluted => (0.50, 0.80),
            PollutionScenario::Critical => (0.70, 0.95),
        }
    }

    /// Pick an initial value inside this scenario's seed band
    pub fn seed_value<R: Rng>(&self, profile: &TypeProfile, rng: &mut R) -> f64 {
        let (low, high) = self.seed_band();
        profile.at_fraction(rng.random_range(low..high))
    }

    /// Apply the scenario-specific multiplicative nudge to a candidate value.
    ///
    /// The result is not clamped; callers clamp afterwards.
    pub fn pull(&self, profile: &TypeProfile, candidate: f64) -> f64 {
        let position = profile.fraction_of(candidate);
        match self {
            PollutionScenario::Clean if position > 0.60 => candidate * PULL_DOWN,
            PollutionScenario::Moderate if position < 0.20 => candidate * PULL_UP,
            PollutionScenario::Moderate if position > 0.80 => candidate * PULL_DOWN,
            PollutionScenario::Polluted if position < 0.40 => candidate * PULL_UP,
            PollutionScenario::Critical if position < 0.60 => candidate * PULL_UP,
            _ => candidate,
        }
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            PollutionScenario::Clean => "clean",
            PollutionScenario::Moderate => "moderate",
            PollutionScenario::Polluted => "polluted",
            PollutionScenario::Critical => "critical",
        }
    }
}

impl fmt::Display for PollutionScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
