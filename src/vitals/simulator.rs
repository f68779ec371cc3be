//! Stress/focus/energy update rule
//!
//! Typing fast nudges stress and focus up, long idle stretches let them
//! settle, and a small bounded jitter keeps the readout from looking frozen.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::VitalsConfig;
use crate::store::StoredResult;
use crate::types::VitalsState;
use crate::vitals::ActivitySample;

/// Typing faster than this counts as a sprint
const FAST_TYPING_WPM: f64 = 60.0;
/// Typing faster than this counts as steady
const STEADY_TYPING_WPM: f64 = 40.0;

/// Idle longer than this counts as a break
const LONG_IDLE_SECS: f64 = 30.0;
/// Idle longer than this counts as a lull
const SHORT_IDLE_SECS: f64 = 10.0;

/// Jitter scale per field
const STRESS_JITTER: f64 = 0.3;
const FOCUS_JITTER: f64 = 0.2;
const ENERGY_JITTER: f64 = 0.1;

/// Lowest seeded focus and energy
const MIN_SEED_FOCUS: f64 = 20.0;
const MIN_SEED_ENERGY: f64 = 30.0;

/// Per-tick deltas before jitter
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Deltas {
    stress: f64,
    focus: f64,
    energy: f64,
}

fn activity_deltas(sample: &ActivitySample) -> Deltas {
    let mut d = Deltas::default();

    match sample.typing_wpm {
        Some(wpm) if wpm > FAST_TYPING_WPM => {
            d.stress += 2.0;
            d.focus += 3.0;
        }
        Some(wpm) if wpm > STEADY_TYPING_WPM => {
            d.stress += 1.0;
            d.focus += 2.0;
        }
        Some(wpm) if wpm > 0.0 => d.focus += 1.0,
        _ => {}
    }

    let idle = sample.idle_secs();
    if idle > LONG_IDLE_SECS {
        d.stress -= 2.0;
        d.focus -= 3.0;
        d.energy -= 1.0;
    } else if idle > SHORT_IDLE_SECS {
        d.stress -= 1.0;
        d.focus -= 1.0;
    }

    d
}

fn settle(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

/// Apply one tick with an explicit jitter `variation` in [-1, 1)
pub fn step(prev: VitalsState, sample: &ActivitySample, variation: f64) -> VitalsState {
    let d = activity_deltas(sample);
    let v = if variation.is_finite() {
        variation.clamp(-1.0, 1.0)
    } else {
        0.0
    };

    VitalsState {
        stress: settle(prev.stress as f64 + d.stress + v * STRESS_JITTER),
        focus: settle(prev.focus as f64 + d.focus + v * FOCUS_JITTER),
        energy: settle(prev.energy as f64 + d.energy + v * ENERGY_JITTER),
    }
}

/// Periodic vitals estimator with an injected random source
#[derive(Debug, Clone)]
pub struct RealtimeVitalsSimulator<R: Rng = StdRng> {
    state: VitalsState,
    rng: R,
}

impl RealtimeVitalsSimulator<StdRng> {
    /// Reproducible simulator for tests and CLI replays
    pub fn with_seed(
        stored: Option<&StoredResult>,
        config: &VitalsConfig,
        seed: u64,
    ) -> Self {
        Self::seeded(stored, config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RealtimeVitalsSimulator<R> {
    pub fn new(initial: VitalsState, rng: R) -> Self {
        Self {
            state: initial,
            rng,
        }
    }

    /// Derive the starting triple from the last stored result
    ///
    /// focus = max(20, 100 − stress − j₁), energy = max(30, 90 − stress/2 − j₂),
    /// with whole-number draws j₁ ∈ [0, 10) and j₂ ∈ [0, 15).
    pub fn seeded(stored: Option<&StoredResult>, config: &VitalsConfig, mut rng: R) -> Self {
        let stress = stored
            .map(|s| s.stress_score)
            .unwrap_or(config.default_stress)
            .min(100);
        let s = stress as f64;

        let focus_jitter = rng.gen_range(0..10) as f64;
        let energy_jitter = rng.gen_range(0..15) as f64;
        let focus = (100.0 - s - focus_jitter).max(MIN_SEED_FOCUS);
        let energy = (90.0 - s * 0.5 - energy_jitter).max(MIN_SEED_ENERGY);

        Self::new(VitalsState::new(stress, settle(focus), settle(energy)), rng)
    }

    /// Start from the configured defaults without deriving anything
    pub fn resting(config: &VitalsConfig, rng: R) -> Self {
        Self::new(
            VitalsState::new(
                config.default_stress,
                config.default_focus,
                config.default_energy,
            ),
            rng,
        )
    }

    pub fn state(&self) -> VitalsState {
        self.state
    }

    /// Advance one interval using a fresh jitter draw
    pub fn tick(&mut self, sample: &ActivitySample) -> VitalsState {
        let variation = (self.rng.gen::<f64>() - 0.5) * 2.0;
        self.state = step(self.state, sample, variation);
        self.state
    }
}
