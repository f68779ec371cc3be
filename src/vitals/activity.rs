//! Ambient activity signals for the vitals tick

use serde::{Deserialize, Serialize};

/// One reading of the user's recent activity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivitySample {
    /// Most recent typing speed, if the user has typed at all
    pub typing_wpm: Option<f64>,
    /// Time since the last tracked interaction
    pub idle_ms: u64,
}

impl ActivitySample {
    pub fn idle_secs(&self) -> f64 {
        self.idle_ms as f64 / 1000.0
    }
}

/// Supplies activity readings to the vitals task
pub trait ActivitySource {
    fn sample(&self, now_ms: u64) -> ActivitySample;
}

impl ActivitySource for ActivitySample {
    fn sample(&self, _now_ms: u64) -> ActivitySample {
        *self
    }
}

/// Activity source fed by the host's input events
///
/// Typing speed is sticky: it keeps the last reported value until the next
/// report, mirroring how the dashboard only hears about typing when it happens.
#[derive(Debug, Clone, Default)]
pub struct ActivityTracker {
    typing_wpm: Option<f64>,
    last_activity_ms: u64,
}

impl ActivityTracker {
    pub fn new(now_ms: u64) -> Self {
        Self {
            typing_wpm: None,
            last_activity_ms: now_ms,
        }
    }

    /// Record a typing speed reading; counts as activity
    pub fn track_typing(&mut self, wpm: f64, now_ms: u64) {
        self.typing_wpm = wpm.is_finite().then_some(wpm.max(0.0));
        self.track_activity(now_ms);
    }

    /// Record a click, scroll or pointer movement
    pub fn track_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = self.last_activity_ms.max(now_ms);
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }
}

impl ActivitySource for ActivityTracker {
    fn sample(&self, now_ms: u64) -> ActivitySample {
        ActivitySample {
            typing_wpm: self.typing_wpm,
            idle_ms: now_ms.saturating_sub(self.last_activity_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_time_measured_from_last_activity() {
        let mut tracker = ActivityTracker::new(1_000);
        assert_eq!(tracker.sample(4_000).idle_ms, 3_000);

        tracker.track_activity(10_000);
        let sample = tracker.sample(25_000);
        assert_eq!(sample.idle_ms, 15_000);
        assert_eq!(sample.idle_secs(), 15.0);
        assert_eq!(sample.typing_wpm, None);
    }

    #[test]
    fn test_typing_is_sticky_and_resets_idle() {
        let mut tracker = ActivityTracker::new(0);
        tracker.track_typing(55.0, 2_000);
        tracker.track_activity(9_000);

        let sample = tracker.sample(9_500);
        assert_eq!(sample.typing_wpm, Some(55.0));
        assert_eq!(sample.idle_ms, 500);
    }

    #[test]
    fn test_clock_going_backwards_is_ignored() {
        let mut tracker = ActivityTracker::new(5_000);
        tracker.track_activity(3_000);
        assert_eq!(tracker.last_activity_ms(), 5_000);
        assert_eq!(tracker.sample(4_000).idle_ms, 0);
    }

    #[test]
    fn test_non_finite_speed_dropped() {
        let mut tracker = ActivityTracker::new(0);
        tracker.track_typing(f64::NAN, 100);
        assert_eq!(tracker.sample(100).typing_wpm, None);
    }
}
