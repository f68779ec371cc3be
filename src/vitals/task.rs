//! Host-driven scheduling of vitals ticks
//!
//! The host calls [`VitalsTask::poll`] from its own event loop. Ticks land on
//! interval boundaries measured from [`VitalsTask::start`]; boundaries that
//! pass while the dashboard is hidden or paused are skipped, and several
//! boundaries crossed between two polls coalesce into one tick.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::trace;

use crate::types::VitalsState;
use crate::vitals::{ActivitySource, RealtimeVitalsSimulator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Stopped,
}

/// Periodic driver around a [`RealtimeVitalsSimulator`]
#[derive(Debug, Clone)]
pub struct VitalsTask<R: Rng = StdRng> {
    simulator: RealtimeVitalsSimulator<R>,
    interval_ms: u64,
    phase: Phase,
    origin_ms: u64,
    next_due_ms: u64,
    visible: bool,
    paused: bool,
    ticks: u64,
}

impl<R: Rng> VitalsTask<R> {
    /// Wrap a simulator; a zero interval is treated as 1 ms
    pub fn new(simulator: RealtimeVitalsSimulator<R>, interval_ms: u64) -> Self {
        Self {
            simulator,
            interval_ms: interval_ms.max(1),
            phase: Phase::Idle,
            origin_ms: 0,
            next_due_ms: 0,
            visible: true,
            paused: false,
            ticks: 0,
        }
    }

    /// Begin ticking; the first tick is one interval after `now_ms`
    pub fn start(&mut self, now_ms: u64) {
        if self.phase != Phase::Idle {
            return;
        }
        self.phase = Phase::Running;
        self.origin_ms = now_ms;
        self.next_due_ms = now_ms.saturating_add(self.interval_ms);
    }

    pub fn set_visible(&mut self, visible: bool, now_ms: u64) {
        let was_active = self.is_active();
        self.visible = visible;
        if !was_active && self.is_active() {
            self.rearm(now_ms);
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self, now_ms: u64) {
        let was_active = self.is_active();
        self.paused = false;
        if !was_active && self.is_active() {
            self.rearm(now_ms);
        }
    }

    /// Terminal: a stopped task never ticks again
    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == Phase::Stopped
    }

    /// Running, visible and not paused
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Running && self.visible && !self.paused
    }

    pub fn state(&self) -> VitalsState {
        self.simulator.state()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Tick if a boundary is due, returning the new state
    pub fn poll(&mut self, now_ms: u64, activity: &dyn ActivitySource) -> Option<VitalsState> {
        if !self.is_active() || now_ms < self.next_due_ms {
            return None;
        }

        let sample = activity.sample(now_ms);
        let state = self.simulator.tick(&sample);
        self.ticks += 1;
        self.next_due_ms = self.boundary_after(now_ms);
        trace!(
            now_ms,
            next_due_ms = self.next_due_ms,
            stress = state.stress,
            focus = state.focus,
            energy = state.energy,
            "vitals tick"
        );
        Some(state)
    }

    /// First boundary strictly after `t`
    fn boundary_after(&self, t: u64) -> u64 {
        let elapsed = t.saturating_sub(self.origin_ms);
        let k = elapsed / self.interval_ms + 1;
        self.origin_ms.saturating_add(k.saturating_mul(self.interval_ms))
    }

    /// First boundary at or after `t`, never earlier than the pending one
    fn rearm(&mut self, t: u64) {
        let elapsed = t.saturating_sub(self.origin_ms);
        let k = elapsed.div_ceil(self.interval_ms).max(1);
        let boundary = self.origin_ms.saturating_add(k.saturating_mul(self.interval_ms));
        self.next_due_ms = self.next_due_ms.max(boundary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VitalsConfig;
    use crate::vitals::{ActivitySample, ActivityTracker};
    use rand::SeedableRng;

    const INTERVAL: u64 = 5_000;

    fn task() -> VitalsTask {
        let sim = RealtimeVitalsSimulator::new(
            VitalsState::new(50, 50, 50),
            StdRng::seed_from_u64(11),
        );
        VitalsTask::new(sim, INTERVAL)
    }

    fn quiet() -> ActivitySample {
        ActivitySample::default()
    }

    #[test]
    fn test_ticks_on_interval_boundaries() {
        let mut t = task();
        t.start(1_000);

        assert!(t.poll(3_000, &quiet()).is_none());
        assert!(t.poll(6_000, &quiet()).is_some());
        assert!(t.poll(6_001, &quiet()).is_none());
        assert!(t.poll(10_999, &quiet()).is_none());
        assert!(t.poll(11_000, &quiet()).is_some());
        assert_eq!(t.ticks(), 2);
    }

    #[test]
    fn test_not_started_never_ticks() {
        let mut t = task();
        assert!(t.poll(100_000, &quiet()).is_none());
    }

    #[test]
    fn test_missed_boundaries_coalesce() {
        let mut t = task();
        t.start(0);
        assert!(t.poll(23_000, &quiet()).is_some());
        // next boundary after 23s is 25s
        assert!(t.poll(24_999, &quiet()).is_none());
        assert!(t.poll(25_000, &quiet()).is_some());
        assert_eq!(t.ticks(), 2);
    }

    #[test]
    fn test_hidden_intervals_produce_no_ticks() {
        let mut t = task();
        t.start(0);
        assert!(t.poll(5_000, &quiet()).is_some());

        t.set_visible(false, 6_000);
        for now in (10_000..=30_000).step_by(1_000) {
            assert!(t.poll(now, &quiet()).is_none(), "ticked while hidden at {now}");
        }

        // visible again at 32s: next boundary at or after is 35s
        t.set_visible(true, 32_000);
        assert!(t.poll(33_000, &quiet()).is_none());
        assert!(t.poll(35_000, &quiet()).is_some());
        assert_eq!(t.ticks(), 2);
    }

    #[test]
    fn test_visible_on_boundary_ticks_immediately() {
        let mut t = task();
        t.start(0);
        t.set_visible(false, 1_000);
        t.set_visible(true, 20_000);
        assert!(t.poll(20_000, &quiet()).is_some());
    }

    #[test]
    fn test_hide_and_show_does_not_double_tick() {
        let mut t = task();
        t.start(0);
        assert!(t.poll(5_000, &quiet()).is_some());
        t.set_visible(false, 5_000);
        t.set_visible(true, 5_000);
        assert!(t.poll(5_000, &quiet()).is_none());
    }

    #[test]
    fn test_pause_and_resume() {
        let mut t = task();
        t.start(0);
        t.pause();
        assert!(!t.is_active());
        assert!(t.poll(5_000, &quiet()).is_none());

        t.resume(12_000);
        assert!(t.poll(14_000, &quiet()).is_none());
        assert!(t.poll(15_000, &quiet()).is_some());
    }

    #[test]
    fn test_stop_is_terminal() {
        let mut t = task();
        t.start(0);
        t.stop();
        t.resume(1_000);
        t.set_visible(true, 1_000);
        t.start(2_000);
        for now in (0..60_000).step_by(2_500) {
            assert!(t.poll(now, &quiet()).is_none());
        }
        assert!(t.is_stopped());
        assert_eq!(t.ticks(), 0);
    }

    #[test]
    fn test_reads_activity_at_tick_time() {
        let sim = RealtimeVitalsSimulator::seeded(
            None,
            &VitalsConfig::default(),
            StdRng::seed_from_u64(5),
        );
        let start_focus = sim.state().focus;
        let mut t = VitalsTask::new(sim, INTERVAL);
        let mut tracker = ActivityTracker::new(0);
        t.start(0);

        tracker.track_typing(72.0, 4_000);
        let state = t.poll(5_000, &tracker).unwrap();
        assert_eq!(state.focus, start_focus + 3);
    }
}
