//! Live dashboard vitals
//!
//! After an assessment the dashboard shows a stress/focus/energy triple that
//! drifts with the user's activity. The pieces:
//!
//! - **activity**: ambient typing speed and idle time
//! - **simulator**: the per-tick update rule
//! - **task**: interval scheduling with visibility and stop handling

pub mod activity;
pub mod simulator;
pub mod task;

pub use activity::{ActivitySample, ActivitySource, ActivityTracker};
pub use simulator::RealtimeVitalsSimulator;
pub use task::VitalsTask;
