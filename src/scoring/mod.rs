//! Stress scoring
//!
//! Fusion of explicit answers and behavioral telemetry into a stress score,
//! classification into mood bands and intervention lookup.

pub mod calculator;
pub mod catalog;
pub mod mood;
pub mod tables;

pub use calculator::{ScoreBreakdown, StressScoreCalculator, TypingContribution, NEUTRAL_SCORE};
pub use catalog::{Intervention, InterventionCatalog, InterventionCategory};
pub use mood::{Mood, MOOD_BREAKPOINTS};
pub use tables::AnswerScale;
