//! NeuroAura Engine - Behavioral stress inference for a student wellness app
//!
//! The engine turns the telemetry of a short assessment into a stress score,
//! a mood band and an intervention through a deterministic pipeline:
//! keystroke/latency capture → sentiment → fusion → mood classification →
//! intervention lookup. A secondary estimator keeps a stress/focus/energy
//! triple moving on the dashboard afterwards.
//!
//! ## Modules
//!
//! - **Telemetry**: typing metrics and choice latency collectors
//! - **Sentiment**: bounded lexical polarity scorer
//! - **Scoring**: stress fusion, mood bands and the intervention catalog
//! - **Vitals**: the live dashboard estimator and its schedulable task
//! - **Assessment / Pipeline**: the host-side flow and one-shot entry points

pub mod assessment;
pub mod clock;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod scoring;
pub mod sentiment;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod vitals;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use assessment::{standard_questionnaire, AssessmentSession, QuestionSpec};
pub use config::EngineConfig;
pub use error::EngineError;
pub use pipeline::{score_assessment_json, StressEngine};
pub use scoring::{InterventionCatalog, Mood, StressScoreCalculator};
pub use sentiment::analyze_sentiment;
pub use store::{InMemoryResultStore, JsonFileResultStore, ResultRepository, StoredResult};
pub use telemetry::{ChoiceLatencyTracker, TypingMetricsCollector};
pub use types::{AssessmentPayload, QuestionAnswer, StressResult, TypingMetrics, VitalsState};
pub use vitals::{ActivityTracker, RealtimeVitalsSimulator, VitalsTask};

/// Engine version embedded in CLI and FFI output
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the outer surfaces
pub const PRODUCER_NAME: &str = "neuroaura-engine";
