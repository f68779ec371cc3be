//! Error types for the NeuroAura engine
//!
//! Scoring itself never fails: malformed per-question data degrades to neutral
//! contributions. Errors are reserved for the boundaries around it (parsing,
//! configuration, catalog, persistence and FFI).

use thiserror::Error;

use crate::scoring::Mood;

/// Errors that can occur at the engine's boundaries
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse assessment payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Intervention catalog has no entry for mood band {0:?}")]
    IncompleteCatalog(Mood),

    #[error("Intervention catalog has more than one entry for mood band {0:?}")]
    DuplicateCatalogEntry(Mood),

    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Assessment already submitted: {0}")]
    AlreadySubmitted(String),
}
