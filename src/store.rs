//! Persistence port for the latest assessment result
//!
//! The engine writes through a [`ResultRepository`] at submission and the
//! dashboard reads from it to seed its vitals. Implementations own storage;
//! the engine never touches ambient global state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::EngineError;
use crate::scoring::Mood;
use crate::types::StressResult;

/// What the dashboard needs from the last assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub user_id: String,
    pub stress_score: u8,
    pub mood: Mood,
    pub recorded_at: DateTime<Utc>,
}

impl StoredResult {
    pub fn from_result(user_id: &str, result: &StressResult, recorded_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            stress_score: result.stress_score.min(100),
            mood: result.mood,
            recorded_at,
        }
    }

    /// Clamp the score and derive the mood from it again
    fn normalized(mut self) -> Self {
        self.stress_score = self.stress_score.min(100);
        self.mood = Mood::from_score(self.stress_score);
        self
    }
}

/// Durable store of the latest result per user
pub trait ResultRepository {
    /// Replace the user's latest result
    fn save(&mut self, user_id: &str, result: &StressResult) -> Result<StoredResult, EngineError>;

    /// The user's latest result, if any
    fn latest(&self, user_id: &str) -> Result<Option<StoredResult>, EngineError>;
}

impl<R: ResultRepository + ?Sized> ResultRepository for &mut R {
    fn save(&mut self, user_id: &str, result: &StressResult) -> Result<StoredResult, EngineError> {
        (**self).save(user_id, result)
    }

    fn latest(&self, user_id: &str) -> Result<Option<StoredResult>, EngineError> {
        (**self).latest(user_id)
    }
}

/// Process-local repository
#[derive(Debug, Clone, Default)]
pub struct InMemoryResultStore {
    results: BTreeMap<String, StoredResult>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl ResultRepository for InMemoryResultStore {
    fn save(&mut self, user_id: &str, result: &StressResult) -> Result<StoredResult, EngineError> {
        let stored = StoredResult::from_result(user_id, result, Utc::now());
        self.results.insert(user_id.to_string(), stored.clone());
        Ok(stored)
    }

    fn latest(&self, user_id: &str) -> Result<Option<StoredResult>, EngineError> {
        Ok(self.results.get(user_id).cloned())
    }
}

/// Repository backed by a single JSON file keyed by user id
#[derive(Debug, Clone)]
pub struct JsonFileResultStore {
    path: PathBuf,
}

impl JsonFileResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, StoredResult>, EngineError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let all: BTreeMap<String, StoredResult> = serde_json::from_str(&content)
            .map_err(|e| EngineError::Storage(format!("{}: {e}", self.path.display())))?;
        Ok(all
            .into_iter()
            .map(|(user_id, stored)| (user_id, stored.normalized()))
            .collect())
    }
}

impl ResultRepository for JsonFileResultStore {
    fn save(&mut self, user_id: &str, result: &StressResult) -> Result<StoredResult, EngineError> {
        let mut all = self.load()?;
        let stored = StoredResult::from_result(user_id, result, Utc::now());
        all.insert(user_id.to_string(), stored.clone());

        // Atomic replace: sibling temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(&all)?)?;
        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), user_id, "stored assessment result");
        Ok(stored)
    }

    fn latest(&self, user_id: &str) -> Result<Option<StoredResult>, EngineError> {
        Ok(self.load()?.remove(user_id))
    }
}
