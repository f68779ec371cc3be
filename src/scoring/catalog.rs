//! Intervention catalog
//!
//! Exactly one intervention per mood band. The catalog is external
//! configuration; the built-in default mirrors the dashboard's session cards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::scoring::Mood;

/// Session family of an intervention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionCategory {
    Micro,
    Focus,
    Recovery,
    Social,
    Emergency,
}

/// A recommended exercise or support action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Session length in seconds; 0 means immediate
    pub duration_sec: u32,
    pub category: InterventionCategory,
}

impl Intervention {
    fn new(
        id: &str,
        title: &str,
        description: &str,
        duration_sec: u32,
        category: InterventionCategory,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            duration_sec,
            category,
        }
    }

    /// Human-readable duration ("3 min", "Instant")
    pub fn duration_label(&self) -> String {
        match self.duration_sec {
            0 => "Instant".to_string(),
            s if s % 60 == 0 => format!("{} min", s / 60),
            s => format!("{s} sec"),
        }
    }
}

/// Wire form of one catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogEntry {
    mood: Mood,
    intervention: Intervention,
}

/// Validated mood → intervention mapping
#[derive(Debug, Clone, PartialEq)]
pub struct InterventionCatalog {
    entries: BTreeMap<Mood, Intervention>,
}

impl Default for InterventionCatalog {
    fn default() -> Self {
        use InterventionCategory::*;

        let entries = BTreeMap::from([
            (
                Mood::Calm,
                Intervention::new("deep-focus", "Deep Focus", "Pomodoro focus timer", 900, Focus),
            ),
            (
                Mood::Balanced,
                Intervention::new(
                    "box-breathing",
                    "Box Breathing",
                    "4-4-4-4 pattern for instant calm",
                    120,
                    Micro,
                ),
            ),
            (
                Mood::Rising,
                Intervention::new(
                    "grounding-breath",
                    "Grounding Breath",
                    "Deep grounding breathing to calm your nervous system",
                    180,
                    Micro,
                ),
            ),
            (
                Mood::High,
                Intervention::new(
                    "shoulder-jaw-release",
                    "Shoulder & Jaw Release",
                    "Release tension with gentle stretches + breathing",
                    240,
                    Recovery,
                ),
            ),
            (
                Mood::Critical,
                Intervention::new(
                    "emergency-sos",
                    "Emergency SOS",
                    "Immediate crisis support",
                    0,
                    Emergency,
                ),
            ),
        ]);

        Self { entries }
    }
}

impl InterventionCatalog {
    /// Build from (mood, intervention) pairs, requiring one entry per band
    pub fn from_entries(
        pairs: impl IntoIterator<Item = (Mood, Intervention)>,
    ) -> Result<Self, EngineError> {
        let mut entries = BTreeMap::new();
        for (mood, intervention) in pairs {
            if entries.insert(mood, intervention).is_some() {
                return Err(EngineError::DuplicateCatalogEntry(mood));
            }
        }
        if let Some(missing) = Mood::ALL.into_iter().find(|m| !entries.contains_key(m)) {
            return Err(EngineError::IncompleteCatalog(missing));
        }
        Ok(Self { entries })
    }

    /// Load from a JSON array of `{ "mood": ..., "intervention": {...} }`
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let raw: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Self::from_entries(raw.into_iter().map(|e| (e.mood, e.intervention)))
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        let raw: Vec<CatalogEntry> = self
            .entries
            .iter()
            .map(|(mood, intervention)| CatalogEntry {
                mood: *mood,
                intervention: intervention.clone(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&raw)?)
    }

    /// The intervention for a band. Total by construction.
    pub fn for_mood(&self, mood: Mood) -> &Intervention {
        &self.entries[&mood]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Mood, &Intervention)> {
        self.entries.iter().map(|(m, i)| (*m, i))
    }
}
