//! Engine configuration
//!
//! All thresholds, bands and lookup assignments live here. A configuration is
//! immutable once built and can be shared across submissions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::scoring::AnswerScale;

/// Default gap between keystrokes (ms) counted as an idle pause
pub const DEFAULT_IDLE_THRESHOLD_MS: u64 = 3_000;

/// Answers shorter than this report a typing speed of zero
pub const DEFAULT_MIN_CHARS_FOR_SPEED: usize = 5;

/// Default vitals tick interval (ms)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 5_000;

/// A closed "normal" interval; values outside it are penalized
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    fn validate(&self, name: &str) -> Result<(), EngineError> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(EngineError::InvalidConfig(format!(
                "{name} bounds must be finite"
            )));
        }
        if self.low <= 0.0 || self.low >= self.high {
            return Err(EngineError::InvalidConfig(format!(
                "{name} must satisfy 0 < low < high (got {}..{})",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

/// Which measurement wins when a question is answered more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyPolicy {
    /// Keep the latency of the first selection; later selections only update the value
    #[default]
    FirstDecision,
    /// Re-measure on every selection
    LatestDecision,
}

/// Keystroke capture settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    pub idle_threshold_ms: u64,
    pub min_chars_for_speed: usize,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            idle_threshold_ms: DEFAULT_IDLE_THRESHOLD_MS,
            min_chars_for_speed: DEFAULT_MIN_CHARS_FOR_SPEED,
        }
    }
}

/// Choice latency capture settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub policy: LatencyPolicy,
}

/// Fusion settings for the stress calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Typing speed (WPM) considered neither rushed nor labored
    pub wpm_band: Band,
    /// Decision latency (ms) considered neither impulsive nor ruminating
    pub latency_band_ms: Band,
    /// Which lookup table scores which multiple-choice question
    pub question_scales: BTreeMap<String, AnswerScale>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let question_scales = [
            ("q1", AnswerScale::SleepQuality),
            ("q2", AnswerScale::OverwhelmFrequency),
            ("q3", AnswerScale::Workload),
            ("q5", AnswerScale::SocialConnection),
        ]
        .into_iter()
        .map(|(id, scale)| (id.to_string(), scale))
        .collect();

        Self {
            wpm_band: Band::new(20.0, 80.0),
            latency_band_ms: Band::new(1_500.0, 12_000.0),
            question_scales,
        }
    }
}

impl ScoringConfig {
    /// Lookup table for a question id, if it is a scored categorical question
    pub fn scale_for(&self, question_id: &str) -> Option<AnswerScale> {
        self.question_scales.get(question_id).copied()
    }
}

/// Dashboard vitals settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    pub tick_interval_ms: u64,
    /// Stress used when no assessment has been stored yet
    pub default_stress: u8,
    pub default_focus: u8,
    pub default_energy: u8,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            default_stress: 35,
            default_focus: 75,
            default_energy: 65,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub typing: TypingConfig,
    pub latency: LatencyConfig,
    pub scoring: ScoringConfig,
    pub vitals: VitalsConfig,
}

impl EngineConfig {
    /// Load and validate a configuration from JSON; missing sections take defaults
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.typing.idle_threshold_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "typing.idle_threshold_ms must be positive".to_string(),
            ));
        }
        self.scoring.wpm_band.validate("scoring.wpm_band")?;
        self.scoring.latency_band_ms.validate("scoring.latency_band_ms")?;
        if self.vitals.tick_interval_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "vitals.tick_interval_ms must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("vitals.default_stress", self.vitals.default_stress),
            ("vitals.default_focus", self.vitals.default_focus),
            ("vitals.default_energy", self.vitals.default_energy),
        ] {
            if value > 100 {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be within 0..=100"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{ "typing": { "idle_threshold_ms": 2000 } }"#)
            .unwrap();
        assert_eq!(config.typing.idle_threshold_ms, 2_000);
        assert_eq!(config.typing.min_chars_for_speed, DEFAULT_MIN_CHARS_FOR_SPEED);
        assert_eq!(config.vitals.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
        assert_eq!(
            config.scoring.scale_for("q1"),
            Some(AnswerScale::SleepQuality)
        );
    }

    #[test]
    fn test_inverted_band_rejected() {
        let json = r#"{ "scoring": { "wpm_band": { "low": 90.0, "high": 30.0 } } }"#;
        let err = EngineConfig::from_json(json).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_latency_policy_serialization() {
        let json = serde_json::to_string(&LatencyPolicy::LatestDecision).unwrap();
        assert_eq!(json, "\"latest_decision\"");
    }

    #[test]
    fn test_config_roundtrip() {
        let config = EngineConfig::default();
        let restored = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, restored);
    }
}
