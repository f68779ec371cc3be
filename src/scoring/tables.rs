//! Ordinal lookup tables for the fixed-choice questions
//!
//! Options are listed best → worst, so the index is the ordinal stress level.

use serde::{Deserialize, Serialize};

/// Ordinal index used when an answer is missing or unrecognized
pub const NEUTRAL_ORDINAL: usize = 2;

/// Highest ordinal index of every scale
pub const MAX_ORDINAL: usize = 4;

/// A fixed-choice question's answer scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerScale {
    SleepQuality,
    OverwhelmFrequency,
    Workload,
    SocialConnection,
}

impl AnswerScale {
    /// Option labels, best first
    pub fn options(&self) -> [&'static str; 5] {
        match self {
            AnswerScale::SleepQuality => ["Excellent", "Good", "Fair", "Poor", "Very poor"],
            AnswerScale::OverwhelmFrequency => ["Never", "Rarely", "Sometimes", "Often", "Always"],
            AnswerScale::Workload => ["Light", "Manageable", "Busy", "Overloaded", "Unmanageable"],
            AnswerScale::SocialConnection => [
                "Very connected",
                "Somewhat",
                "Neutral",
                "Isolated",
                "Very isolated",
            ],
        }
    }

    /// Ordinal stress level of an option label; case and surrounding space are ignored
    pub fn ordinal(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        if let Some(idx) = self
            .options()
            .iter()
            .position(|opt| opt.eq_ignore_ascii_case(label))
        {
            return Some(idx);
        }
        // The UI shows "Somewhat connected" but submits "Somewhat"
        match self {
            AnswerScale::SocialConnection if label.eq_ignore_ascii_case("Somewhat connected") => {
                Some(1)
            }
            _ => None,
        }
    }

    /// Ordinal scaled into [0, 1]
    pub fn level(&self, label: Option<&str>) -> f64 {
        let idx = label
            .and_then(|l| self.ordinal(l))
            .unwrap_or(NEUTRAL_ORDINAL);
        idx as f64 / MAX_ORDINAL as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worse_options_rank_higher() {
        for scale in [
            AnswerScale::SleepQuality,
            AnswerScale::OverwhelmFrequency,
            AnswerScale::Workload,
            AnswerScale::SocialConnection,
        ] {
            let levels: Vec<f64> = scale.options().iter().map(|o| scale.level(Some(o))).collect();
            assert!(levels.windows(2).all(|w| w[0] < w[1]), "{scale:?} not increasing");
            assert_eq!(levels[0], 0.0);
            assert_eq!(levels[4], 1.0);
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(AnswerScale::SleepQuality.ordinal("  very POOR "), Some(4));
        assert_eq!(AnswerScale::SocialConnection.ordinal("Somewhat connected"), Some(1));
    }

    #[test]
    fn test_missing_or_unknown_is_neutral() {
        assert_eq!(AnswerScale::Workload.level(None), 0.5);
        assert_eq!(AnswerScale::Workload.level(Some("Chaotic")), 0.5);
    }
}
