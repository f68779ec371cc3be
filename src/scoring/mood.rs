//! Mood bands
//!
//! The breakpoints here are shared by everything that visualizes stress
//! (assessment result, dashboard aura, guardian orb). Nothing else in the
//! crate thresholds a stress score.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Inclusive upper bounds of Calm, Balanced, Rising and High; Critical is everything above
pub const MOOD_BREAKPOINTS: [u8; 4] = [20, 40, 60, 80];

/// Five ordered stress bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mood {
    Calm,
    Balanced,
    Rising,
    High,
    Critical,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Calm,
        Mood::Balanced,
        Mood::Rising,
        Mood::High,
        Mood::Critical,
    ];

    /// The unique band containing `score`
    pub fn from_score(score: u8) -> Self {
        let [calm, balanced, rising, high] = MOOD_BREAKPOINTS;
        match score {
            s if s <= calm => Mood::Calm,
            s if s <= balanced => Mood::Balanced,
            s if s <= rising => Mood::Rising,
            s if s <= high => Mood::High,
            _ => Mood::Critical,
        }
    }

    /// Inclusive score range of this band
    pub fn range(&self) -> (u8, u8) {
        let [calm, balanced, rising, high] = MOOD_BREAKPOINTS;
        match self {
            Mood::Calm => (0, calm),
            Mood::Balanced => (calm + 1, balanced),
            Mood::Rising => (balanced + 1, rising),
            Mood::High => (rising + 1, high),
            Mood::Critical => (high + 1, 100),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Calm => "Calm",
            Mood::Balanced => "Balanced",
            Mood::Rising => "Rising",
            Mood::High => "High",
            Mood::Critical => "Critical",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::ParseError(format!("Unknown mood: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoints_are_inclusive() {
        assert_eq!(Mood::from_score(0), Mood::Calm);
        assert_eq!(Mood::from_score(20), Mood::Calm);
        assert_eq!(Mood::from_score(21), Mood::Balanced);
        assert_eq!(Mood::from_score(40), Mood::Balanced);
        assert_eq!(Mood::from_score(41), Mood::Rising);
        assert_eq!(Mood::from_score(60), Mood::Rising);
        assert_eq!(Mood::from_score(61), Mood::High);
        assert_eq!(Mood::from_score(80), Mood::High);
        assert_eq!(Mood::from_score(81), Mood::Critical);
        assert_eq!(Mood::from_score(100), Mood::Critical);
    }

    #[test]
    fn test_every_score_lands_in_its_band_range() {
        for score in 0..=100u8 {
            let (lo, hi) = Mood::from_score(score).range();
            assert!(lo <= score && score <= hi, "score {score} outside {lo}..={hi}");
        }
    }

    #[test]
    fn test_bands_are_ordered() {
        assert!(Mood::Calm < Mood::Balanced);
        assert!(Mood::High < Mood::Critical);
    }

    #[test]
    fn test_mood_serialization() {
        assert_eq!(serde_json::to_string(&Mood::Rising).unwrap(), "\"Rising\"");
        assert_eq!("critical".parse::<Mood>().unwrap(), Mood::Critical);
        assert!("panicked".parse::<Mood>().is_err());
    }
}
