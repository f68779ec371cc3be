//! Keystroke timing capture for the free-text question
//!
//! Only timing and key class are recorded, never which character was typed.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::TypingConfig;
use crate::telemetry::mean_and_std_dev;
use crate::types::TypingMetrics;

/// Key class of a keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    Character,
    Backspace,
    /// Modifiers, navigation, Enter, Tab and other non-text keys
    Control,
}

impl KeyKind {
    /// Classify a DOM-style `key` value
    pub fn classify(key: &str) -> Self {
        if key == "Backspace" {
            return KeyKind::Backspace;
        }
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => KeyKind::Character,
            _ => KeyKind::Control,
        }
    }
}

/// A single key-down event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyStroke {
    pub timestamp_ms: u64,
    pub kind: KeyKind,
}

impl KeyStroke {
    pub fn new(timestamp_ms: u64, kind: KeyKind) -> Self {
        Self { timestamp_ms, kind }
    }

    /// Build from a DOM-style key name
    pub fn from_key(timestamp_ms: u64, key: &str) -> Self {
        Self::new(timestamp_ms, KeyKind::classify(key))
    }
}

/// Collector for one free-text answer
#[derive(Debug, Clone)]
pub struct TypingMetricsCollector {
    config: TypingConfig,
    keystrokes: Vec<KeyStroke>,
    backspace_count: u32,
    idle_pauses_count: u32,
    idle_pause_total_ms: u64,
}

impl Default for TypingMetricsCollector {
    fn default() -> Self {
        Self::new(TypingConfig::default())
    }
}

impl TypingMetricsCollector {
    pub fn new(config: TypingConfig) -> Self {
        Self {
            config,
            keystrokes: Vec::new(),
            backspace_count: 0,
            idle_pauses_count: 0,
            idle_pause_total_ms: 0,
        }
    }

    /// Reset for a freshly presented text question
    pub fn start_tracking(&mut self) {
        self.keystrokes.clear();
        self.backspace_count = 0;
        self.idle_pauses_count = 0;
        self.idle_pause_total_ms = 0;
    }

    /// Record a key-down event
    pub fn handle_key_down(&mut self, event: KeyStroke) {
        if let Some(prev) = self.keystrokes.last() {
            let gap = event.timestamp_ms.saturating_sub(prev.timestamp_ms);
            if gap > self.config.idle_threshold_ms {
                self.idle_pauses_count += 1;
                self.idle_pause_total_ms += gap;
                trace!(gap_ms = gap, "idle pause");
            }
        }
        if event.kind == KeyKind::Backspace {
            self.backspace_count += 1;
        }
        self.keystrokes.push(event);
    }

    pub fn keystroke_count(&self) -> usize {
        self.keystrokes.len()
    }

    /// Summarize the recorded keystrokes against the submitted text
    pub fn calculate_metrics(&self, final_text: &str) -> TypingMetrics {
        let answer_length = final_text.chars().count();
        if answer_length == 0 {
            return TypingMetrics::default();
        }

        let total_time_ms = match (self.keystrokes.first(), self.keystrokes.last()) {
            (Some(first), Some(last)) if self.keystrokes.len() >= 2 => {
                last.timestamp_ms.saturating_sub(first.timestamp_ms)
            }
            _ => 0,
        };

        let (typing_speed_wpm, typing_speed_cps) = self.typing_speed(answer_length, total_time_ms);

        TypingMetrics {
            total_time_ms,
            answer_length,
            typing_speed_wpm,
            typing_speed_cps,
            backspace_count: self.backspace_count,
            idle_pauses_count: self.idle_pauses_count,
            idle_pause_total_duration: self.idle_pause_total_ms,
            keystroke_rhythm_variability: self.rhythm_variability(),
        }
    }

    /// WPM uses the 5-characters-per-word convention
    fn typing_speed(&self, answer_length: usize, total_time_ms: u64) -> (f64, f64) {
        if answer_length < self.config.min_chars_for_speed || total_time_ms == 0 {
            return (0.0, 0.0);
        }
        let minutes = total_time_ms as f64 / 60_000.0;
        let seconds = total_time_ms as f64 / 1_000.0;
        let wpm = (answer_length as f64 / 5.0) / minutes;
        let cps = answer_length as f64 / seconds;
        (finite_or_zero(wpm), finite_or_zero(cps))
    }

    /// Coefficient of variation (stdev / mean) of inter-keystroke intervals
    fn rhythm_variability(&self) -> f64 {
        let intervals: Vec<f64> = self
            .keystrokes
            .windows(2)
            .map(|pair| pair[1].timestamp_ms.saturating_sub(pair[0].timestamp_ms) as f64)
            .collect();

        match mean_and_std_dev(&intervals) {
            Some((mean, std_dev)) if mean > 0.0 => finite_or_zero(std_dev / mean),
            _ => 0.0,
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
