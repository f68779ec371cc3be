//! Core data model
//!
//! These types flow from the collectors into the calculator and out to the
//! persistence boundary. The assessment wire format is camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::scoring::{Intervention, Mood};

/// Keystroke-derived summary of one free-text answer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingMetrics {
    /// Last minus first keystroke timestamp
    pub total_time_ms: u64,
    /// Characters in the submitted text
    pub answer_length: usize,
    #[serde(rename = "typingSpeedWPM")]
    pub typing_speed_wpm: f64,
    #[serde(rename = "typingSpeedCPS")]
    pub typing_speed_cps: f64,
    pub backspace_count: u32,
    pub idle_pauses_count: u32,
    /// Sum of all idle gaps (ms)
    pub idle_pause_total_duration: u64,
    /// Coefficient of variation of inter-keystroke intervals
    pub keystroke_rhythm_variability: f64,
}

/// Decision latency for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceLatencyRecord {
    pub question_id: String,
    pub selected_value: String,
    /// 0 means the question was never started, i.e. not measured
    pub latency_ms: u64,
}

/// Output of the sentiment analyzer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Polarity in [-1, 1]
    pub score: f64,
    pub token_count: usize,
    /// Tokens that carried polarity
    pub matched_tokens: usize,
}

/// Question presentation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Mcq,
    Text,
    Slider,
}

/// A raw answer: an option label, free text, or a slider number.
///
/// Anything else lands in `Other` and scores as unanswered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl AnswerValue {
    /// Label or text form of the answer
    pub fn as_label(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s.as_str()),
            AnswerValue::Number(_) | AnswerValue::Other(_) => None,
        }
    }

    /// Numeric form; slider values sometimes arrive stringified
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) => Some(*n),
            AnswerValue::Text(s) => s.trim().parse().ok(),
            AnswerValue::Other(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, AnswerValue::Text(s) if s.trim().is_empty())
    }
}

impl std::fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerValue::Number(n) => write!(f, "{n}"),
            AnswerValue::Text(s) => f.write_str(s),
            AnswerValue::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

/// One answered question plus whatever telemetry was derived for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub answer: Option<AnswerValue>,

    // mcq / slider
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,

    // text
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub chars: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub wpm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub backspaces: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub pauses: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub keystroke_variance: Option<f64>,
}

impl QuestionAnswer {
    /// A multiple-choice or slider answer
    pub fn choice(
        id: impl Into<String>,
        kind: QuestionKind,
        answer: Option<AnswerValue>,
        latency_ms: Option<u64>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            answer,
            latency_ms: latency_ms.map(|ms| ms as f64),
            chars: None,
            time_ms: None,
            wpm: None,
            backspaces: None,
            pauses: None,
            sentiment: None,
            keystroke_variance: None,
        }
    }

    /// A free-text answer; `metrics` is `None` when telemetry consent was withheld
    pub fn text(
        id: impl Into<String>,
        answer: impl Into<String>,
        metrics: Option<&TypingMetrics>,
        sentiment: Option<f64>,
    ) -> Self {
        let mut qa = Self::choice(id, QuestionKind::Text, Some(AnswerValue::Text(answer.into())), None);
        if let Some(m) = metrics {
            qa.chars = Some(m.answer_length as f64);
            qa.time_ms = Some(m.total_time_ms as f64);
            qa.wpm = Some(m.typing_speed_wpm);
            qa.backspaces = Some(m.backspace_count as f64);
            qa.pauses = Some(m.idle_pauses_count as f64);
            qa.keystroke_variance = Some(m.keystroke_rhythm_variability);
        }
        qa.sentiment = sentiment;
        qa
    }

    /// Whether any keystroke-derived field is present
    pub fn has_typing_signals(&self) -> bool {
        self.kind == QuestionKind::Text
            && (self.wpm.is_some()
                || self.backspaces.is_some()
                || self.pauses.is_some()
                || self.keystroke_variance.is_some())
    }
}

/// Payload-level typing summary. Each field is optional on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingSummary {
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub avg_wpm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub avg_cps: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub backspace_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub idle_total_ms: Option<f64>,
}

impl TypingSummary {
    /// Whether any field carries a value
    pub fn has_signals(&self) -> bool {
        self.avg_wpm.is_some()
            || self.avg_cps.is_some()
            || self.backspace_total.is_some()
            || self.idle_total_ms.is_some()
    }
}

impl From<&TypingMetrics> for TypingSummary {
    fn from(m: &TypingMetrics) -> Self {
        Self {
            avg_wpm: Some(m.typing_speed_wpm),
            avg_cps: Some(m.typing_speed_cps),
            backspace_total: Some(m.backspace_count as f64),
            idle_total_ms: Some(m.idle_pause_total_duration as f64),
        }
    }
}

/// Telemetry numbers: numeric strings are accepted, anything else reads as
/// not measured.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Diagnostic description of the submitting device. Never used for scoring.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceContext {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub screen: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub local_time: Option<String>,
}

/// Everything captured during one assessment, built once at submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentPayload {
    #[serde(default = "Uuid::nil")]
    pub assessment_id: Uuid,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub questions: Vec<QuestionAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typing_metrics: Option<TypingSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_context: Option<DeviceContext>,
}

impl AssessmentPayload {
    /// True when no keystroke telemetry was captured (consent withheld)
    pub fn is_limited(&self) -> bool {
        !self.typing_metrics.is_some_and(|s| s.has_signals())
            && !self.questions.iter().any(|q| q.has_typing_signals())
    }

    pub fn question(&self, id: &str) -> Option<&QuestionAnswer> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// Result of scoring one assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressResult {
    /// Integer in [0, 100]
    pub stress_score: u8,
    pub mood: Mood,
    pub recommended_intervention: Intervention,
    /// Scored from explicit answers only
    #[serde(default)]
    pub limited_mode: bool,
}

/// Live dashboard triple, each field in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalsState {
    pub stress: u8,
    pub focus: u8,
    pub energy: u8,
}

impl VitalsState {
    pub fn new(stress: u8, focus: u8, energy: u8) -> Self {
        Self {
            stress: stress.min(100),
            focus: focus.min(100),
            energy: energy.min(100),
        }
    }

    /// Mood band of the current stress reading
    pub fn mood(&self) -> Mood {
        Mood::from_score(self.stress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_kind_serialization() {
        let json = serde_json::to_string(&QuestionKind::Slider).unwrap();
        assert_eq!(json, "\"slider\"");
    }

    #[test]
    fn test_answer_value_untagged() {
        let n: AnswerValue = serde_json::from_str("7").unwrap();
        assert_eq!(n.as_number(), Some(7.0));

        let s: AnswerValue = serde_json::from_str("\"Very poor\"").unwrap();
        assert_eq!(s.as_label(), Some("Very poor"));

        let stringified: AnswerValue = serde_json::from_str("\"6\"").unwrap();
        assert_eq!(stringified.as_number(), Some(6.0));
    }

    #[test]
    fn test_payload_deserialization_camel_case() {
        let json = r#"{
            "userId": "student-1",
            "questions": [
                { "id": "q1", "type": "mcq", "answer": "Good", "latencyMs": 2400 },
                { "id": "q4", "type": "text", "answer": "fine", "wpm": 42.0, "backspaces": 1,
                  "pauses": 0, "sentiment": 0.2, "keystrokeVariance": 0.4 },
                { "id": "q6", "type": "slider", "answer": 3, "latencyMs": 1800 }
            ],
            "typingMetrics": { "avgWpm": 42.0, "avgCps": 3.5, "backspaceTotal": 1, "idleTotalMs": 0 },
            "deviceContext": { "platform": "web", "screen": "1920x1080" }
        }"#;

        let payload: AssessmentPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.user_id, "student-1");
        assert_eq!(payload.assessment_id, Uuid::nil());
        assert_eq!(payload.questions.len(), 3);
        assert_eq!(payload.questions[0].latency_ms, Some(2400.0));
        assert!(payload.questions[1].has_typing_signals());
        assert!(!payload.is_limited());
        assert_eq!(payload.device_context.unwrap().platform.as_deref(), Some("web"));
    }

    #[test]
    fn test_payload_without_telemetry_is_limited() {
        let payload = AssessmentPayload {
            assessment_id: Uuid::nil(),
            user_id: "u".to_string(),
            submitted_at: None,
            questions: vec![
                QuestionAnswer::choice("q1", QuestionKind::Mcq, Some("Fair".into()), None),
                QuestionAnswer::text("q4", "exam tomorrow", None, Some(-0.2)),
            ],
            typing_metrics: None,
            device_context: None,
        };
        assert!(payload.is_limited());
    }

    #[test]
    fn test_partial_typing_summary_deserializes() {
        let summary: TypingSummary = serde_json::from_str(r#"{"avgWpm": 40}"#).unwrap();
        assert_eq!(summary.avg_wpm, Some(40.0));
        assert_eq!(summary.avg_cps, None);
        assert!(summary.has_signals());

        let empty: TypingSummary = serde_json::from_str("{}").unwrap();
        assert!(!empty.has_signals());
    }

    #[test]
    fn test_empty_typing_summary_is_limited() {
        let json = r#"{
            "userId": "u",
            "questions": [{ "id": "q1", "type": "mcq", "answer": "Fair" }],
            "typingMetrics": { "avgWpm": "fast" }
        }"#;
        let payload: AssessmentPayload = serde_json::from_str(json).unwrap();
        assert!(payload.is_limited());
    }

    #[test]
    fn test_wrong_typed_telemetry_reads_as_unmeasured() {
        let json = r#"{ "id": "q6", "type": "slider", "answer": true,
                        "latencyMs": "3000", "wpm": [1], "pauses": null }"#;
        let q: QuestionAnswer = serde_json::from_str(json).unwrap();
        assert_eq!(q.latency_ms, Some(3000.0));
        assert_eq!(q.wpm, None);
        assert_eq!(q.pauses, None);

        let answer = q.answer.unwrap();
        assert_eq!(answer, AnswerValue::Other(serde_json::Value::Bool(true)));
        assert_eq!(answer.as_number(), None);
        assert_eq!(answer.as_label(), None);
    }

    #[test]
    fn test_typing_metrics_wire_names() {
        let json = serde_json::to_value(TypingMetrics::default()).unwrap();
        assert!(json.get("typingSpeedWPM").is_some());
        assert!(json.get("idlePauseTotalDuration").is_some());
    }

    #[test]
    fn test_vitals_state_clamps_on_construction() {
        let v = VitalsState::new(150, 20, 101);
        assert_eq!(v, VitalsState { stress: 100, focus: 20, energy: 100 });
        assert_eq!(v.mood(), Mood::Critical);
    }
}
