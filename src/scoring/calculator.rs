//! Stress fusion
//!
//! Combines explicit answers and behavioral telemetry into a 0-100 score.
//!
//! Point budget (default questionnaire):
//!
//! ```text
//! categorical   4 × 15   = 60   ordinal index / 4
//! self-report   0..10    = 20   proportional
//! typing                 = 14   backspace 4, idle 2, rhythm 2, sentiment 4, speed 2
//! latency                =  6   U-shape per question, capped
//! ```
//!
//! Limited mode drops the last two rows and rescales the explicit points.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ScoringConfig;
use crate::scoring::{InterventionCatalog, Mood};
use crate::sentiment::analyze_sentiment;
use crate::types::{AssessmentPayload, QuestionAnswer, QuestionKind, StressResult};

const CATEGORICAL_POINTS: f64 = 15.0;
const SLIDER_POINTS: f64 = 20.0;
const SLIDER_MAX: f64 = 10.0;
const SLIDER_NEUTRAL: f64 = 5.0;

const BACKSPACE_POINTS: f64 = 4.0;
/// Backspace ratio below which corrections are normal editing
const BACKSPACE_RATIO_START: f64 = 0.05;
const BACKSPACE_RATIO_FULL: f64 = 0.30;

const IDLE_COUNT_POINTS: f64 = 1.25;
const IDLE_COUNT_FULL: f64 = 4.0;
const IDLE_DURATION_POINTS: f64 = 0.75;
const IDLE_DURATION_FULL_MS: f64 = 20_000.0;

const RHYTHM_POINTS: f64 = 2.0;
const RHYTHM_CV_START: f64 = 0.5;
const RHYTHM_CV_FULL: f64 = 1.5;

const SENTIMENT_POINTS: f64 = 4.0;
/// Negativity at which the sentiment contribution saturates
const SENTIMENT_FULL: f64 = 0.4;

const SPEED_POINTS: f64 = 2.0;
/// WPM above the normal band at which the fast-typing contribution saturates
const SPEED_FAST_SPAN: f64 = 40.0;

const TYPING_MAX_POINTS: f64 = BACKSPACE_POINTS
    + IDLE_COUNT_POINTS
    + IDLE_DURATION_POINTS
    + RHYTHM_POINTS
    + SENTIMENT_POINTS
    + SPEED_POINTS;

const LATENCY_SLOW_POINTS: f64 = 1.2;
const LATENCY_SLOW_SPAN_MS: f64 = 18_000.0;
const LATENCY_FAST_POINTS: f64 = 0.6;
const LATENCY_MAX_POINTS: f64 = 6.0;

/// Score used when the fused value is not a finite number
pub const NEUTRAL_SCORE: u8 = 50;

/// Per-signal points of the typing contribution
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TypingContribution {
    pub backspace: f64,
    pub idle: f64,
    pub rhythm: f64,
    pub sentiment: f64,
    pub speed: f64,
}

impl TypingContribution {
    pub fn total(&self) -> f64 {
        self.backspace + self.idle + self.rhythm + self.sentiment + self.speed
    }
}

/// How a score was assembled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub categorical: f64,
    pub slider: f64,
    pub typing: TypingContribution,
    pub latency: f64,
    /// Maximum attainable points in the mode used
    pub max_points: f64,
    pub limited_mode: bool,
    pub stress_score: u8,
}

impl ScoreBreakdown {
    pub fn total_points(&self) -> f64 {
        self.categorical + self.slider + self.typing.total() + self.latency
    }
}

/// Deterministic fusion engine
#[derive(Debug, Clone, Default)]
pub struct StressScoreCalculator {
    config: ScoringConfig,
    catalog: InterventionCatalog,
}

impl StressScoreCalculator {
    pub fn new(config: ScoringConfig, catalog: InterventionCatalog) -> Self {
        Self { config, catalog }
    }

    pub fn catalog(&self) -> &InterventionCatalog {
        &self.catalog
    }

    /// Score a submitted assessment
    pub fn calculate(&self, payload: &AssessmentPayload) -> StressResult {
        let breakdown = self.breakdown(payload);
        let mood = Mood::from_score(breakdown.stress_score);

        StressResult {
            stress_score: breakdown.stress_score,
            mood,
            recommended_intervention: self.catalog.for_mood(mood).clone(),
            limited_mode: breakdown.limited_mode,
        }
    }

    /// Compute every contribution and the final score
    pub fn breakdown(&self, payload: &AssessmentPayload) -> ScoreBreakdown {
        let limited_mode = payload.is_limited();

        let categorical = self.categorical_points(payload);
        let slider = slider_points(payload);
        let explicit_max = self.config.question_scales.len() as f64 * CATEGORICAL_POINTS + SLIDER_POINTS;

        let (typing, latency, max_points) = if limited_mode {
            debug!(user_id = %payload.user_id, "no typing telemetry, scoring in limited mode");
            (TypingContribution::default(), 0.0, explicit_max)
        } else {
            (
                self.typing_points(payload),
                self.latency_points(payload),
                explicit_max + TYPING_MAX_POINTS + LATENCY_MAX_POINTS,
            )
        };

        let total = categorical + slider + typing.total() + latency;
        let normalized = total / max_points * 100.0;
        let stress_score = if normalized.is_finite() {
            normalized.clamp(0.0, 100.0).round() as u8
        } else {
            warn!(user_id = %payload.user_id, "non-finite stress score replaced with neutral");
            NEUTRAL_SCORE
        };

        ScoreBreakdown {
            categorical,
            slider,
            typing,
            latency,
            max_points,
            limited_mode,
            stress_score,
        }
    }

    fn categorical_points(&self, payload: &AssessmentPayload) -> f64 {
        self.config
            .question_scales
            .iter()
            .map(|(id, scale)| {
                let label = payload
                    .question(id)
                    .and_then(|q| q.answer.as_ref())
                    .and_then(|a| a.as_label());
                scale.level(label) * CATEGORICAL_POINTS
            })
            .sum()
    }

    fn typing_points(&self, payload: &AssessmentPayload) -> TypingContribution {
        let text_q = payload.questions.iter().find(|q| q.kind == QuestionKind::Text);
        let summary = payload.typing_metrics.as_ref();

        let answer_text = text_q
            .and_then(|q| q.answer.as_ref())
            .and_then(|a| a.as_label())
            .unwrap_or("");

        let chars = signal(
            text_q.and_then(|q| q.chars),
            answer_text.chars().count() as f64,
            "chars",
        );
        let backspaces = signal(
            text_q.and_then(|q| q.backspaces).or(summary.and_then(|s| s.backspace_total)),
            0.0,
            "backspaces",
        );
        let pauses = signal(text_q.and_then(|q| q.pauses), 0.0, "pauses");
        let idle_ms = signal(summary.and_then(|s| s.idle_total_ms), 0.0, "idle_total_ms");
        let variability = signal(
            text_q.and_then(|q| q.keystroke_variance),
            0.0,
            "keystroke_variance",
        );
        let wpm = signal(
            text_q.and_then(|q| q.wpm).or(summary.and_then(|s| s.avg_wpm)),
            0.0,
            "wpm",
        );
        let sentiment = match text_q.and_then(|q| q.sentiment) {
            Some(s) if s.is_finite() => s.clamp(-1.0, 1.0),
            Some(_) => {
                warn!("non-finite sentiment replaced with neutral");
                0.0
            }
            None => analyze_sentiment(answer_text).score,
        };

        let backspace_ratio = if chars + backspaces > 0.0 {
            backspaces / (chars + backspaces)
        } else {
            0.0
        };

        TypingContribution {
            backspace: ramp(backspace_ratio, BACKSPACE_RATIO_START, BACKSPACE_RATIO_FULL)
                * BACKSPACE_POINTS,
            idle: ramp(pauses, 0.0, IDLE_COUNT_FULL) * IDLE_COUNT_POINTS
                + ramp(idle_ms, 0.0, IDLE_DURATION_FULL_MS) * IDLE_DURATION_POINTS,
            rhythm: ramp(variability, RHYTHM_CV_START, RHYTHM_CV_FULL) * RHYTHM_POINTS,
            sentiment: ramp(-sentiment, 0.0, SENTIMENT_FULL) * SENTIMENT_POINTS,
            speed: self.speed_points(wpm),
        }
    }

    /// U-shaped: neutral inside the normal band; 0 WPM means not measured
    fn speed_points(&self, wpm: f64) -> f64 {
        let band = self.config.wpm_band;
        if wpm <= 0.0 || band.contains(wpm) {
            0.0
        } else if wpm < band.low {
            ramp(band.low - wpm, 0.0, band.low) * SPEED_POINTS
        } else {
            ramp(wpm - band.high, 0.0, SPEED_FAST_SPAN) * SPEED_POINTS
        }
    }

    fn latency_points(&self, payload: &AssessmentPayload) -> f64 {
        let band = self.config.latency_band_ms;
        let total: f64 = payload
            .questions
            .iter()
            .filter(|q| matches!(q.kind, QuestionKind::Mcq | QuestionKind::Slider))
            .filter_map(measured_latency)
            .map(|latency| {
                if band.contains(latency) {
                    0.0
                } else if latency > band.high {
                    // Rumination or avoidance
                    ramp(latency - band.high, 0.0, LATENCY_SLOW_SPAN_MS) * LATENCY_SLOW_POINTS
                } else {
                    // Impulsive answering
                    ramp(band.low - latency, 0.0, band.low) * LATENCY_FAST_POINTS
                }
            })
            .sum();
        total.min(LATENCY_MAX_POINTS)
    }
}

fn slider_points(payload: &AssessmentPayload) -> f64 {
    let value = payload
        .questions
        .iter()
        .find(|q| q.kind == QuestionKind::Slider)
        .and_then(|q| q.answer.as_ref())
        .and_then(|a| a.as_number());
    let value = match value {
        Some(v) if v.is_finite() => v.clamp(0.0, SLIDER_MAX),
        Some(_) => {
            warn!("non-finite self-report replaced with neutral");
            SLIDER_NEUTRAL
        }
        None => SLIDER_NEUTRAL,
    };
    value / SLIDER_MAX * SLIDER_POINTS
}

/// Latency in ms if it was measured and is usable
fn measured_latency(q: &QuestionAnswer) -> Option<f64> {
    match q.latency_ms {
        Some(ms) if ms.is_finite() && ms > 0.0 => Some(ms),
        Some(ms) if !ms.is_finite() => {
            warn!(question_id = %q.id, "non-finite latency ignored");
            None
        }
        _ => None,
    }
}

/// Non-negative finite value of an optional signal, else `default`
fn signal(value: Option<f64>, default: f64, name: &str) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.max(0.0),
        Some(_) => {
            warn!(signal = name, "non-finite signal replaced with default");
            default
        }
        None => default,
    }
}

/// Linear 0→1 between `start` and `full`, clamped; non-finite input gives 0
fn ramp(value: f64, start: f64, full: f64) -> f64 {
    let t = (value - start) / (full - start);
    if t.is_finite() {
        t.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnswerValue, DeviceContext, TypingSummary};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn mcq(id: &str, answer: &str, latency_ms: u64) -> QuestionAnswer {
        QuestionAnswer::choice(id, QuestionKind::Mcq, Some(answer.into()), Some(latency_ms))
    }

    fn slider(value: f64, latency_ms: u64) -> QuestionAnswer {
        QuestionAnswer::choice("q6", QuestionKind::Slider, Some(AnswerValue::Number(value)), Some(latency_ms))
    }

    fn text(
        answer: &str,
        wpm: f64,
        backspaces: f64,
        pauses: f64,
        variance: f64,
        sentiment: f64,
    ) -> QuestionAnswer {
        let mut q = QuestionAnswer::text("q4", answer, None, Some(sentiment));
        q.chars = Some(answer.chars().count() as f64);
        q.time_ms = Some(30_000.0);
        q.wpm = Some(wpm);
        q.backspaces = Some(backspaces);
        q.pauses = Some(pauses);
        q.keystroke_variance = Some(variance);
        q
    }

    fn payload(questions: Vec<QuestionAnswer>, summary: Option<TypingSummary>) -> AssessmentPayload {
        AssessmentPayload {
            assessment_id: Uuid::nil(),
            user_id: "student".to_string(),
            submitted_at: None,
            questions,
            typing_metrics: summary,
            device_context: None,
        }
    }

    fn scenario_a() -> AssessmentPayload {
        let worry = "I am so overwhelmed and hopeless, I can't sleep and I feel like I'm failing everything";
        let sentiment = analyze_sentiment(worry).score;
        payload(
            vec![
                mcq("q1", "Very poor", 9_000),
                mcq("q2", "Always", 25_000),
                mcq("q3", "Unmanageable", 4_000),
                text(worry, 26.0, 30.0, 3.0, 1.2, sentiment),
                mcq("q5", "Very isolated", 14_000),
                slider(9.0, 6_000),
            ],
            Some(TypingSummary {
                avg_wpm: Some(26.0),
                avg_cps: Some(2.2),
                backspace_total: Some(30.0),
                idle_total_ms: Some(14_000.0),
            }),
        )
    }

    fn scenario_b() -> AssessmentPayload {
        let note = "Honestly things are good, I feel calm and happy about my classes";
        let sentiment = analyze_sentiment(note).score;
        payload(
            vec![
                mcq("q1", "Excellent", 3_000),
                mcq("q2", "Never", 2_500),
                mcq("q3", "Light", 2_800),
                text(note, 48.0, 1.0, 0.0, 0.35, sentiment),
                mcq("q5", "Very connected", 2_200),
                slider(1.0, 3_100),
            ],
            Some(TypingSummary {
                avg_wpm: Some(48.0),
                avg_cps: Some(4.0),
                backspace_total: Some(1.0),
                idle_total_ms: Some(0.0),
            }),
        )
    }

    #[test]
    fn test_scenario_a_is_critical() {
        let result = StressScoreCalculator::default().calculate(&scenario_a());
        assert_eq!(result.mood, Mood::Critical);
        assert!(result.stress_score >= 86, "score was {}", result.stress_score);
        assert!(!result.limited_mode);
        assert_eq!(result.recommended_intervention.title, "Emergency SOS");
    }

    #[test]
    fn test_scenario_b_is_calm() {
        let result = StressScoreCalculator::default().calculate(&scenario_b());
        assert_eq!(result.mood, Mood::Calm);
        assert!(result.stress_score <= 20, "score was {}", result.stress_score);
    }

    #[test]
    fn test_deterministic() {
        let calc = StressScoreCalculator::default();
        let p = scenario_a();
        assert_eq!(calc.calculate(&p), calc.calculate(&p));
    }

    #[test]
    fn test_device_context_ignored() {
        let calc = StressScoreCalculator::default();
        let plain = scenario_b();
        let mut with_device = plain.clone();
        with_device.device_context = Some(DeviceContext {
            platform: Some("web".to_string()),
            agent: Some("Mozilla/5.0".to_string()),
            screen: Some("390x844".to_string()),
            timezone: Some("Asia/Kolkata".to_string()),
            local_time: Some("2024-03-01T23:59:00Z".to_string()),
        });
        assert_eq!(calc.calculate(&plain), calc.calculate(&with_device));
    }

    #[test]
    fn test_limited_mode_uses_explicit_answers_only() {
        let calc = StressScoreCalculator::default();
        let p = payload(
            vec![
                mcq("q1", "Poor", 0),
                mcq("q2", "Often", 0),
                mcq("q3", "Busy", 0),
                QuestionAnswer::text("q4", "", None, None),
                mcq("q5", "Neutral", 0),
                slider(6.0, 0),
            ],
            None,
        );
        let breakdown = calc.breakdown(&p);
        assert!(breakdown.limited_mode);
        assert_eq!(breakdown.typing, TypingContribution::default());
        assert_eq!(breakdown.latency, 0.0);
        // (11.25 + 11.25 + 7.5 + 7.5 + 12) / 80 = 61.875%
        assert_eq!(breakdown.stress_score, 62);
        assert_eq!(calc.calculate(&p).mood, Mood::High);
    }

    #[test]
    fn test_missing_answers_are_neutral() {
        let calc = StressScoreCalculator::default();
        let breakdown = calc.breakdown(&payload(vec![], None));
        assert!(breakdown.limited_mode);
        assert_eq!(breakdown.categorical, 30.0);
        assert_eq!(breakdown.slider, 10.0);
        assert_eq!(breakdown.stress_score, 50);
    }

    #[test]
    fn test_non_finite_inputs_never_read_as_calm() {
        let calc = StressScoreCalculator::default();
        let mut text_q = text("", f64::NAN, f64::NAN, f64::INFINITY, f64::NAN, f64::NAN);
        text_q.chars = Some(f64::NAN);
        let p = payload(
            vec![
                QuestionAnswer::choice("q1", QuestionKind::Mcq, None, Some(0)),
                text_q,
                QuestionAnswer::choice("q6", QuestionKind::Slider, Some(AnswerValue::Number(f64::NAN)), None),
            ],
            Some(TypingSummary {
                avg_wpm: Some(f64::NAN),
                avg_cps: Some(f64::NAN),
                backspace_total: Some(f64::NEG_INFINITY),
                idle_total_ms: Some(f64::NAN),
            }),
        );
        let result = calc.calculate(&p);
        assert_ne!(result.mood, Mood::Calm);
        assert!(result.stress_score <= 100);
        assert_eq!(result.mood, Mood::from_score(result.stress_score));
    }

    #[test]
    fn test_typing_speed_is_u_shaped() {
        let calc = StressScoreCalculator::default();
        assert_eq!(calc.speed_points(50.0), 0.0);
        assert_eq!(calc.speed_points(0.0), 0.0);
        assert!(calc.speed_points(8.0) > 0.0);
        assert!(calc.speed_points(110.0) > 0.0);
        assert_eq!(calc.speed_points(500.0), SPEED_POINTS);
    }

    #[test]
    fn test_latency_is_u_shaped_and_capped() {
        let calc = StressScoreCalculator::default();
        let inside = payload(vec![mcq("q1", "Good", 5_000)], Some(TypingSummary::default()));
        assert_eq!(calc.latency_points(&inside), 0.0);

        let slow = payload(vec![mcq("q1", "Good", 30_000)], Some(TypingSummary::default()));
        let fast = payload(vec![mcq("q1", "Good", 200)], Some(TypingSummary::default()));
        let slow_pts = calc.latency_points(&slow);
        let fast_pts = calc.latency_points(&fast);
        assert!(slow_pts > 0.0 && fast_pts > 0.0);
        assert!(fast_pts < slow_pts);

        let many_slow = payload(
            (0..10).map(|i| mcq(&format!("x{i}"), "Good", 120_000)).collect(),
            Some(TypingSummary::default()),
        );
        assert_eq!(calc.latency_points(&many_slow), LATENCY_MAX_POINTS);
    }

    #[test]
    fn test_sentiment_computed_when_missing() {
        let calc = StressScoreCalculator::default();
        let mut q = text("I feel hopeless and anxious and alone", 40.0, 0.0, 0.0, 0.0, 0.0);
        q.sentiment = None;
        let breakdown = calc.breakdown(&payload(vec![q], None));
        assert!(breakdown.typing.sentiment > 0.0);
    }

    #[test]
    fn test_max_points_is_one_hundred_by_default() {
        let calc = StressScoreCalculator::default();
        assert_eq!(calc.breakdown(&scenario_a()).max_points, 100.0);
    }

    #[test]
    fn test_calculator_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StressScoreCalculator>();
        assert_send_sync::<crate::config::EngineConfig>();
    }

    fn with_backspaces(b: f64) -> AssessmentPayload {
        let mut p = scenario_b();
        p.questions[3].backspaces = Some(b);
        p
    }

    fn with_slider(v: f64) -> AssessmentPayload {
        let mut p = scenario_b();
        p.questions[5] = slider(v, 3_100);
        p
    }

    proptest! {
        #[test]
        fn prop_backspaces_monotonic(a in 0.0f64..500.0, b in 0.0f64..500.0) {
            let calc = StressScoreCalculator::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                calc.calculate(&with_backspaces(lo)).stress_score
                    <= calc.calculate(&with_backspaces(hi)).stress_score
            );
        }

        #[test]
        fn prop_slider_monotonic(a in 0u8..=10, b in 0u8..=10) {
            let calc = StressScoreCalculator::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                calc.calculate(&with_slider(lo as f64)).stress_score
                    <= calc.calculate(&with_slider(hi as f64)).stress_score
            );
        }

        #[test]
        fn prop_score_in_range_and_band_consistent(
            sleep in 0usize..6,
            overwhelm in 0usize..6,
            slider_value in -5.0f64..15.0,
            wpm in 0.0f64..300.0,
            backspaces in 0.0f64..200.0,
            pauses in 0.0f64..20.0,
            variance in 0.0f64..5.0,
            sentiment in -1.0f64..1.0,
            latency in 0u64..120_000,
            limited in any::<bool>(),
        ) {
            let label = |scale: crate::scoring::AnswerScale, idx: usize| {
                scale.options().get(idx).copied().unwrap_or("not an option").to_string()
            };
            let mut questions = vec![
                mcq("q1", &label(crate::scoring::AnswerScale::SleepQuality, sleep), latency),
                mcq("q2", &label(crate::scoring::AnswerScale::OverwhelmFrequency, overwhelm), latency),
                slider(slider_value, latency),
            ];
            let summary = if limited {
                questions.push(QuestionAnswer::text("q4", "some text", None, None));
                None
            } else {
                questions.push(text("some worried text", wpm, backspaces, pauses, variance, sentiment));
                Some(TypingSummary::default())
            };
            let result = StressScoreCalculator::default().calculate(&payload(questions, summary));
            prop_assert!(result.stress_score <= 100);
            prop_assert_eq!(result.mood, Mood::from_score(result.stress_score));
            prop_assert_eq!(result.limited_mode, limited);
        }
    }
}
