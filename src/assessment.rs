//! Host-side assessment flow
//!
//! [`AssessmentSession`] is what a UI drives while the user works through the
//! questionnaire: it presents questions, forwards key-downs and selections to
//! the collectors, and at submission assembles the payload, scores it and
//! hands the result to a [`ResultRepository`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::scoring::{AnswerScale, StressScoreCalculator};
use crate::sentiment::analyze_sentiment;
use crate::store::ResultRepository;
use crate::telemetry::{ChoiceLatencyTracker, KeyStroke, TypingMetricsCollector};
use crate::types::{
    AnswerValue, AssessmentPayload, DeviceContext, QuestionAnswer, QuestionKind, StressResult,
    TypingSummary,
};

/// One question as presented to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    /// Submitted option values, best first; empty for text and slider
    #[serde(default)]
    pub options: Vec<String>,
}

impl QuestionSpec {
    fn mcq(id: &str, prompt: &str, scale: AnswerScale) -> Self {
        Self {
            id: id.to_string(),
            kind: QuestionKind::Mcq,
            prompt: prompt.to_string(),
            options: scale.options().iter().map(|o| o.to_string()).collect(),
        }
    }

    fn open(id: &str, kind: QuestionKind, prompt: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            prompt: prompt.to_string(),
            options: Vec::new(),
        }
    }
}

/// The six-question wellness check
pub fn standard_questionnaire() -> Vec<QuestionSpec> {
    vec![
        QuestionSpec::mcq(
            "q1",
            "How would you rate your sleep during the past week?",
            AnswerScale::SleepQuality,
        ),
        QuestionSpec::mcq(
            "q2",
            "How often did you feel overwhelmed in the past two weeks?",
            AnswerScale::OverwhelmFrequency,
        ),
        QuestionSpec::mcq(
            "q3",
            "Which best describes your current workload?",
            AnswerScale::Workload,
        ),
        QuestionSpec::open(
            "q4",
            QuestionKind::Text,
            "Describe in 1-3 sentences what is worrying you most right now.",
        ),
        QuestionSpec::mcq(
            "q5",
            "How connected do you feel to friends or classmates?",
            AnswerScale::SocialConnection,
        ),
        QuestionSpec::open(
            "q6",
            QuestionKind::Slider,
            "On a scale of 0-10, how stressed do you feel right now?",
        ),
    ]
}

/// One user's pass through a questionnaire
#[derive(Debug)]
pub struct AssessmentSession<C: Clock + Clone = SystemClock> {
    assessment_id: Uuid,
    user_id: String,
    questions: Vec<QuestionSpec>,
    consent: bool,
    clock: C,
    typing: TypingMetricsCollector,
    latency: ChoiceLatencyTracker<C>,
    answers: HashMap<String, AnswerValue>,
    current: Option<usize>,
    device_context: Option<DeviceContext>,
    submitted: bool,
}

impl<C: Clock + Clone> AssessmentSession<C> {
    /// Without `consent` no keystroke telemetry is captured and the result
    /// is computed in limited mode
    pub fn new(
        user_id: impl Into<String>,
        questions: Vec<QuestionSpec>,
        config: &EngineConfig,
        clock: C,
        consent: bool,
    ) -> Self {
        Self {
            assessment_id: Uuid::new_v4(),
            user_id: user_id.into(),
            questions,
            consent,
            latency: ChoiceLatencyTracker::new(clock.clone(), config.latency.policy),
            clock,
            typing: TypingMetricsCollector::new(config.typing.clone()),
            answers: HashMap::new(),
            current: None,
            device_context: None,
            submitted: false,
        }
    }

    /// Session over [`standard_questionnaire`]
    pub fn standard(
        user_id: impl Into<String>,
        config: &EngineConfig,
        clock: C,
        consent: bool,
    ) -> Self {
        Self::new(user_id, standard_questionnaire(), config, clock, consent)
    }

    pub fn assessment_id(&self) -> Uuid {
        self.assessment_id
    }

    pub fn consent_given(&self) -> bool {
        self.consent
    }

    pub fn questions(&self) -> &[QuestionSpec] {
        &self.questions
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn set_device_context(&mut self, context: DeviceContext) {
        self.device_context = Some(context);
    }

    fn index_of(&self, question_id: &str) -> Result<usize, EngineError> {
        self.questions
            .iter()
            .position(|q| q.id == question_id)
            .ok_or_else(|| EngineError::UnknownQuestion(question_id.to_string()))
    }

    /// Show a question; restarts its collector
    pub fn present(&mut self, question_id: &str) -> Result<(), EngineError> {
        let idx = self.index_of(question_id)?;
        match self.questions[idx].kind {
            QuestionKind::Mcq | QuestionKind::Slider => self.latency.start_question(question_id),
            QuestionKind::Text if self.consent => self.typing.start_tracking(),
            QuestionKind::Text => {}
        }
        self.current = Some(idx);
        Ok(())
    }

    /// The question currently on screen
    pub fn current(&self) -> Option<&QuestionSpec> {
        self.current.map(|idx| &self.questions[idx])
    }

    /// Forward a key-down; ignored unless a text question is on screen and
    /// consent was given
    pub fn key_down(&mut self, key: &str) {
        let on_text = self.current().is_some_and(|q| q.kind == QuestionKind::Text);
        if on_text && self.consent {
            self.typing
                .handle_key_down(KeyStroke::from_key(self.clock.now_ms(), key));
        }
    }

    /// Record the user's answer to a question
    pub fn answer(
        &mut self,
        question_id: &str,
        value: impl Into<AnswerValue>,
    ) -> Result<(), EngineError> {
        let idx = self.index_of(question_id)?;
        let value = value.into();
        if matches!(self.questions[idx].kind, QuestionKind::Mcq | QuestionKind::Slider) {
            let latency = self.latency.record_choice(question_id, &value.to_string());
            debug!(question_id, latency_ms = latency, "choice recorded");
        }
        self.answers.insert(question_id.to_string(), value);
        Ok(())
    }

    /// Whether the question has a non-empty answer
    pub fn can_proceed(&self, question_id: &str) -> bool {
        self.answers
            .get(question_id)
            .is_some_and(|answer| !answer.is_empty())
    }

    /// Assemble the submission payload from everything captured so far
    pub fn build_payload(&self) -> AssessmentPayload {
        let mut summary = None;
        let questions = self
            .questions
            .iter()
            .map(|spec| match spec.kind {
                QuestionKind::Text => {
                    let text = self
                        .answers
                        .get(&spec.id)
                        .map(|a| a.to_string())
                        .unwrap_or_default();
                    let sentiment = analyze_sentiment(&text).score;
                    if self.consent {
                        let metrics = self.typing.calculate_metrics(&text);
                        summary = Some(TypingSummary::from(&metrics));
                        QuestionAnswer::text(&spec.id, text, Some(&metrics), Some(sentiment))
                    } else {
                        QuestionAnswer::text(&spec.id, text, None, Some(sentiment))
                    }
                }
                kind => QuestionAnswer::choice(
                    &spec.id,
                    kind,
                    self.answers.get(&spec.id).cloned(),
                    self.latency.latency_for(&spec.id),
                ),
            })
            .collect();

        AssessmentPayload {
            assessment_id: self.assessment_id,
            user_id: self.user_id.clone(),
            submitted_at: Some(Utc::now()),
            questions,
            typing_metrics: summary,
            device_context: self.device_context.clone(),
        }
    }

    /// Score the assessment and persist the result. A session submits once.
    pub fn submit<R: ResultRepository + ?Sized>(
        &mut self,
        calculator: &StressScoreCalculator,
        repository: &mut R,
    ) -> Result<StressResult, EngineError> {
        if self.submitted {
            return Err(EngineError::AlreadySubmitted(self.assessment_id.to_string()));
        }

        let payload = self.build_payload();
        let result = calculator.calculate(&payload);
        repository.save(&self.user_id, &result)?;
        self.submitted = true;

        info!(
            assessment_id = %self.assessment_id,
            stress_score = result.stress_score,
            mood = %result.mood,
            limited_mode = result.limited_mode,
            "assessment submitted"
        );
        Ok(result)
    }
}
