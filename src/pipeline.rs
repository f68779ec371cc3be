//! Pipeline orchestration
//!
//! Public entry points tying the stages together: parse the assessment
//! payload, fuse its signals into a stress score, classify the mood band,
//! pick an intervention and persist the result.

use rand::Rng;
use tracing::{debug, info};

use crate::assessment::AssessmentSession;
use crate::clock::SystemClock;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::scoring::{InterventionCatalog, StressScoreCalculator};
use crate::store::{InMemoryResultStore, ResultRepository, StoredResult};
use crate::types::{AssessmentPayload, StressResult};
use crate::vitals::{RealtimeVitalsSimulator, VitalsTask};

/// Parse an assessment payload from its camelCase JSON form
pub fn parse_payload(payload_json: &str) -> Result<AssessmentPayload, EngineError> {
    serde_json::from_str(payload_json).map_err(|e| EngineError::ParseError(e.to_string()))
}

/// Score an assessment payload JSON with the default configuration (stateless, one-shot).
///
/// # Returns
/// `StressResult` JSON string
///
/// # Example
/// ```ignore
/// let result_json = score_assessment_json(r#"{"userId":"u1","questions":[]}"#)?;
/// ```
pub fn score_assessment_json(payload_json: &str) -> Result<String, EngineError> {
    let payload = parse_payload(payload_json)?;
    let result = StressScoreCalculator::default().calculate(&payload);
    Ok(serde_json::to_string(&result)?)
}

/// Stateful engine: validated configuration, catalog and a result repository.
///
/// Use this when results should be remembered between assessments so the
/// dashboard can seed its vitals from them.
#[derive(Debug)]
pub struct StressEngine<S: ResultRepository = InMemoryResultStore> {
    config: EngineConfig,
    calculator: StressScoreCalculator,
    repository: S,
}

impl StressEngine<InMemoryResultStore> {
    /// Default configuration and catalog, results kept in memory
    pub fn in_memory() -> Self {
        let config = EngineConfig::default();
        Self {
            calculator: StressScoreCalculator::new(
                config.scoring.clone(),
                InterventionCatalog::default(),
            ),
            config,
            repository: InMemoryResultStore::new(),
        }
    }
}

impl Default for StressEngine<InMemoryResultStore> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<S: ResultRepository> StressEngine<S> {
    /// Build an engine; the configuration is validated first
    pub fn new(
        config: EngineConfig,
        catalog: InterventionCatalog,
        repository: S,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            calculator: StressScoreCalculator::new(config.scoring.clone(), catalog),
            config,
            repository,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calculator(&self) -> &StressScoreCalculator {
        &self.calculator
    }

    pub fn repository(&self) -> &S {
        &self.repository
    }

    /// Score a payload and store the result under its user id
    pub fn score(&mut self, payload: &AssessmentPayload) -> Result<StressResult, EngineError> {
        let result = self.calculator.calculate(payload);
        self.repository.save(&payload.user_id, &result)?;
        info!(
            user_id = %payload.user_id,
            stress_score = result.stress_score,
            mood = %result.mood,
            "assessment scored"
        );
        Ok(result)
    }

    /// Score a payload JSON and return the result JSON
    pub fn score_json(&mut self, payload_json: &str) -> Result<String, EngineError> {
        let payload = parse_payload(payload_json)?;
        let result = self.score(&payload)?;
        Ok(serde_json::to_string(&result)?)
    }

    /// Open an assessment session scored and stored by this engine
    pub fn session(&self, user_id: &str, consent: bool) -> AssessmentSession<SystemClock> {
        AssessmentSession::standard(user_id, &self.config, SystemClock, consent)
    }

    /// Submit a finished session through this engine's calculator and repository
    pub fn submit(
        &mut self,
        session: &mut AssessmentSession<SystemClock>,
    ) -> Result<StressResult, EngineError> {
        session.submit(&self.calculator, &mut self.repository)
    }

    pub fn latest(&self, user_id: &str) -> Result<Option<StoredResult>, EngineError> {
        self.repository.latest(user_id)
    }

    /// Dashboard estimator seeded from the user's latest stored result
    pub fn vitals_for<R: Rng>(
        &self,
        user_id: &str,
        rng: R,
    ) -> Result<RealtimeVitalsSimulator<R>, EngineError> {
        let stored = self.repository.latest(user_id)?;
        if stored.is_none() {
            debug!(user_id, "no stored result, seeding vitals from defaults");
        }
        Ok(RealtimeVitalsSimulator::seeded(
            stored.as_ref(),
            &self.config.vitals,
            rng,
        ))
    }

    /// Vitals task ticking at the configured interval
    pub fn vitals_task_for<R: Rng>(
        &self,
        user_id: &str,
        rng: R,
    ) -> Result<VitalsTask<R>, EngineError> {
        let simulator = self.vitals_for(user_id, rng)?;
        Ok(VitalsTask::new(simulator, self.config.vitals.tick_interval_ms))
    }
}
