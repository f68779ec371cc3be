//! Time-to-decision capture for multiple-choice and slider questions

use std::collections::HashMap;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::LatencyPolicy;
use crate::types::ChoiceLatencyRecord;

/// Tracks how long the user took to pick an answer for each question
#[derive(Debug)]
pub struct ChoiceLatencyTracker<C: Clock = SystemClock> {
    clock: C,
    policy: LatencyPolicy,
    /// Mount time of the most recent presentation, by question id
    started_at: HashMap<String, u64>,
    records: HashMap<String, ChoiceLatencyRecord>,
    /// Question ids in first-presentation order
    order: Vec<String>,
}

impl Default for ChoiceLatencyTracker<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock, LatencyPolicy::default())
    }
}

impl<C: Clock> ChoiceLatencyTracker<C> {
    pub fn new(clock: C, policy: LatencyPolicy) -> Self {
        Self {
            clock,
            policy,
            started_at: HashMap::new(),
            records: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn policy(&self) -> LatencyPolicy {
        self.policy
    }

    /// Mark a question as presented now, replacing any earlier mount time
    pub fn start_question(&mut self, question_id: &str) {
        let now = self.clock.now_ms();
        self.started_at.insert(question_id.to_string(), now);
        if !self.order.iter().any(|id| id == question_id) {
            self.order.push(question_id.to_string());
        }
    }

    /// Record a selection and return the latency stored for the question
    pub fn record_choice(&mut self, question_id: &str, value: &str) -> u64 {
        let measured = match self.started_at.get(question_id) {
            Some(&start) => self.clock.now_ms().saturating_sub(start),
            None => {
                debug!(question_id, "choice recorded for a question that was never started");
                if !self.order.iter().any(|id| id == question_id) {
                    self.order.push(question_id.to_string());
                }
                0
            }
        };

        let policy = self.policy;
        let record = self
            .records
            .entry(question_id.to_string())
            .or_insert_with(|| ChoiceLatencyRecord {
                question_id: question_id.to_string(),
                selected_value: value.to_string(),
                latency_ms: measured,
            });

        record.selected_value = value.to_string();
        let keep_first = policy == LatencyPolicy::FirstDecision && record.latency_ms > 0;
        if !keep_first {
            record.latency_ms = measured;
        }
        record.latency_ms
    }

    /// Latency for one question, if a choice was recorded
    pub fn latency_for(&self, question_id: &str) -> Option<u64> {
        self.records.get(question_id).map(|r| r.latency_ms)
    }

    /// Records in question-presentation order
    pub fn records(&self) -> Vec<ChoiceLatencyRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect()
    }

    pub fn clear(&mut self) {
        self.started_at.clear();
        self.records.clear();
        self.order.clear();
    }
}
