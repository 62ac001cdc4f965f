// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

use crate::constants::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_TRIAL_PROBABILITY};
use crate::trial::TrialSampler;
use crate::{Circuit, CircuitState};

/// Policy that decides admission and drives circuit transitions.
///
/// The breaker consults [`is_call_allowed`][Strategy::is_call_allowed] before every call
/// and reports the outcome of each backend call through
/// [`on_success`][Strategy::on_success] or [`on_failure`][Strategy::on_failure].
/// Outcomes of failover calls are never reported.
pub trait Strategy: Debug + Send + Sync + 'static {
    /// Decides whether the next call goes to the backend.
    fn is_call_allowed(&self, circuit: &Circuit) -> bool;

    /// Called after a backend call succeeded.
    fn on_success(&self, circuit: &Circuit);

    /// Called after a backend call failed or exceeded its deadline.
    fn on_failure(&self, circuit: &Circuit);
}

/// Failure-rate strategy with probabilistic trial calls.
///
/// Every reported outcome is recorded into the circuit's window and the threshold is
/// re-evaluated right away:
///
/// - failure rate above the threshold while closed opens the circuit,
/// - failure rate at or below the threshold while not closed closes it.
///
/// While open, each call is still admitted to the backend with the configured trial
/// probability, so recovery is detected from live traffic without a cool-down timer.
/// A breaker without a failover rejects calls while open before consulting the strategy.
///
/// # Examples
///
/// ```
/// use tripwire::DefaultStrategy;
///
/// let strategy = DefaultStrategy::new(35.0).trial_probability(0.05);
/// # _ = strategy;
/// ```
#[derive(Debug, Clone)]
pub struct DefaultStrategy {
    failure_threshold: f32,
    trial_probability: f64,
    sampler: TrialSampler,
}

impl DefaultStrategy {
    /// Creates a strategy that opens the circuit above `failure_threshold` percent of failures.
    ///
    /// # Panics
    ///
    /// Panics if `failure_threshold` is not within `0.0..=100.0`.
    #[must_use]
    pub fn new(failure_threshold: f32) -> Self {
        assert!(
            (0.0..=100.0).contains(&failure_threshold),
            "failure_threshold must be between 0 and 100, got {failure_threshold}"
        );

        Self {
            failure_threshold,
            trial_probability: DEFAULT_TRIAL_PROBABILITY,
            sampler: TrialSampler::default(),
        }
    }

    /// Sets the probability of admitting a trial call while the circuit is open.
    ///
    /// The default is `0.2`. Use `0.0` to reject every call while open.
    ///
    /// # Panics
    ///
    /// Panics if `probability` is not within `0.0..=1.0`.
    #[must_use]
    pub fn trial_probability(mut self, probability: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "trial probability must be between 0 and 1, got {probability}"
        );

        self.trial_probability = probability;
        self
    }

    /// The configured failure threshold in percent.
    #[must_use]
    pub fn failure_threshold(&self) -> f32 {
        self.failure_threshold
    }

    #[cfg(test)]
    pub(crate) fn with_sampler(mut self, sampler: TrialSampler) -> Self {
        self.sampler = sampler;
        self
    }

    fn evaluate(&self, circuit: &Circuit) {
        let failure_rate = circuit.recorder().failure_rate();
        let state = circuit.state();

        let result = if failure_rate > self.failure_threshold && state == CircuitState::Closed {
            circuit.open()
        } else if failure_rate <= self.failure_threshold && state != CircuitState::Closed {
            circuit.close()
        } else {
            return;
        };

        if let Err(error) = result {
            circuit.telemetry().report_transition_error(&error);
        }
    }
}

impl Default for DefaultStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

impl Strategy for DefaultStrategy {
    fn is_call_allowed(&self, circuit: &Circuit) -> bool {
        circuit.is_call_allowed() || self.sampler.admits(self.trial_probability)
    }

    fn on_success(&self, circuit: &Circuit) {
        circuit.recorder().record_success();
        self.evaluate(circuit);
    }

    fn on_failure(&self, circuit: &Circuit) {
        circuit.recorder().record_failure();
        self.evaluate(circuit);
    }
}
