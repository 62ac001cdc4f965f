// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

#[cfg(any(feature = "metrics", test))]
use opentelemetry::KeyValue;

#[cfg(any(feature = "metrics", test))]
use super::*;
use crate::{CircuitState, TransitionError};

/// Reports breaker events to the metrics and logs sinks enabled on the context.
#[derive(Debug, Clone)]
pub(crate) struct TelemetryHelper {
    #[cfg(any(feature = "metrics", feature = "logs", test))]
    pub(crate) pipeline_name: std::borrow::Cow<'static, str>,
    #[cfg(any(feature = "metrics", feature = "logs", test))]
    pub(crate) strategy_name: std::borrow::Cow<'static, str>,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) event_reporter: Option<opentelemetry::metrics::Counter<u64>>,
    #[cfg(any(feature = "logs", test))]
    pub(crate) logs_enabled: bool,
}

impl TelemetryHelper {
    /// A helper that reports nothing.
    pub(crate) fn disabled(name: std::borrow::Cow<'static, str>) -> Self {
        _ = &name;

        Self {
            #[cfg(any(feature = "metrics", feature = "logs", test))]
            pipeline_name: name.clone(),
            #[cfg(any(feature = "metrics", feature = "logs", test))]
            strategy_name: name,
            #[cfg(any(feature = "metrics", test))]
            event_reporter: None,
            #[cfg(any(feature = "logs", test))]
            logs_enabled: false,
        }
    }

    #[cfg(any(feature = "metrics", test))]
    fn report_metrics(&self, event_name: &'static str, state: CircuitState) {
        if let Some(reporter) = &self.event_reporter {
            reporter.add(
                1,
                &[
                    KeyValue::new(PIPELINE_NAME, self.pipeline_name.clone()),
                    KeyValue::new(STRATEGY_NAME, self.strategy_name.clone()),
                    KeyValue::new(EVENT_NAME, event_name),
                    KeyValue::new(CIRCUIT_STATE, state.as_str()),
                ],
            );
        }
    }

    pub(crate) fn report_transition(&self, state: CircuitState, failure_rate: f32) {
        #[cfg(any(feature = "metrics", test))]
        self.report_metrics(
            match state {
                CircuitState::Open => CIRCUIT_OPENED_EVENT_NAME,
                CircuitState::Closed => CIRCUIT_CLOSED_EVENT_NAME,
                CircuitState::HalfOpen => CIRCUIT_HALF_OPENED_EVENT_NAME,
            },
            state,
        );

        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            if state == CircuitState::Open {
                tracing::event!(
                    name: "tripwire.breaker",
                    tracing::Level::WARN,
                    pipeline.name = %self.pipeline_name,
                    strategy.name = %self.strategy_name,
                    breaker.id = %self.strategy_name,
                    breaker.state = state.as_str(),
                    failure.rate = failure_rate,
                );
            } else {
                tracing::event!(
                    name: "tripwire.breaker",
                    tracing::Level::INFO,
                    pipeline.name = %self.pipeline_name,
                    strategy.name = %self.strategy_name,
                    breaker.id = %self.strategy_name,
                    breaker.state = state.as_str(),
                    failure.rate = failure_rate,
                );
            }
        }

        _ = (state, failure_rate);
    }

    pub(crate) fn report_timeout(&self, state: CircuitState, deadline: Duration) {
        #[cfg(any(feature = "metrics", test))]
        self.report_metrics(CALL_TIMEOUT_EVENT_NAME, state);

        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            tracing::event!(
                name: "tripwire.timeout",
                tracing::Level::WARN,
                pipeline.name = %self.pipeline_name,
                strategy.name = %self.strategy_name,
                breaker.id = %self.strategy_name,
                breaker.state = state.as_str(),
                timeout.ms = deadline.as_millis(),
            );
        }

        _ = (state, deadline);
    }

    pub(crate) fn report_rejected(&self) {
        #[cfg(any(feature = "metrics", test))]
        self.report_metrics(CALL_REJECTED_EVENT_NAME, CircuitState::Open);

        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            tracing::event!(
                name: "tripwire.rejected",
                tracing::Level::WARN,
                pipeline.name = %self.pipeline_name,
                strategy.name = %self.strategy_name,
                breaker.id = %self.strategy_name,
                breaker.state = CircuitState::Open.as_str(),
            );
        }
    }

    pub(crate) fn report_transition_error(&self, error: &TransitionError) {
        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            tracing::event!(
                name: "tripwire.transition_error",
                tracing::Level::ERROR,
                pipeline.name = %self.pipeline_name,
                strategy.name = %self.strategy_name,
                breaker.id = %self.strategy_name,
                error = %error,
            );
        }

        _ = error;
    }
}
