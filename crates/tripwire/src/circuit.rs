// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

use crate::event::EventPublisher;
use crate::state::{StateCell, Transition};
use crate::telemetry::TelemetryHelper;
use crate::{BreakerEvent, CircuitState, Metrics, MetricsRecorder, TransitionError};

/// The shared state of one breaker: its state machine, outcome window and listeners.
///
/// A `Circuit` is created once per breaker and shared by every concurrent call made
/// through it. All mutation goes through atomic compare-and-swap loops; there are no locks.
///
/// [`Strategy`][crate::Strategy] implementations receive the circuit to make admission
/// decisions and drive transitions.
///
/// Events are published only by transitions that change the state; there is no way to
/// publish one directly:
///
/// ```compile_fail
/// use tripwire::{Circuit, CircuitState};
///
/// fn announce(circuit: &Circuit) {
///     circuit.publish(CircuitState::Open);
/// }
/// ```
#[derive(Debug)]
pub struct Circuit {
    id: Cow<'static, str>,
    state: StateCell,
    recorder: MetricsRecorder,
    publisher: EventPublisher,
    telemetry: TelemetryHelper,
}

impl Circuit {
    pub(crate) fn new(
        id: Cow<'static, str>,
        buffer_size: usize,
        publisher: EventPublisher,
        telemetry: TelemetryHelper,
    ) -> Self {
        Self {
            id,
            state: StateCell::new(CircuitState::Closed),
            recorder: MetricsRecorder::new(buffer_size),
            publisher,
            telemetry,
        }
    }

    /// The breaker name carried by every published event.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.state.get()
    }

    /// Returns `true` when the circuit is closed.
    ///
    /// This is advisory only: strategies may still admit trial calls while the circuit is open.
    #[must_use]
    pub fn is_call_allowed(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    /// The outcome window of this circuit.
    #[must_use]
    pub fn recorder(&self) -> &MetricsRecorder {
        &self.recorder
    }

    /// Snapshot of the outcome window.
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        self.recorder.snapshot()
    }

    /// Moves the circuit from closed to open.
    ///
    /// Returns `Ok(true)` and publishes an [`Open`][CircuitState::Open] event when this
    /// call changed the state, `Ok(false)` when the circuit is already open.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the circuit is neither closed nor open.
    pub fn open(&self) -> Result<bool, TransitionError> {
        self.transition(CircuitState::Closed, CircuitState::Open)
    }

    /// Moves the circuit from open to closed.
    ///
    /// Returns `Ok(true)` and publishes a [`Closed`][CircuitState::Closed] event when this
    /// call changed the state, `Ok(false)` when the circuit is already closed.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the circuit is neither open nor closed.
    pub fn close(&self) -> Result<bool, TransitionError> {
        self.transition(CircuitState::Open, CircuitState::Closed)
    }

    /// Notifies listeners and telemetry that the circuit entered `state`.
    pub(crate) fn publish(&self, state: CircuitState) {
        self.telemetry.report_transition(state, self.recorder.failure_rate());
        self.publisher.publish(&BreakerEvent::new(state, self.id.clone()));
    }

    pub(crate) fn name(&self) -> &Cow<'static, str> {
        &self.id
    }

    pub(crate) fn telemetry(&self) -> &TelemetryHelper {
        &self.telemetry
    }

    fn transition(&self, from: CircuitState, to: CircuitState) -> Result<bool, TransitionError> {
        match self.state.transition(from, to) {
            Transition::Changed => {
                self.publish(to);
                Ok(true)
            }
            Transition::AlreadyInTarget => Ok(false),
            Transition::Rejected(actual) => Err(TransitionError { expected: from, actual }),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_test(buffer_size: usize) -> Self {
        Self::new(
            "test".into(),
            buffer_size,
            EventPublisher::default(),
            TelemetryHelper::disabled("test".into()),
        )
    }

    #[cfg(test)]
    pub(crate) fn with_publisher(buffer_size: usize, publisher: EventPublisher) -> Self {
        Self::new("test".into(), buffer_size, publisher, TelemetryHelper::disabled("test".into()))
    }

    #[cfg(test)]
    pub(crate) fn force_state(&self, state: CircuitState) {
        self.state.force(state);
    }
}
