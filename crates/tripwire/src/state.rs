// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};

/// The state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CircuitState {
    /// Calls flow to the backend.
    Closed,

    /// Calls are redirected to the failover, or rejected when there is none.
    ///
    /// A fraction of calls is still admitted to the backend as trial calls.
    Open,

    /// Reserved for strategies that probe recovery through a dedicated state.
    ///
    /// The default strategy never enters this state.
    HalfOpen,
}

impl CircuitState {
    /// Returns the `snake_case` name used in logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }

    const fn to_u8(self) -> u8 {
        match self {
            Self::Closed => 0,
            Self::Open => 1,
            Self::HalfOpen => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Closed,
            1 => Self::Open,
            _ => Self::HalfOpen,
        }
    }
}

impl Display for CircuitState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an attempted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Changed,
    AlreadyInTarget,
    Rejected(CircuitState),
}

/// Atomic holder of the current [`CircuitState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: CircuitState) -> Self {
        Self(AtomicU8::new(state.to_u8()))
    }

    pub(crate) fn get(&self) -> CircuitState {
        CircuitState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves from `from` to `to` with a compare-and-swap loop.
    ///
    /// Exactly one of several racing callers observes [`Transition::Changed`].
    pub(crate) fn transition(&self, from: CircuitState, to: CircuitState) -> Transition {
        let mut current = self.0.load(Ordering::Acquire);

        loop {
            let state = CircuitState::from_u8(current);
            if state == to {
                return Transition::AlreadyInTarget;
            }

            if state != from {
                return Transition::Rejected(state);
            }

            match self
                .0
                .compare_exchange_weak(current, to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Transition::Changed,
                Err(actual) => current = actual,
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn force(&self, state: CircuitState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }
}
