// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use recoverable::{Recovery, RecoveryInfo};

use crate::CircuitState;

/// Error returned by calls made through a [`Breaker`][crate::Breaker].
///
/// The protected operation returns `Result<T, E>`; the breaker surfaces its own
/// failures next to the operation's error `E`, which is passed through untouched.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BreakerError<E> {
    /// The call had to be redirected, but no failover was configured.
    #[error("circuit breaker cannot redirect the call, no failover available")]
    NoFailover,

    /// The deadline elapsed before the call completed.
    #[error("call timed out after {deadline:?}")]
    Timeout {
        /// The configured deadline.
        deadline: Duration,
    },

    /// The error raised by the backend or the failover.
    #[error(transparent)]
    Inner(E),
}

impl<E> BreakerError<E> {
    /// Returns the operation's own error, if this is one.
    #[must_use]
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(error) => Some(error),
            _ => None,
        }
    }

    /// Returns `true` if the deadline elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if no failover was available.
    #[must_use]
    pub fn is_no_failover(&self) -> bool {
        matches!(self, Self::NoFailover)
    }
}

impl<E> BreakerError<BreakerError<E>> {
    /// Collapses the error of a breaker that wraps another breaker.
    ///
    /// ```
    /// use tripwire::BreakerError;
    ///
    /// let nested: BreakerError<BreakerError<String>> = BreakerError::Inner(BreakerError::NoFailover);
    /// assert!(nested.flatten().is_no_failover());
    /// ```
    #[must_use]
    pub fn flatten(self) -> BreakerError<E> {
        match self {
            Self::NoFailover => BreakerError::NoFailover,
            Self::Timeout { deadline } => BreakerError::Timeout { deadline },
            Self::Inner(inner) => inner,
        }
    }
}

impl<E: Recovery> Recovery for BreakerError<E> {
    fn recovery(&self) -> RecoveryInfo {
        match self {
            Self::NoFailover => RecoveryInfo::unavailable(),
            Self::Timeout { .. } => RecoveryInfo::retry(),
            Self::Inner(error) => error.recovery(),
        }
    }
}

/// A state transition was attempted from a state that does not satisfy its precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid circuit state transition, expected {expected} but the circuit is {actual}")]
#[non_exhaustive]
pub struct TransitionError {
    /// The state the transition starts from.
    pub expected: CircuitState,

    /// The state the circuit was actually in.
    pub actual: CircuitState,
}
