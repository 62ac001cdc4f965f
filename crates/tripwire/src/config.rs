// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_CALL_THROUGH, DEFAULT_DEADLINE, DEFAULT_FAILURE_THRESHOLD, DEFAULT_TRIAL_PROBABILITY,
};

/// Plain-data breaker configuration.
///
/// Apply it to a builder with [`BreakerLayer::config`][crate::BreakerLayer::config]. With the
/// `serde` feature the type can be loaded from configuration files; missing fields
/// fall back to their defaults.
///
/// # Defaults
///
/// | Field | Default |
/// |---|---|
/// | `deadline` | 30 seconds |
/// | `call_through` | `false` |
/// | `buffer_size` | 1000 |
/// | `failure_threshold` | 20.0 |
/// | `trial_probability` | 0.2 |
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
pub struct BreakerConfig {
    /// Maximum time a call may take before it times out.
    pub deadline: Duration,

    /// Whether a timed-out call is redirected to the failover.
    pub call_through: bool,

    /// Capacity of the outcome window, rounded up to a multiple of 64.
    pub buffer_size: usize,

    /// Failure rate in percent above which the circuit opens.
    pub failure_threshold: f32,

    /// Probability of admitting a trial call while the circuit is open.
    pub trial_probability: f64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            call_through: DEFAULT_CALL_THROUGH,
            buffer_size: DEFAULT_BUFFER_SIZE,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            trial_probability: DEFAULT_TRIAL_PROBABILITY,
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = BreakerConfig::default();

        assert_eq!(config.deadline, Duration::from_secs(30));
        assert!(!config.call_through);
        assert_eq!(config.buffer_size, 1000);
        assert!((config.failure_threshold - 20.0).abs() < f32::EPSILON);
        assert!((config.trial_probability - 0.2).abs() < f64::EPSILON);
    }
}
