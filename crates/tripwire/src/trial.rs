// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Decides which calls reach the backend while the circuit is open.
///
/// Probabilities of `0.0` and `1.0` are answered without drawing. Draws use `fastrand`,
/// which is fine here: admission only needs to be spread out, not unpredictable.
#[derive(Debug, Clone, Default)]
pub(crate) struct TrialSampler {
    #[cfg(test)]
    pinned: Option<f64>,
}

impl TrialSampler {
    /// A sampler whose every draw yields `value`.
    #[cfg(test)]
    pub(crate) fn pinned(value: f64) -> Self {
        Self { pinned: Some(value) }
    }

    pub(crate) fn admits(&self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }

        if probability >= 1.0 {
            return true;
        }

        #[cfg(test)]
        if let Some(value) = self.pinned {
            return value < probability;
        }

        fastrand::f64() < probability
    }
}
