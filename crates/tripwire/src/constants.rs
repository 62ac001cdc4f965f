// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

pub(crate) const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);
pub(crate) const DEFAULT_BUFFER_SIZE: usize = 1000;
pub(crate) const DEFAULT_FAILURE_THRESHOLD: f32 = 20.0;
pub(crate) const DEFAULT_TRIAL_PROBABILITY: f64 = 0.2;
pub(crate) const DEFAULT_CALL_THROUGH: bool = false;
