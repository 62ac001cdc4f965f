// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

/// Why a call was redirected to the failover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FailoverReason {
    /// The circuit was open and the call was not admitted as a trial call.
    CircuitOpen,

    /// The backend exceeded its deadline and call-through is enabled.
    Timeout,
}

/// Arguments for the [`failover`][super::BreakerLayer::failover] callback.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FailoverArgs {
    reason: FailoverReason,
    breaker_id: Cow<'static, str>,
}

impl FailoverArgs {
    pub(crate) fn new(reason: FailoverReason, breaker_id: Cow<'static, str>) -> Self {
        Self { reason, breaker_id }
    }

    /// Why the call was redirected.
    #[must_use]
    pub fn reason(&self) -> FailoverReason {
        self.reason
    }

    /// The name of the breaker that redirected the call.
    #[must_use]
    pub fn breaker_id(&self) -> &str {
        &self.breaker_id
    }
}
