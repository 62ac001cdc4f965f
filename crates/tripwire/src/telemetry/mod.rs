// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Attribute keys and event names used when reporting breaker telemetry.
//!
//! Metrics are reported through a single `resilience.event` counter when
//! [`BreakerContext::enable_metrics`][crate::BreakerContext::enable_metrics] is used, and
//! structured log events are emitted through `tracing` when
//! [`BreakerContext::enable_logs`][crate::BreakerContext::enable_logs] is used.
//!
//! Names follow the [OpenTelemetry naming guidelines](https://opentelemetry.io/docs/specs/semconv/general/naming/#general-naming-considerations).

mod helper;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;

pub(crate) use helper::TelemetryHelper;

/// Key used to annotate the name of a resilience pipeline.
///
/// Examples: `user_auth`, `payment_flow`.
pub const PIPELINE_NAME: &str = "resilience.pipeline.name";

/// Key used to annotate the name of a resilience strategy, which is the breaker name.
pub const STRATEGY_NAME: &str = "resilience.strategy.name";

/// Key used to annotate the specific resilience event being emitted.
///
/// Examples: `circuit_opened`, `call_timeout`.
pub const EVENT_NAME: &str = "resilience.event.name";

/// Key used to annotate the circuit state that accompanies an event.
pub const CIRCUIT_STATE: &str = "resilience.circuit_breaker.state";

pub(crate) const CIRCUIT_OPENED_EVENT_NAME: &str = "circuit_opened";
pub(crate) const CIRCUIT_CLOSED_EVENT_NAME: &str = "circuit_closed";
pub(crate) const CIRCUIT_HALF_OPENED_EVENT_NAME: &str = "circuit_half_opened";
pub(crate) const CALL_TIMEOUT_EVENT_NAME: &str = "call_timeout";
pub(crate) const CALL_REJECTED_EVENT_NAME: &str = "call_rejected";
