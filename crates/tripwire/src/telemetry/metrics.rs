// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use opentelemetry::InstrumentationScope;
use opentelemetry::metrics::{Counter, MeterProvider};

const EVENT_COUNTER: &str = "resilience.event";
const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";

/// Builds the counter every breaker of a context reports into.
///
/// The instrumentation scope carries this crate's name and version, so breaker events
/// can be told apart from other `resilience.event` producers sharing a provider.
pub(crate) fn breaker_event_counter(provider: &dyn MeterProvider) -> Counter<u64> {
    let scope = InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_schema_url(SCHEMA_URL)
        .build();

    provider
        .meter_with_scope(scope)
        .u64_counter(EVENT_COUNTER)
        .with_description("Circuit breaker transitions, call timeouts and rejected calls.")
        .with_unit("{event}")
        .build()
}
