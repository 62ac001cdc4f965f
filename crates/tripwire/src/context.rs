// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

use anyspawn::Spawner;
use tick::Clock;

use crate::telemetry::TelemetryHelper;

pub(crate) const DEFAULT_PIPELINE_NAME: &str = "default";

/// Runtime dependencies shared by the breakers of one pipeline.
///
/// The context carries the [`Clock`] used for call deadlines and the [`Spawner`]
/// used to run backend and failover calls. Nothing is global: whoever creates the
/// runtime behind the spawner owns its lifecycle and shutdown.
///
/// # Examples
///
/// ```
/// use anyspawn::Spawner;
/// use tick::Clock;
/// use tripwire::BreakerContext;
///
/// # fn context(clock: Clock) {
/// let spawner = Spawner::new_custom("test", |work| {
///     std::thread::spawn(move || futures::executor::block_on(work));
/// });
///
/// let context = BreakerContext::new(&clock, spawner).name("checkout");
/// # _ = context;
/// # }
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct BreakerContext {
    clock: Clock,
    spawner: Spawner,
    name: Cow<'static, str>,
    #[cfg(any(feature = "metrics", test))]
    event_counter: Option<opentelemetry::metrics::Counter<u64>>,
    #[cfg(any(feature = "logs", test))]
    logs_enabled: bool,
}

impl BreakerContext {
    /// Creates a context from a clock and a spawner. The pipeline name is `"default"`.
    pub fn new(clock: impl AsRef<Clock>, spawner: Spawner) -> Self {
        Self {
            clock: clock.as_ref().clone(),
            spawner,
            name: Cow::Borrowed(DEFAULT_PIPELINE_NAME),
            #[cfg(any(feature = "metrics", test))]
            event_counter: None,
            #[cfg(any(feature = "logs", test))]
            logs_enabled: false,
        }
    }

    /// Creates a context backed by the Tokio runtime of the current task.
    #[cfg(feature = "tokio")]
    #[must_use]
    pub fn new_tokio() -> Self {
        Self::new(Clock::new_tokio(), Spawner::new_tokio())
    }

    /// Sets the pipeline name reported in telemetry. Prefer `snake_case`.
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Enables metrics reporting with the given OpenTelemetry meter provider.
    #[must_use]
    #[cfg(any(feature = "metrics", test))]
    pub fn enable_metrics(self, provider: &dyn opentelemetry::metrics::MeterProvider) -> Self {
        Self {
            event_counter: Some(crate::telemetry::metrics::breaker_event_counter(provider)),
            ..self
        }
    }

    /// Enables structured logging of breaker events.
    #[must_use]
    #[cfg(any(feature = "logs", test))]
    pub fn enable_logs(self) -> Self {
        Self {
            logs_enabled: true,
            ..self
        }
    }

    pub(crate) fn clock(&self) -> &Clock {
        &self.clock
    }

    pub(crate) fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub(crate) fn create_telemetry(&self, strategy_name: Cow<'static, str>) -> TelemetryHelper {
        _ = &strategy_name;

        TelemetryHelper {
            #[cfg(any(feature = "metrics", feature = "logs", test))]
            pipeline_name: self.name.clone(),
            #[cfg(any(feature = "metrics", feature = "logs", test))]
            strategy_name,
            #[cfg(any(feature = "metrics", test))]
            event_reporter: self.event_counter.clone(),
            #[cfg(any(feature = "logs", test))]
            logs_enabled: self.logs_enabled,
        }
    }
}
