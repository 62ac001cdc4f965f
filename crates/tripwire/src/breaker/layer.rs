// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use layered::{Layer, Service};

use super::{Breaker, BreakerShared, Failover, FailoverArgs};
use crate::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_CALL_THROUGH, DEFAULT_DEADLINE, DEFAULT_FAILURE_THRESHOLD, DEFAULT_TRIAL_PROBABILITY,
};
use crate::event::EventPublisher;
use crate::{BreakerConfig, BreakerContext, BreakerEvent, Circuit, DefaultStrategy, EventListener, Strategy};

/// Builder for a circuit breaker around a backend service.
///
/// Created by [`Breaker::layer`]. Every setting has a default, so the layer can wrap a
/// backend right away; the failover is optional.
///
/// For documentation and examples, see the [crate-level][crate] docs.
#[derive(Debug)]
pub struct BreakerLayer<In, T, E> {
    context: BreakerContext,
    name: Cow<'static, str>,
    failover: Option<Failover<In, T, E>>,
    deadline: Duration,
    call_through: bool,
    buffer_size: usize,
    failure_threshold: f32,
    trial_probability: f64,
    strategy: Option<Arc<dyn Strategy>>,
    publisher: EventPublisher,
}

impl<In, T, E> BreakerLayer<In, T, E> {
    #[must_use]
    pub(crate) fn new(name: Cow<'static, str>, context: &BreakerContext) -> Self {
        Self {
            context: context.clone(),
            name,
            failover: None,
            deadline: DEFAULT_DEADLINE,
            call_through: DEFAULT_CALL_THROUGH,
            buffer_size: DEFAULT_BUFFER_SIZE,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            trial_probability: DEFAULT_TRIAL_PROBABILITY,
            strategy: None,
            publisher: EventPublisher::default(),
        }
    }

    /// Sets the maximum time a call may take. The default is 30 seconds.
    ///
    /// # Panics
    ///
    /// Panics if `deadline` is zero.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        assert!(!deadline.is_zero(), "deadline must be greater than zero");

        self.deadline = deadline;
        self
    }

    /// Redirects calls that exceed the deadline to the failover.
    ///
    /// The timed-out backend call is abandoned, not cancelled. Without a failover,
    /// such calls fail with [`BreakerError::NoFailover`][crate::BreakerError::NoFailover].
    #[must_use]
    pub fn enable_call_through(mut self) -> Self {
        self.call_through = true;
        self
    }

    /// Fails calls that exceed the deadline with [`BreakerError::Timeout`][crate::BreakerError::Timeout].
    ///
    /// This is the default.
    #[must_use]
    pub fn disable_call_through(mut self) -> Self {
        self.call_through = false;
        self
    }

    /// Sets the capacity of the outcome window. The default is 1000.
    ///
    /// The capacity is rounded up to a multiple of 64.
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Sets the failure rate, in percent, above which the circuit opens. The default is 20.
    ///
    /// Ignored when a custom [`strategy`][Self::strategy] is set.
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is not within `0.0..=100.0`.
    #[must_use]
    pub fn failure_threshold(mut self, threshold: f32) -> Self {
        assert!(
            (0.0..=100.0).contains(&threshold),
            "failure_threshold must be between 0 and 100, got {threshold}"
        );

        self.failure_threshold = threshold;
        self
    }

    /// Sets the probability of admitting a trial call while the circuit is open. The default is 0.2.
    ///
    /// Ignored when a custom [`strategy`][Self::strategy] is set.
    ///
    /// # Panics
    ///
    /// Panics if `probability` is not within `0.0..=1.0`.
    #[must_use]
    pub fn trial_probability(mut self, probability: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "trial probability must be between 0 and 1, got {probability}"
        );

        self.trial_probability = probability;
        self
    }

    /// Replaces the [`DefaultStrategy`] with a custom policy.
    #[must_use]
    pub fn strategy(mut self, strategy: impl Strategy) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    /// Registers an observer of state transitions.
    ///
    /// Listeners are notified in registration order. Registering the same `Arc` twice
    /// has no effect.
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn EventListener>) -> Self {
        self.publisher.register(listener);
        self
    }

    /// Registers a closure invoked on every state transition.
    #[must_use]
    pub fn on_event(self, callback: impl Fn(&BreakerEvent) + Send + Sync + 'static) -> Self {
        self.listener(Arc::new(callback))
    }

    /// Applies every value of `config`.
    ///
    /// # Panics
    ///
    /// Panics if any value is out of range, see the individual setters.
    #[must_use]
    pub fn config(self, config: &BreakerConfig) -> Self {
        let layer = self
            .deadline(config.deadline)
            .buffer_size(config.buffer_size)
            .failure_threshold(config.failure_threshold)
            .trial_probability(config.trial_probability);

        if config.call_through {
            layer.enable_call_through()
        } else {
            layer.disable_call_through()
        }
    }
}

impl<In, T, E> BreakerLayer<In, T, E>
where
    In: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Sets the failover invoked when the circuit is open or, with call-through, when
    /// the backend exceeds its deadline.
    ///
    /// Failover outcomes are never recorded into the outcome window.
    #[must_use]
    pub fn failover<F, Fut>(mut self, failover: F) -> Self
    where
        F: Fn(In, FailoverArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.failover = Some(Failover::new(move |input, args| Box::pin(failover(input, args))));
        self
    }

    /// Uses another service, such as a second breaker, as the failover.
    #[must_use]
    pub fn failover_service<F>(mut self, service: F) -> Self
    where
        F: Service<In, Out = Result<T, E>> + 'static,
    {
        let service = Arc::new(service);

        self.failover = Some(Failover::new(move |input, _args| {
            let service = Arc::clone(&service);
            Box::pin(async move { service.execute(input).await })
        }));
        self
    }
}

impl<In, T, E, S> Layer<S> for BreakerLayer<In, T, E> {
    type Service = Breaker<In, T, E, S>;

    fn layer(&self, inner: S) -> Self::Service {
        let telemetry = self.context.create_telemetry(self.name.clone());
        let strategy = self.strategy.clone().unwrap_or_else(|| {
            Arc::new(DefaultStrategy::new(self.failure_threshold).trial_probability(self.trial_probability))
        });

        Breaker {
            shared: Arc::new(BreakerShared {
                backend: inner,
                failover: self.failover.clone(),
                circuit: Circuit::new(self.name.clone(), self.buffer_size, self.publisher.clone(), telemetry),
                strategy,
                clock: self.context.clock().clone(),
                spawner: self.context.spawner().clone(),
                deadline: self.deadline,
                call_through: self.call_through,
            }),
        }
    }
}
