// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt::Debug;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use anyspawn::{JoinHandle, Spawner};
use futures_util::future::{Either, select};
use layered::Service;
use tick::Clock;

use super::{BreakerLayer, Failover, FailoverArgs, FailoverReason};
use crate::{BreakerContext, BreakerError, Circuit, CircuitState, Metrics, Strategy, TransitionError};

/// Circuit breaker around a backend service.
///
/// Calls are admitted by the breaker's [`Strategy`], executed on the context's spawner and
/// raced against the configured deadline. Calls that are not admitted, and with call-through
/// calls that exceed the deadline, go to the failover.
///
/// While the circuit is open and no failover is configured, every call fails with
/// [`BreakerError::NoFailover`] without consulting the strategy, so no trial call reaches
/// the backend.
///
/// Clones share the same circuit.
///
/// For documentation and examples, see the [crate-level][crate] docs.
#[derive(Debug)]
pub struct Breaker<In, T, E, S> {
    pub(super) shared: Arc<BreakerShared<In, T, E, S>>,
}

#[derive(Debug)]
pub(crate) struct BreakerShared<In, T, E, S> {
    pub(crate) backend: S,
    pub(crate) failover: Option<Failover<In, T, E>>,
    pub(crate) circuit: Circuit,
    pub(crate) strategy: Arc<dyn Strategy>,
    pub(crate) clock: Clock,
    pub(crate) spawner: Spawner,
    pub(crate) deadline: Duration,
    pub(crate) call_through: bool,
}

impl<In, T, E, S> Clone for Breaker<In, T, E, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<In, T, E> Breaker<In, T, E, ()> {
    /// Creates a [`BreakerLayer`] used to configure a circuit breaker.
    ///
    /// The `name` identifies the breaker in published events and telemetry. Prefer `snake_case`.
    pub fn layer(name: impl Into<Cow<'static, str>>, context: &BreakerContext) -> BreakerLayer<In, T, E> {
        BreakerLayer::new(name.into(), context)
    }
}

impl<In, T, E, S> Breaker<In, T, E, S> {
    /// Forces the circuit open.
    ///
    /// Returns `Ok(true)` if this call changed the state and `Ok(false)` if it was already open.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the circuit is in a state other than closed or open.
    pub fn open(&self) -> Result<bool, TransitionError> {
        self.shared.circuit.open()
    }

    /// Forces the circuit closed.
    ///
    /// Returns `Ok(true)` if this call changed the state and `Ok(false)` if it was already closed.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the circuit is in a state other than open or closed.
    pub fn close(&self) -> Result<bool, TransitionError> {
        self.shared.circuit.close()
    }

    /// Returns `true` when the circuit is closed.
    ///
    /// Trial calls may still reach the backend while the circuit is open.
    #[must_use]
    pub fn is_call_allowed(&self) -> bool {
        self.shared.circuit.is_call_allowed()
    }

    /// Current circuit state.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.shared.circuit.state()
    }

    /// Snapshot of the outcome window.
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        self.shared.circuit.metrics()
    }

    /// The breaker name.
    #[must_use]
    pub fn id(&self) -> &str {
        self.shared.circuit.id()
    }

    /// The circuit shared by all clones of this breaker.
    #[must_use]
    pub fn circuit(&self) -> &Circuit {
        &self.shared.circuit
    }
}

impl<In, T, E, S> Breaker<In, T, E, S>
where
    In: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    S: Service<In, Out = Result<T, E>> + 'static,
{
    /// Calls the protected operation.
    ///
    /// The returned future is `'static` and does not borrow the breaker. Awaiting it never
    /// blocks the thread.
    pub fn invoke(&self, input: In) -> BreakerFuture<T, E> {
        let shared = Arc::clone(&self.shared);

        BreakerFuture {
            inner: Box::pin(shared.run(input)),
        }
    }

    /// Calls the protected operation and blocks the current thread until it resolves.
    ///
    /// The context's spawner must be able to run tasks while this thread is blocked,
    /// so this must not be called from within an async task.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`invoke`][Self::invoke].
    pub fn invoke_blocking(&self, input: In) -> Result<T, BreakerError<E>> {
        futures::executor::block_on(self.invoke(input))
    }
}

impl<In, T, E, S> Service<In> for Breaker<In, T, E, S>
where
    In: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    S: Service<In, Out = Result<T, E>> + 'static,
{
    type Out = Result<T, BreakerError<E>>;

    fn execute(&self, input: In) -> impl Future<Output = Self::Out> + Send {
        self.invoke(input)
    }
}

impl<In, T, E, S> BreakerShared<In, T, E, S>
where
    In: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    S: Service<In, Out = Result<T, E>> + 'static,
{
    async fn run(self: Arc<Self>, input: In) -> Result<T, BreakerError<E>> {
        // an open circuit without a failover rejects before any trial draw
        if self.failover.is_none() && !self.circuit.is_call_allowed() {
            self.circuit.telemetry().report_rejected();
            return Err(BreakerError::NoFailover);
        }

        if !self.strategy.is_call_allowed(&self.circuit) {
            return self.redirect(input).await;
        }

        let retained = (self.call_through && self.failover.is_some()).then(|| input.clone());
        let backend = Arc::clone(&self);
        let call = self.spawner.spawn(async move { backend.backend.execute(input).await });

        match self.race(call).await {
            Some(Ok(output)) => {
                self.strategy.on_success(&self.circuit);
                Ok(output)
            }
            Some(Err(error)) => {
                self.strategy.on_failure(&self.circuit);
                Err(BreakerError::Inner(error))
            }
            None => {
                self.strategy.on_failure(&self.circuit);
                self.circuit.telemetry().report_timeout(self.circuit.state(), self.deadline);

                if !self.call_through {
                    return Err(BreakerError::Timeout { deadline: self.deadline });
                }

                match (&self.failover, retained) {
                    (Some(failover), Some(input)) => self
                        .spawner
                        .spawn(failover.call(input, self.failover_args(FailoverReason::Timeout)))
                        .await
                        .map_err(BreakerError::Inner),
                    _ => Err(BreakerError::NoFailover),
                }
            }
        }
    }

    async fn redirect(&self, input: In) -> Result<T, BreakerError<E>> {
        let Some(failover) = &self.failover else {
            self.circuit.telemetry().report_rejected();
            return Err(BreakerError::NoFailover);
        };

        let call = self
            .spawner
            .spawn(failover.call(input, self.failover_args(FailoverReason::CircuitOpen)));

        match self.race(call).await {
            Some(result) => result.map_err(BreakerError::Inner),
            None => {
                self.circuit.telemetry().report_timeout(self.circuit.state(), self.deadline);
                Err(BreakerError::Timeout { deadline: self.deadline })
            }
        }
    }

    /// Returns `None` when the deadline elapses first; the call keeps running detached.
    async fn race(&self, call: JoinHandle<Result<T, E>>) -> Option<Result<T, E>> {
        let deadline = pin!(self.clock.delay(self.deadline));

        match select(call, deadline).await {
            Either::Left((output, _)) => Some(output),
            Either::Right(((), _abandoned)) => None,
        }
    }

    fn failover_args(&self, reason: FailoverReason) -> FailoverArgs {
        FailoverArgs::new(reason, self.circuit.name().clone())
    }
}

/// Future returned by [`Breaker::invoke`].
pub struct BreakerFuture<T, E> {
    inner: Pin<Box<dyn Future<Output = Result<T, BreakerError<E>>> + Send>>,
}

impl<T, E> Debug for BreakerFuture<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakerFuture").finish_non_exhaustive()
    }
}

impl<T, E> Future for BreakerFuture<T, E> {
    type Output = Result<T, BreakerError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

#[cfg(any(feature = "tower-service", test))]
impl<In, T, E, S> tower_service::Service<In> for Breaker<In, T, E, S>
where
    In: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    S: Service<In, Out = Result<T, E>> + 'static,
{
    type Response = T;
    type Error = BreakerError<E>;
    type Future = BreakerFuture<T, E>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: In) -> Self::Future {
        self.invoke(req)
    }
}
