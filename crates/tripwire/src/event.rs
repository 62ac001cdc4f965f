// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::CircuitState;

/// A state transition observed on a breaker.
///
/// Published once per actual transition, never for a no-op or rejected transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct BreakerEvent {
    state: CircuitState,
    breaker_id: Cow<'static, str>,
}

impl BreakerEvent {
    /// Creates an event for the breaker identified by `breaker_id`.
    #[must_use]
    pub fn new(state: CircuitState, breaker_id: impl Into<Cow<'static, str>>) -> Self {
        Self {
            state,
            breaker_id: breaker_id.into(),
        }
    }

    /// The state the breaker transitioned into.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// The name of the breaker that transitioned.
    #[must_use]
    pub fn breaker_id(&self) -> &str {
        &self.breaker_id
    }
}

/// Observer of breaker state transitions.
///
/// Implemented for any `Fn(&BreakerEvent)` closure. Listeners are invoked
/// synchronously on the task that caused the transition, so they should return quickly.
pub trait EventListener: Send + Sync + 'static {
    /// Called after the breaker transitioned.
    fn on_event(&self, event: &BreakerEvent);
}

impl<F> EventListener for F
where
    F: Fn(&BreakerEvent) + Send + Sync + 'static,
{
    fn on_event(&self, event: &BreakerEvent) {
        self(event);
    }
}

/// Fans events out to registered listeners in registration order.
#[derive(Clone, Default)]
pub(crate) struct EventPublisher {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventPublisher {
    /// Adds a listener; returns `false` if the same listener is already registered.
    pub(crate) fn register(&mut self, listener: Arc<dyn EventListener>) -> bool {
        let address = Arc::as_ptr(&listener).cast::<()>();

        if self
            .listeners
            .iter()
            .any(|registered| Arc::as_ptr(registered).cast::<()>() == address)
        {
            return false;
        }

        self.listeners.push(listener);
        true
    }

    pub(crate) fn publish(&self, event: &BreakerEvent) {
        for listener in &self.listeners {
            listener.on_event(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl Debug for EventPublisher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher").field("listeners", &self.listeners.len()).finish()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn event_equality_by_value() {
        let a = BreakerEvent::new(CircuitState::Open, "db");
        let b = BreakerEvent::new(CircuitState::Open, String::from("db"));

        assert_eq!(a, b);
        assert_ne!(a, BreakerEvent::new(CircuitState::Closed, "db"));
        assert_eq!(a.breaker_id(), "db");
        assert_eq!(a.state(), CircuitState::Open);
    }

    #[test]
    fn publish_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut publisher = EventPublisher::default();

        for index in 0..3 {
            let seen = Arc::clone(&seen);
            publisher.register(Arc::new(move |_: &BreakerEvent| seen.lock().unwrap().push(index)));
        }

        publisher.publish(&BreakerEvent::new(CircuitState::Open, "db"));

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let calls = Arc::new(Mutex::new(0));
        let listener: Arc<dyn EventListener> = {
            let calls = Arc::clone(&calls);
            Arc::new(move |_: &BreakerEvent| *calls.lock().unwrap() += 1)
        };
        let mut publisher = EventPublisher::default();

        assert!(publisher.register(Arc::clone(&listener)));
        assert!(!publisher.register(Arc::clone(&listener)));
        assert_eq!(publisher.len(), 1);

        publisher.publish(&BreakerEvent::new(CircuitState::Closed, "db"));

        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn debug_shows_listener_count() {
        let mut publisher = EventPublisher::default();
        publisher.register(Arc::new(|_: &BreakerEvent| {}));

        assert_eq!(format!("{publisher:?}"), "EventPublisher { listeners: 1 }");
    }
}
