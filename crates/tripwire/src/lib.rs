// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Lock-free circuit breaker with failover, deadlines and call-through.
//!
//! A [`Breaker`] sits in front of an unreliable backend service. It tracks the outcomes of
//! recent calls in a fixed-size window, opens once the failure rate crosses a threshold and
//! then redirects calls to an optional failover. While open, a fraction of calls is still
//! admitted to the backend as trial calls; once enough of them succeed the breaker closes again.
//!
//! Every call is raced against a deadline. A call that exceeds it either fails with
//! [`BreakerError::Timeout`] or, with call-through enabled, is redirected to the failover
//! while the original call is abandoned in the background.
//!
//! # Quick Start
//!
//! ```rust
//! # use std::time::Duration;
//! # use anyspawn::Spawner;
//! # use tick::Clock;
//! use layered::{Execute, Layer, Service};
//! use tripwire::{Breaker, BreakerContext, BreakerError};
//!
//! # async fn example(clock: Clock, spawner: Spawner) {
//! let context = BreakerContext::new(&clock, spawner);
//!
//! let breaker = Breaker::layer("inventory", &context)
//!     .deadline(Duration::from_secs(2))
//!     .enable_call_through()
//!     .failure_threshold(25.0)
//!     .failover(|item: String, _args| async move { Ok(format!("cached:{item}")) })
//!     .on_event(|event| println!("{} is now {}", event.breaker_id(), event.state()))
//!     .layer(Execute::new(|item: String| async move { Ok::<_, std::io::Error>(format!("live:{item}")) }));
//!
//! match breaker.execute("apples".to_string()).await {
//!     Ok(stock) => println!("{stock}"),
//!     Err(BreakerError::NoFailover) => println!("circuit open"),
//!     Err(error) => println!("call failed: {error}"),
//! }
//! # }
//! ```
//!
//! # Call Shapes
//!
//! The same breaker serves asynchronous and synchronous callers:
//!
//! - [`Breaker::invoke`] and the [`layered::Service`] implementation return a future and never block.
//! - [`Breaker::invoke_blocking`] blocks the calling thread until the call resolves.
//! - With the `tower-service` feature, [`Breaker`] also implements `tower_service::Service`.
//!
//! # Runtime
//!
//! The breaker does not own a runtime. Calls run on the [`anyspawn::Spawner`] and deadlines use
//! the [`tick::Clock`] passed through [`BreakerContext`]. Tests can substitute a controlled clock
//! and a custom spawner to make timeouts deterministic.
//!
//! # Accounting
//!
//! Only backend outcomes are recorded. A backend call that exceeds its deadline counts as a
//! failure. Failover calls are never recorded, so the failure rate reflects the backend alone.
//! The failure rate is computed against the whole window capacity, which is rounded up to a
//! multiple of 64.
//!
//! # Features
//!
//! - `logs`: Emits `tracing` events on transitions, timeouts and rejections.
//! - `metrics`: Reports a `resilience.event` OpenTelemetry counter.
//! - `serde`: Serialization of [`BreakerConfig`].
//! - `tower-service`: Implements `tower_service::Service` for [`Breaker`].
//! - `tokio`: Adds [`BreakerContext::new_tokio`].

mod breaker;
mod circuit;
mod config;
mod constants;
mod context;
mod error;
mod event;
mod recorder;
mod ring;
mod state;
mod strategy;
mod trial;
pub mod telemetry;

pub use breaker::{Breaker, BreakerFuture, BreakerLayer, FailoverArgs, FailoverReason};
pub use circuit::Circuit;
pub use config::BreakerConfig;
pub use context::BreakerContext;
pub use error::{BreakerError, TransitionError};
pub use event::{BreakerEvent, EventListener};
pub use recorder::{Metrics, MetricsRecorder};
pub use state::CircuitState;
pub use strategy::{DefaultStrategy, Strategy};

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
pub(crate) mod testing;
