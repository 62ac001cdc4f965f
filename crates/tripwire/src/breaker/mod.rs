// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The breaker service and its builder.

mod args;
mod callbacks;
mod layer;
mod service;

pub use args::{FailoverArgs, FailoverReason};
pub(crate) use callbacks::Failover;
pub use layer::BreakerLayer;
pub(crate) use service::BreakerShared;
pub use service::{Breaker, BreakerFuture};
