// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{Debug, Formatter};
use std::pin::Pin;
use std::sync::Arc;

use super::FailoverArgs;

pub(crate) type FailoverFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// The secondary target of a breaker, stored type-erased so it can be shared across calls.
pub(crate) struct Failover<In, T, E>(Arc<dyn Fn(In, FailoverArgs) -> FailoverFuture<T, E> + Send + Sync>);

impl<In, T, E> Failover<In, T, E> {
    pub(crate) fn new<F>(failover: F) -> Self
    where
        F: Fn(In, FailoverArgs) -> FailoverFuture<T, E> + Send + Sync + 'static,
    {
        Self(Arc::new(failover))
    }

    pub(crate) fn call(&self, input: In, args: FailoverArgs) -> FailoverFuture<T, E> {
        (self.0)(input, args)
    }
}

impl<In, T, E> Clone for Failover<In, T, E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<In, T, E> Debug for Failover<In, T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Failover").finish()
    }
}
