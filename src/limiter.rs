//! Counting admission gate for upstream calls
//!
//! [`ConcurrencyLimiter`] bounds how many guarded operations may be in flight
//! at once. A [`Permit`] returns its slot when released or dropped, so every
//! exit path of the guarded operation (including errors and cancellation)
//! restores capacity.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Fixed-capacity limiter shared across tasks
///
/// Cloning is cheap; clones share the same permits.
#[derive(Clone, Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One unit of admission capacity
///
/// Dropping the permit releases it.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct Permit {
    _inner: OwnedSemaphorePermit,
}

impl Permit {
    /// Return the permit to its limiter
    pub fn release(self) {}
}

impl ConcurrencyLimiter {
    /// Create a limiter admitting at most `capacity` concurrent holders
    ///
    /// A capacity of zero is raised to one so acquisition cannot deadlock.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until a permit is free and take it
    ///
    /// Fails only if the underlying semaphore has been closed.
    pub async fn acquire(&self) -> Result<Permit, AcquireError> {
        let inner = self.semaphore.clone().acquire_owned().await?;
        Ok(Permit { _inner: inner })
    }

    /// Run `operation` while holding a permit
    ///
    /// The permit is released when the operation completes, fails, or is
    /// cancelled. A closed gate surfaces as the operation's own error type and
    /// the operation is never started.
    pub async fn run<F, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<AcquireError>,
    {
        let _permit = match self.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!(error = %e, "admission gate closed");
                return Err(E::from(e));
            }
        };
        operation.await
    }

    /// Total number of permits
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
