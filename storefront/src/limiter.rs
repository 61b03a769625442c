//! Request limiter: bounds concurrent outbound calls and queues the rest FIFO.
//!
//! Backed by tokio's fair [`Semaphore`], so permits are handed out in the order callers
//! asked for them and each completion (success or failure) admits the next queued caller.
//! The queue is unbounded and has no timeout: a request that never completes holds its
//! slot forever.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Semaphore, TryAcquireError};
use tracing::debug;

use crate::error::ApiError;

/// Default ceiling of concurrent upstream requests.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Increments a counter for its lifetime.
struct CountGuard<'a>(&'a AtomicUsize);

impl<'a> CountGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for CountGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Concurrency ceiling shared by every fetch of one `SettingsClient`.
#[derive(Debug)]
pub struct RequestLimiter {
    semaphore: Semaphore,
    max_concurrent: usize,
    in_flight: AtomicUsize,
    queued: AtomicUsize,
}

impl Default for RequestLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

impl RequestLimiter {
    /// `max_concurrent` of 0 is raised to 1.
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Semaphore::new(max_concurrent),
            max_concurrent,
            in_flight: AtomicUsize::new(0),
            queued: AtomicUsize::new(0),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Requests currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Callers waiting for a slot.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Runs `request` once a slot is free. Queued callers are admitted in submission order.
    pub async fn execute<F, Fut, T>(&self, request: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let _permit = match self.semaphore.try_acquire() {
            Ok(permit) => permit,
            Err(TryAcquireError::Closed) => return Err(ApiError::LimiterClosed),
            Err(TryAcquireError::NoPermits) => {
                let _waiting = CountGuard::new(&self.queued);
                debug!(
                    in_flight = self.in_flight(),
                    queued = self.queued(),
                    "request limiter at capacity, queuing"
                );
                self.semaphore
                    .acquire()
                    .await
                    .map_err(|_| ApiError::LimiterClosed)?
            }
        };
        let _running = CountGuard::new(&self.in_flight);
        request().await
    }

    /// Rejects queued and future callers with [`ApiError::LimiterClosed`].
    pub fn close(&self) {
        self.semaphore.close();
    }
}
