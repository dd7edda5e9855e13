//! Fixed-delay pacing for provider calls.
//!
//! Every provider call waits on [`RateLimiter::wait_before_call`], the first
//! one included. Waits are scheduled on one shared timeline, so concurrent
//! callers start at least `call_interval` apart regardless of how many
//! facets or documents are in flight.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::AgentError;

/// Fixed-interval rate limiter shared by all agents.
#[derive(Debug)]
pub struct RateLimiter {
    call_interval: Duration,
    document_interval: Duration,
    last_slot: Mutex<Option<Instant>>,
    cancel: CancellationToken,
}

impl RateLimiter {
    /// Creates a limiter with the given per-call and per-document delays.
    #[must_use]
    pub fn new(call_interval: Duration, document_interval: Duration) -> Self {
        Self {
            call_interval,
            document_interval,
            last_slot: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a limiter that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Aborts pending and future waits when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Minimum spacing between provider calls.
    #[must_use]
    pub const fn call_interval(&self) -> Duration {
        self.call_interval
    }

    /// Delay between successive documents.
    #[must_use]
    pub const fn document_interval(&self) -> Duration {
        self.document_interval
    }

    /// Waits until the caller may issue its provider call.
    ///
    /// Reserves the next slot on the shared timeline: `call_interval` after
    /// the later of now and the previously reserved slot.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Cancelled`] if the cancellation token fires
    /// while waiting.
    pub async fn wait_before_call(&self) -> Result<Duration, AgentError> {
        if self.cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        if self.call_interval.is_zero() {
            return Ok(Duration::ZERO);
        }

        let now = Instant::now();
        let slot = {
            let mut last = self.last_slot.lock().unwrap_or_else(PoisonError::into_inner);
            let base = last.map_or(now, |prev| prev.max(now));
            let slot = base + self.call_interval;
            *last = Some(slot);
            slot
        };

        let wait = slot.saturating_duration_since(now);
        trace!(wait_ms = wait.as_millis(), "waiting for provider call slot");
        self.sleep_until(slot).await?;
        Ok(wait)
    }

    /// Waits the inter-document delay.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Cancelled`] if the cancellation token fires
    /// while waiting.
    pub async fn wait_between_documents(&self) -> Result<(), AgentError> {
        if self.cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        if self.document_interval.is_zero() {
            return Ok(());
        }
        trace!(
            wait_ms = self.document_interval.as_millis(),
            "waiting between documents"
        );
        self.sleep_until(Instant::now() + self.document_interval)
            .await
    }

    async fn sleep_until(&self, deadline: Instant) -> Result<(), AgentError> {
        tokio::select! {
            () = tokio::time::sleep_until(deadline) => Ok(()),
            () = self.cancel.cancelled() => Err(AgentError::Cancelled),
        }
    }
}
