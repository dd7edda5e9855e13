//! Structured analysis events.
//!
//! The coordinator and adapter report progress through an explicit
//! [`AnalysisObserver`] rather than a process-wide logger. The default
//! [`TracingObserver`] forwards every event to `tracing`.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::facet::Facet;
use crate::agent::analysis::{AnalysisStatus, DocumentState};
use crate::error::FailureKind;

/// A progress event emitted while analyzing documents.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    /// A document entered the pipeline.
    DocumentStarted {
        /// Position in the batch (0 for single-document calls).
        index: usize,
        /// Document title.
        title: String,
    },
    /// A document moved to a new state.
    StateChanged {
        /// Document title.
        title: String,
        /// The state just entered.
        state: DocumentState,
    },
    /// A facet agent was invoked.
    FacetStarted {
        /// Facet being computed.
        facet: Facet,
    },
    /// A facet agent produced its output.
    FacetCompleted {
        /// Facet that completed.
        facet: Facet,
        /// Wall time including rate-limit waits.
        elapsed: Duration,
    },
    /// A facet agent failed.
    FacetFailed {
        /// Facet that failed.
        facet: Facet,
        /// Failure classification.
        kind: FailureKind,
        /// Error message.
        reason: String,
    },
    /// A streamed text fragment arrived.
    Fragment {
        /// Agent that issued the call.
        agent: String,
        /// Fragment text, exactly as received.
        text: String,
    },
    /// A document left the pipeline.
    DocumentFinished {
        /// Document title.
        title: String,
        /// Final status.
        status: AnalysisStatus,
        /// Total wall time.
        elapsed: Duration,
    },
}

/// Receives [`AnalysisEvent`]s as they happen.
///
/// Called from concurrently running facet tasks, so implementations must
/// be cheap and thread-safe.
pub trait AnalysisObserver: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: &AnalysisEvent);
}

/// Observer that logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn on_event(&self, event: &AnalysisEvent) {
        match event {
            AnalysisEvent::DocumentStarted { index, title } => {
                info!(index, title, "processing paper");
            }
            AnalysisEvent::StateChanged { title, state } => {
                debug!(title, state = %state, "document state changed");
            }
            AnalysisEvent::FacetStarted { facet } => {
                debug!(facet = facet.key(), agent = facet.agent_name(), "facet started");
            }
            AnalysisEvent::FacetCompleted { facet, elapsed } => {
                debug!(
                    facet = facet.key(),
                    elapsed_ms = elapsed.as_millis(),
                    "facet completed"
                );
            }
            AnalysisEvent::FacetFailed {
                facet,
                kind,
                reason,
            } => {
                warn!(facet = facet.key(), kind = %kind, reason, "facet failed");
            }
            AnalysisEvent::Fragment { agent, text } => {
                trace!(agent, len = text.len(), "stream fragment");
            }
            AnalysisEvent::DocumentFinished {
                title,
                status,
                elapsed,
            } => {
                info!(
                    title,
                    status = %status,
                    elapsed_ms = elapsed.as_millis(),
                    "finished paper"
                );
            }
        }
    }
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl AnalysisObserver for NullObserver {
    fn on_event(&self, _event: &AnalysisEvent) {}
}
