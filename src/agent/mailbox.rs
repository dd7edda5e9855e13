//! Mailbox transport for agents.
//!
//! A [`MailboxAgent`] owns a FIFO inbox drained by one worker task. Each
//! message carries its own reply channel, so callers can await the answer
//! while the worker processes messages strictly in arrival order.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use super::facet::Facet;
use super::traits::{Agent, FacetInput, FacetOutput};
use crate::error::AgentError;

/// Default inbox capacity.
pub const DEFAULT_CAPACITY: usize = 32;

/// Address of an agent on the mailbox transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentIdentity {
    /// Agent name.
    pub name: String,
}

impl AgentIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// One message in an agent's inbox.
#[derive(Debug)]
pub struct Envelope {
    /// Sender.
    pub from: AgentIdentity,
    /// Input to process.
    pub input: FacetInput,
    /// Where the result goes.
    pub reply: oneshot::Sender<Result<FacetOutput, AgentError>>,
}

/// Agent reachable through a FIFO inbox.
///
/// Dropping every handle closes the inbox and stops the worker after it
/// finishes the messages already queued.
#[derive(Debug, Clone)]
pub struct MailboxAgent {
    identity: AgentIdentity,
    facet: Facet,
    sender: mpsc::Sender<Envelope>,
}

impl MailboxAgent {
    /// Wraps `inner` behind an inbox and spawns its worker.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] when called outside a Tokio
    /// runtime.
    pub fn spawn(inner: Arc<dyn Agent>, capacity: usize) -> Result<Self, AgentError> {
        let handle =
            tokio::runtime::Handle::try_current().map_err(|e| AgentError::Orchestration {
                message: format!("mailbox agent needs a Tokio runtime: {e}"),
            })?;

        let identity = AgentIdentity::new(inner.name());
        let facet = inner.facet();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        handle.spawn(worker(identity.clone(), inner, rx));

        Ok(Self {
            identity,
            facet,
            sender: tx,
        })
    }

    /// This agent's address.
    #[must_use]
    pub const fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    /// Enqueues `input` and returns the channel the reply will arrive on.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] if the worker has stopped.
    pub async fn send_message(
        &self,
        from: AgentIdentity,
        input: FacetInput,
    ) -> Result<oneshot::Receiver<Result<FacetOutput, AgentError>>, AgentError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(Envelope { from, input, reply })
            .await
            .map_err(|_| AgentError::Orchestration {
                message: format!("{} inbox is closed", self.identity),
            })?;
        Ok(rx)
    }
}

#[async_trait]
impl Agent for MailboxAgent {
    fn name(&self) -> &str {
        &self.identity.name
    }

    fn facet(&self) -> Facet {
        self.facet
    }

    async fn process(&self, input: &FacetInput) -> Result<FacetOutput, AgentError> {
        let rx = self
            .send_message(AgentIdentity::new("Coordinator"), input.clone())
            .await?;
        rx.await.map_err(|_| AgentError::Orchestration {
            message: format!("{} dropped the reply", self.identity),
        })?
    }
}

async fn worker(
    identity: AgentIdentity,
    inner: Arc<dyn Agent>,
    mut rx: mpsc::Receiver<Envelope>,
) {
    debug!(agent = %identity, "mailbox worker started");
    while let Some(envelope) = rx.recv().await {
        trace!(agent = %identity, from = %envelope.from, "received message");
        let result = inner.process(&envelope.input).await;
        // Receiver gone means the caller stopped waiting.
        let _ = envelope.reply.send(result);
    }
    debug!(agent = %identity, "mailbox worker stopped");
}
