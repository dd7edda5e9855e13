//! Coordinator for summary-first, fan-out facet analysis.
//!
//! Runs the pipeline for one document: summary → fan out dependent
//! facets concurrently → assemble results by facet key. Batches run
//! documents one at a time with the inter-document delay between them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::adapter::{CompletionAdapter, CompletionOptions};
use super::analysis::{AnalysisResult, AnalysisStatus, Document, DocumentState, FacetOutcome};
use super::config::{AgentConfig, DispatchMode};
use super::events::{AnalysisEvent, AnalysisObserver, TracingObserver};
use super::facet::{Facet, InputSelector};
use super::facet_agent::FacetAgent;
use super::judge::JudgeVerdict;
use super::mailbox::{DEFAULT_CAPACITY, MailboxAgent};
use super::message::TokenUsage;
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::rate_limit::RateLimiter;
use super::traits::{Agent, FacetInput, FacetOutput};
use crate::error::AgentError;

/// Builder for [`Coordinator`].
pub struct CoordinatorBuilder {
    provider: Arc<dyn LlmProvider>,
    config: AgentConfig,
    observer: Arc<dyn AnalysisObserver>,
    cancel: CancellationToken,
    prompts: Option<PromptSet>,
}

impl CoordinatorBuilder {
    /// Sets the observer that receives analysis events.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn AnalysisObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Shares an external cancellation token (e.g. tied to Ctrl-C).
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Uses `prompts` instead of loading them from [`AgentConfig::prompt_dir`].
    #[must_use]
    pub fn prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Builds the coordinator and its agents.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] if mailbox dispatch is
    /// requested outside a Tokio runtime.
    pub fn build(self) -> Result<Coordinator, AgentError> {
        let Self {
            provider,
            config,
            observer,
            cancel,
            prompts,
        } = self;
        let prompts = prompts.unwrap_or_else(|| PromptSet::load(config.prompt_dir.as_deref()));

        let limiter = Arc::new(
            RateLimiter::new(config.request_delay, config.document_delay)
                .with_cancellation(cancel.clone()),
        );
        let adapter = Arc::new(
            CompletionAdapter::new(provider, CompletionOptions::from_config(&config))
                .with_observer(Arc::clone(&observer))
                .with_cancellation(cancel.clone()),
        );

        let mut agents: BTreeMap<Facet, Arc<dyn Agent>> = BTreeMap::new();
        for agent in FacetAgent::all(&prompts, &adapter, &limiter) {
            let facet = agent.facet();
            let direct: Arc<dyn Agent> = Arc::new(agent);
            let agent: Arc<dyn Agent> = match config.dispatch {
                DispatchMode::Direct => direct,
                DispatchMode::Mailbox => Arc::new(MailboxAgent::spawn(direct, DEFAULT_CAPACITY)?),
            };
            agents.insert(facet, agent);
        }

        debug!(
            provider = adapter.provider_name(),
            model = %config.model,
            dispatch = ?config.dispatch,
            judge = config.judge,
            "coordinator ready"
        );

        Ok(Coordinator {
            agents,
            limiter,
            observer,
            cancel,
            config,
        })
    }
}

/// Drives facet agents over documents.
pub struct Coordinator {
    agents: BTreeMap<Facet, Arc<dyn Agent>>,
    limiter: Arc<RateLimiter>,
    observer: Arc<dyn AnalysisObserver>,
    cancel: CancellationToken,
    config: AgentConfig,
}

impl Coordinator {
    /// Starts building a coordinator over `provider`.
    #[must_use]
    pub fn builder(provider: Arc<dyn LlmProvider>, config: AgentConfig) -> CoordinatorBuilder {
        CoordinatorBuilder {
            provider,
            config,
            observer: Arc::new(TracingObserver),
            cancel: CancellationToken::new(),
            prompts: None,
        }
    }

    /// Creates a coordinator with default observer and prompts loaded
    /// from [`AgentConfig::prompt_dir`].
    ///
    /// # Errors
    ///
    /// See [`CoordinatorBuilder::build`].
    pub fn new(provider: Arc<dyn LlmProvider>, config: AgentConfig) -> Result<Self, AgentError> {
        Self::builder(provider, config).build()
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Token that stops limiter waits and in-flight calls.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Facets scheduled after the summary, in assembly order.
    #[must_use]
    pub fn scheduled_facets(&self) -> Vec<Facet> {
        Facet::DEPENDENT
            .into_iter()
            .filter(|f| self.config.judge || *f != Facet::Judge)
            .collect()
    }

    /// Analyzes one document.
    ///
    /// Never fails as a whole: facet errors are recorded in the result.
    pub async fn analyze_document(&self, document: &Document) -> AnalysisResult {
        self.analyze_at(0, document).await
    }

    /// Analyzes documents in input order, one at a time.
    ///
    /// Waits the inter-document delay before every document after the
    /// first. A failed document never stops the batch.
    pub async fn analyze_batch(&self, documents: &[Document]) -> Vec<AnalysisResult> {
        let mut results = Vec::with_capacity(documents.len());
        for (index, document) in documents.iter().enumerate() {
            if index > 0
                && let Err(e) = self.limiter.wait_between_documents().await
            {
                debug!(index, error = %e, "inter-document wait interrupted");
            }
            results.push(self.analyze_at(index, document).await);
        }
        results
    }

    /// Scores `summary` against `original` with the judge facet.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on provider failure or an invalid verdict.
    pub async fn judge(&self, original: &str, summary: &str) -> Result<JudgeVerdict, AgentError> {
        let agent = self.agent(Facet::Judge)?;
        let input = FacetInput::Evaluation {
            original: original.to_string(),
            summary: summary.to_string(),
        };
        let output = run_agent(agent, &input, &*self.observer).await?;
        output.verdict.ok_or_else(|| AgentError::Orchestration {
            message: "judge produced no verdict".to_string(),
        })
    }

    async fn analyze_at(&self, index: usize, document: &Document) -> AnalysisResult {
        let start = Instant::now();
        self.emit(AnalysisEvent::DocumentStarted {
            index,
            title: document.title.clone(),
        });
        self.transition(document, DocumentState::PendingSummary);

        let mut facets = BTreeMap::new();
        let mut usage = TokenUsage::default();

        let summary = match self.agent(Facet::Summary) {
            Ok(agent) => {
                run_agent(agent, &FacetInput::Document(document.clone()), &*self.observer).await
            }
            Err(e) => Err(e),
        };
        let summary = match summary {
            Ok(output) => output,
            Err(e) => {
                facets.insert(Facet::Summary, failed_outcome(&e));
                return self.finish(
                    document,
                    start,
                    AnalysisStatus::Failed,
                    facets,
                    Some(e.to_string()),
                    usage,
                );
            }
        };

        usage.accumulate(summary.usage);
        facets.insert(Facet::Summary, completed_outcome(summary.clone()));
        self.transition(document, DocumentState::SummaryReady);

        let scheduled = self.scheduled_facets();
        self.transition(document, DocumentState::FacetsRunning);
        let results = self.fan_out(&scheduled, document, &summary.text).await;

        let mut any_failed = false;
        for (facet, result) in scheduled.into_iter().zip(results) {
            let outcome = match result {
                Ok(output) => {
                    usage.accumulate(output.usage);
                    completed_outcome(output)
                }
                Err(e) => {
                    any_failed = true;
                    failed_outcome(&e)
                }
            };
            facets.insert(facet, outcome);
        }

        let status = if any_failed {
            AnalysisStatus::PartiallyFailed
        } else {
            AnalysisStatus::Complete
        };
        self.finish(document, start, status, facets, None, usage)
    }

    /// Runs `facets` concurrently; results come back in `facets` order.
    async fn fan_out(
        &self,
        facets: &[Facet],
        document: &Document,
        summary: &str,
    ) -> Vec<Result<FacetOutput, AgentError>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut handles: Vec<JoinHandle<Result<FacetOutput, AgentError>>> =
            Vec::with_capacity(facets.len());

        for &facet in facets {
            let agent = match self.agent(facet) {
                Ok(agent) => agent,
                Err(e) => {
                    handles.push(tokio::spawn(async move { Err(e) }));
                    continue;
                }
            };
            let input = select_input(facet.spec().input, document, summary);
            let sem = Arc::clone(&semaphore);
            let observer = Arc::clone(&self.observer);

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire().await.map_err(|e| AgentError::Orchestration {
                    message: format!("Semaphore acquire failed: {e}"),
                })?;
                run_agent(agent, &input, &*observer).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => results.push(Err(AgentError::Orchestration {
                    message: format!("Task join failed: {e}"),
                })),
            }
        }
        results
    }

    fn agent(&self, facet: Facet) -> Result<Arc<dyn Agent>, AgentError> {
        self.agents
            .get(&facet)
            .cloned()
            .ok_or_else(|| AgentError::Orchestration {
                message: format!("no agent registered for {facet}"),
            })
    }

    fn finish(
        &self,
        document: &Document,
        start: Instant,
        status: AnalysisStatus,
        facets: BTreeMap<Facet, FacetOutcome>,
        error: Option<String>,
        usage: TokenUsage,
    ) -> AnalysisResult {
        self.transition(document, DocumentState::from(status));
        let elapsed = start.elapsed();
        self.emit(AnalysisEvent::DocumentFinished {
            title: document.title.clone(),
            status,
            elapsed,
        });
        AnalysisResult {
            title: document.title.clone(),
            link: document.link.clone(),
            original_abstract: document.abstract_text.clone(),
            status,
            facets,
            error,
            usage,
            elapsed,
        }
    }

    fn transition(&self, document: &Document, state: DocumentState) {
        self.emit(AnalysisEvent::StateChanged {
            title: document.title.clone(),
            state,
        });
    }

    fn emit(&self, event: AnalysisEvent) {
        self.observer.on_event(&event);
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .field("limiter", &self.limiter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

async fn run_agent(
    agent: Arc<dyn Agent>,
    input: &FacetInput,
    observer: &dyn AnalysisObserver,
) -> Result<FacetOutput, AgentError> {
    let facet = agent.facet();
    let start = Instant::now();
    observer.on_event(&AnalysisEvent::FacetStarted { facet });

    let result = agent.process(input).await;
    match &result {
        Ok(_) => observer.on_event(&AnalysisEvent::FacetCompleted {
            facet,
            elapsed: start.elapsed(),
        }),
        Err(e) => observer.on_event(&AnalysisEvent::FacetFailed {
            facet,
            kind: e.kind(),
            reason: e.to_string(),
        }),
    }
    result
}

fn select_input(selector: InputSelector, document: &Document, summary: &str) -> FacetInput {
    match selector {
        InputSelector::Document => FacetInput::Document(document.clone()),
        InputSelector::Summary => FacetInput::Summary(summary.to_string()),
        InputSelector::SourceAndSummary => FacetInput::Evaluation {
            original: document.abstract_text.clone(),
            summary: summary.to_string(),
        },
    }
}

fn completed_outcome(output: FacetOutput) -> FacetOutcome {
    FacetOutcome::Completed {
        text: output.text,
        verdict: output.verdict,
    }
}

fn failed_outcome(error: &AgentError) -> FacetOutcome {
    FacetOutcome::Failed {
        kind: error.kind(),
        reason: error.to_string(),
    }
}
