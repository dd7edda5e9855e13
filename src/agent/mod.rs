//! Multi-facet paper analysis.
//!
//! A summary agent condenses each abstract first; the summary then fans
//! out to the dependent facet agents, which run concurrently under a
//! shared fixed-delay rate limiter. Uses a pluggable provider abstraction
//! backed by OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! Document → Coordinator
//!   ├── SummaryAgent (abstract → summary)
//!   ├── Fan-out → dependent facet agents (summary → text)
//!   │   ├── KeyFindings, Trends, AdvantagesDisadvantages, RelatedWork
//!   │   ├── CodeImplementation, CitationsReferences, Recommendation
//!   │   └── Judge (abstract + summary → JudgeVerdict)
//!   └── Assemble by facet key → AnalysisResult
//! ```
//!
//! Every agent call goes through [`RateLimiter`] and then
//! [`CompletionAdapter`], which runs either a batch or a streaming request.

pub mod adapter;
pub mod analysis;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod events;
pub mod facet;
pub mod facet_agent;
pub mod judge;
pub mod mailbox;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod rate_limit;
pub mod traits;

// Re-export key types
pub use adapter::{Completion, CompletionAdapter, CompletionOptions};
pub use analysis::{AnalysisResult, AnalysisStatus, Document, DocumentState, FacetOutcome};
pub use client::create_provider;
pub use config::{AgentConfig, DispatchMode};
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use credentials::CredentialResolver;
pub use events::{AnalysisEvent, AnalysisObserver, NullObserver, TracingObserver};
pub use facet::{Facet, FacetSpec, InputSelector};
pub use facet_agent::FacetAgent;
pub use judge::{JudgeVerdict, parse_verdict};
pub use mailbox::{AgentIdentity, MailboxAgent};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use prompt::PromptSet;
pub use provider::{FragmentStream, LlmProvider};
pub use rate_limit::RateLimiter;
pub use traits::{Agent, FacetInput, FacetOutput};
