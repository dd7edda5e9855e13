//! Documents in, analysis results out.
//!
//! These types carry a paper through the pipeline: the [`Document`] the
//! caller supplies, the per-facet [`FacetOutcome`]s, and the assembled
//! [`AnalysisResult`].

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::facet::Facet;
use super::judge::JudgeVerdict;
use super::message::TokenUsage;
use crate::error::FailureKind;

/// A research paper to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Paper title.
    pub title: String,
    /// Link to the paper (informational only).
    #[serde(default)]
    pub link: String,
    /// Paper abstract. Feed entries often call this `summary`.
    #[serde(rename = "abstract", alias = "summary")]
    pub abstract_text: String,
}

impl Document {
    /// Creates a document.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        abstract_text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            abstract_text: abstract_text.into(),
        }
    }
}

/// Outcome of one facet for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FacetOutcome {
    /// The facet produced text.
    Completed {
        /// Generated text.
        text: String,
        /// Parsed verdict (judge facet only).
        #[serde(skip_serializing_if = "Option::is_none")]
        verdict: Option<JudgeVerdict>,
    },
    /// The facet failed; siblings are unaffected.
    Failed {
        /// Failure classification.
        kind: FailureKind,
        /// Error message.
        reason: String,
    },
}

impl FacetOutcome {
    /// Generated text, if the facet completed.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Completed { text, .. } => Some(text),
            Self::Failed { .. } => None,
        }
    }

    /// Whether the facet completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Overall status of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Every requested facet completed.
    Complete,
    /// The summary completed but at least one dependent facet failed.
    PartiallyFailed,
    /// The summary failed; nothing else ran.
    Failed,
}

impl AnalysisStatus {
    /// Status name as used in JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::PartiallyFailed => "partially_failed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one document inside the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// Waiting for the summary facet.
    PendingSummary,
    /// Summary available, dependents not yet dispatched.
    SummaryReady,
    /// Dependent facets in flight.
    FacetsRunning,
    /// Terminal: every facet completed.
    Complete,
    /// Terminal: summary completed, some dependents failed.
    PartiallyFailed,
    /// Terminal: summary failed.
    Failed,
}

impl DocumentState {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::PartiallyFailed | Self::Failed)
    }
}

impl From<AnalysisStatus> for DocumentState {
    fn from(status: AnalysisStatus) -> Self {
        match status {
            AnalysisStatus::Complete => Self::Complete,
            AnalysisStatus::PartiallyFailed => Self::PartiallyFailed,
            AnalysisStatus::Failed => Self::Failed,
        }
    }
}

impl std::fmt::Display for DocumentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PendingSummary => "pending_summary",
            Self::SummaryReady => "summary_ready",
            Self::FacetsRunning => "facets_running",
            Self::Complete => "complete",
            Self::PartiallyFailed => "partially_failed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Assembled analysis of one document.
///
/// Facet outcomes are flattened into the top level under their output
/// keys (`summary`, `key_findings`, ..., `evaluation`).
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Paper title.
    pub title: String,
    /// Paper link.
    pub link: String,
    /// Abstract the analysis was computed from.
    pub original_abstract: String,
    /// Overall status.
    pub status: AnalysisStatus,
    /// Outcome per facet. Facets never attempted are absent.
    #[serde(flatten)]
    pub facets: BTreeMap<Facet, FacetOutcome>,
    /// Summary failure reason when `status` is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Total tokens consumed across all facets.
    pub usage: TokenUsage,
    /// Total elapsed time.
    #[serde(serialize_with = "serialize_duration")]
    pub elapsed: Duration,
}

impl AnalysisResult {
    /// Outcome for `facet`, if it was attempted.
    #[must_use]
    pub fn outcome(&self, facet: Facet) -> Option<&FacetOutcome> {
        self.facets.get(&facet)
    }

    /// Generated text for `facet`, if it completed.
    #[must_use]
    pub fn text(&self, facet: Facet) -> Option<&str> {
        self.outcome(facet).and_then(FacetOutcome::text)
    }

    /// Judge verdict, if the judge facet completed.
    #[must_use]
    pub fn verdict(&self) -> Option<&JudgeVerdict> {
        match self.outcome(Facet::Judge) {
            Some(FacetOutcome::Completed { verdict, .. }) => verdict.as_ref(),
            _ => None,
        }
    }

    /// Facets that failed.
    #[must_use]
    pub fn failed_facets(&self) -> Vec<Facet> {
        self.facets
            .iter()
            .filter(|(_, o)| !o.is_completed())
            .map(|(f, _)| *f)
            .collect()
    }

    /// Whether every attempted facet completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == AnalysisStatus::Complete
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_duration<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_f64(d.as_secs_f64())
}
