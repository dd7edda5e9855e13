//! The facet table.
//!
//! Each facet is one row: agent name, output key, input selector and
//! whether the provider is asked for JSON. Facets are data, not types;
//! every row is executed by the same [`FacetAgent`](super::facet_agent::FacetAgent).

use serde::{Serialize, Serializer};

/// One analysis facet.
///
/// Declaration order is the canonical assembly order of an
/// [`AnalysisResult`](super::analysis::AnalysisResult). Serializes as its
/// output key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Facet {
    /// Concise summary of the abstract. Input to every other facet.
    Summary,
    /// Main findings and conclusions.
    KeyFindings,
    /// Current and emerging research trends.
    Trends,
    /// Strengths and limitations.
    AdvantagesDisadvantages,
    /// Position in the broader research landscape.
    RelatedWork,
    /// Algorithms, pseudocode and implementation ideas.
    CodeImplementation,
    /// Important cited works.
    CitationsReferences,
    /// Future research directions.
    Recommendation,
    /// Quality judgment of the summary against the abstract.
    Judge,
}

/// What a facet consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSelector {
    /// The document abstract.
    Document,
    /// The summary text.
    Summary,
    /// The abstract and the summary together.
    SourceAndSummary,
}

/// Static description of a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetSpec {
    /// The facet this row describes.
    pub facet: Facet,
    /// Agent name used in logs and mailbox addressing.
    pub agent_name: &'static str,
    /// Field name in the analysis result.
    pub output_key: &'static str,
    /// Prompt template filename under the prompt directory.
    pub prompt_file: &'static str,
    /// Input the facet consumes.
    pub input: InputSelector,
    /// Ask the provider for a JSON object.
    pub json_mode: bool,
}

const FACETS: [FacetSpec; 9] = [
    FacetSpec {
        facet: Facet::Summary,
        agent_name: "SummaryAgent",
        output_key: "summary",
        prompt_file: "summary.md",
        input: InputSelector::Document,
        json_mode: false,
    },
    FacetSpec {
        facet: Facet::KeyFindings,
        agent_name: "KeyFindingsAgent",
        output_key: "key_findings",
        prompt_file: "key_findings.md",
        input: InputSelector::Summary,
        json_mode: false,
    },
    FacetSpec {
        facet: Facet::Trends,
        agent_name: "TrendsAgent",
        output_key: "trends",
        prompt_file: "trends.md",
        input: InputSelector::Summary,
        json_mode: false,
    },
    FacetSpec {
        facet: Facet::AdvantagesDisadvantages,
        agent_name: "AdvantagesDisadvantagesAgent",
        output_key: "advantages_disadvantages",
        prompt_file: "advantages_disadvantages.md",
        input: InputSelector::Summary,
        json_mode: false,
    },
    FacetSpec {
        facet: Facet::RelatedWork,
        agent_name: "RelatedWorkAgent",
        output_key: "related_work",
        prompt_file: "related_work.md",
        input: InputSelector::Summary,
        json_mode: false,
    },
    FacetSpec {
        facet: Facet::CodeImplementation,
        agent_name: "CodeImplementationAgent",
        output_key: "code_implementations",
        prompt_file: "code_implementations.md",
        input: InputSelector::Summary,
        json_mode: false,
    },
    FacetSpec {
        facet: Facet::CitationsReferences,
        agent_name: "CitationsReferencesAgent",
        output_key: "citations_references",
        prompt_file: "citations_references.md",
        input: InputSelector::Summary,
        json_mode: false,
    },
    FacetSpec {
        facet: Facet::Recommendation,
        agent_name: "RecommendationAgent",
        output_key: "future_work",
        prompt_file: "future_work.md",
        input: InputSelector::Summary,
        json_mode: false,
    },
    FacetSpec {
        facet: Facet::Judge,
        agent_name: "JudgeAgent",
        output_key: "evaluation",
        prompt_file: "judge.md",
        input: InputSelector::SourceAndSummary,
        json_mode: true,
    },
];

impl Facet {
    /// Every facet, in assembly order.
    pub const ALL: [Self; 9] = [
        Self::Summary,
        Self::KeyFindings,
        Self::Trends,
        Self::AdvantagesDisadvantages,
        Self::RelatedWork,
        Self::CodeImplementation,
        Self::CitationsReferences,
        Self::Recommendation,
        Self::Judge,
    ];

    /// Facets that consume the summary, in assembly order.
    pub const DEPENDENT: [Self; 8] = [
        Self::KeyFindings,
        Self::Trends,
        Self::AdvantagesDisadvantages,
        Self::RelatedWork,
        Self::CodeImplementation,
        Self::CitationsReferences,
        Self::Recommendation,
        Self::Judge,
    ];

    /// The table row for this facet.
    #[must_use]
    pub const fn spec(self) -> &'static FacetSpec {
        &FACETS[self as usize]
    }

    /// Field name in the analysis result.
    #[must_use]
    pub const fn key(self) -> &'static str {
        self.spec().output_key
    }

    /// Agent name.
    #[must_use]
    pub const fn agent_name(self) -> &'static str {
        self.spec().agent_name
    }

    /// Looks up a facet by its output key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl Serialize for Facet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
