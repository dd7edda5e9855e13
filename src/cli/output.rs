//! Output formatting for CLI commands.
//!
//! Text output is for humans; JSON output serializes the library types
//! directly.

#![allow(clippy::format_push_string)]

use serde::Serialize;

use crate::agent::analysis::{AnalysisResult, FacetOutcome};
use crate::agent::facet::Facet;
use crate::agent::judge::JudgeVerdict;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name, falling back to text for anything unknown.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

fn heading(facet: Facet) -> &'static str {
    match facet {
        Facet::Summary => "Summary",
        Facet::KeyFindings => "Key Findings",
        Facet::Trends => "Trends",
        Facet::AdvantagesDisadvantages => "Advantages & Disadvantages",
        Facet::RelatedWork => "Related Work",
        Facet::CodeImplementation => "Code Implementations",
        Facet::CitationsReferences => "Citations & References",
        Facet::Recommendation => "Future Work",
        Facet::Judge => "Evaluation",
    }
}

/// Renders one analysis as text.
#[must_use]
pub fn format_analysis(result: &AnalysisResult) -> String {
    let mut output = format!("# {}\n", result.title);
    if !result.link.is_empty() {
        output.push_str(&format!("{}\n", result.link));
    }
    output.push_str(&format!("Status: {}\n", result.status));
    if let Some(error) = &result.error {
        output.push_str(&format!("Error: {error}\n"));
    }

    for (facet, outcome) in &result.facets {
        output.push_str(&format!("\n## {}\n", heading(*facet)));
        match outcome {
            FacetOutcome::Completed {
                verdict: Some(verdict),
                ..
            } => output.push_str(&format_verdict(verdict)),
            FacetOutcome::Completed { text, .. } => {
                output.push_str(text);
                output.push('\n');
            }
            FacetOutcome::Failed { kind, reason } => {
                output.push_str(&format!("[failed: {kind}] {reason}\n"));
            }
        }
    }

    output.push_str(&format!(
        "\n---\nTokens: {} | Time: {:.1}s\n",
        result.usage.total_tokens,
        result.elapsed.as_secs_f64()
    ));
    output
}

/// Renders a batch of analyses as text.
#[must_use]
pub fn format_analyses(results: &[AnalysisResult]) -> String {
    results
        .iter()
        .map(format_analysis)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders a judge verdict as text.
#[must_use]
pub fn format_verdict(verdict: &JudgeVerdict) -> String {
    format!(
        "Faithfulness: {}/5 - {}\nClarity: {}/5 - {}\n",
        verdict.faithfulness_score,
        verdict.faithfulness_reasoning,
        verdict.clarity_score,
        verdict.clarity_reasoning
    )
}
