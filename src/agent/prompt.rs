//! System prompts and template builders for facet agents.
//!
//! Prompts are the instructions that define each facet's behavior.
//! Template builders format user messages for facets that need more than
//! a single input text.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::facet::Facet;

/// System prompt for the summary facet.
pub const SUMMARY_SYSTEM_PROMPT: &str = "Provide a concise summary of the research paper:";

/// System prompt for the key findings facet.
pub const KEY_FINDINGS_SYSTEM_PROMPT: &str =
    "List the main findings and conclusions in bullet points:";

/// System prompt for the trends facet.
pub const TRENDS_SYSTEM_PROMPT: &str = "Analyze current and emerging research trends:";

/// System prompt for the advantages/disadvantages facet.
pub const ADVANTAGES_DISADVANTAGES_SYSTEM_PROMPT: &str = "Critically evaluate the strengths and limitations of this research paper in bullet points:";

/// System prompt for the related work facet.
pub const RELATED_WORK_SYSTEM_PROMPT: &str =
    "Explain how this paper situates itself in the broader research landscape:";

/// System prompt for the code implementation facet.
pub const CODE_IMPLEMENTATION_SYSTEM_PROMPT: &str =
    "Suggest algorithms, pseudocode, or implementation ideas based on the paper:";

/// System prompt for the citations facet.
pub const CITATIONS_REFERENCES_SYSTEM_PROMPT: &str =
    "List important cited works or related papers with context:";

/// System prompt for the future work facet.
pub const RECOMMENDATION_SYSTEM_PROMPT: &str = "Suggest future research directions:";

/// System prompt for the judge facet.
pub const JUDGE_SYSTEM_PROMPT: &str = "You are an impartial evaluator of AI-generated text.";

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/paper-analyzer/prompts";

/// Compiled-in system prompt for `facet`.
#[must_use]
pub const fn default_prompt(facet: Facet) -> &'static str {
    match facet {
        Facet::Summary => SUMMARY_SYSTEM_PROMPT,
        Facet::KeyFindings => KEY_FINDINGS_SYSTEM_PROMPT,
        Facet::Trends => TRENDS_SYSTEM_PROMPT,
        Facet::AdvantagesDisadvantages => ADVANTAGES_DISADVANTAGES_SYSTEM_PROMPT,
        Facet::RelatedWork => RELATED_WORK_SYSTEM_PROMPT,
        Facet::CodeImplementation => CODE_IMPLEMENTATION_SYSTEM_PROMPT,
        Facet::CitationsReferences => CITATIONS_REFERENCES_SYSTEM_PROMPT,
        Facet::Recommendation => RECOMMENDATION_SYSTEM_PROMPT,
        Facet::Judge => JUDGE_SYSTEM_PROMPT,
    }
}

/// A set of system prompts for all facets.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults. Use [`PromptSet::load`] to resolve the prompt
/// directory from configuration, the environment, or the default path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    prompts: BTreeMap<Facet, String>,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument
    /// 2. `PAPER_PROMPT_DIR` environment variable
    /// 3. `~/.config/paper-analyzer/prompts/`
    ///
    /// Each file is loaded independently; a missing or blank file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var("PAPER_PROMPT_DIR").ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let prompts = Facet::ALL
            .into_iter()
            .map(|facet| {
                let text = resolved_dir
                    .as_ref()
                    .map(|dir| dir.join(facet.spec().prompt_file))
                    .and_then(|path| std::fs::read_to_string(&path).ok())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| default_prompt(facet).to_string());
                (facet, text)
            })
            .collect();

        Self { prompts }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            prompts: Facet::ALL
                .into_iter()
                .map(|f| (f, default_prompt(f).to_string()))
                .collect(),
        }
    }

    /// System prompt for `facet`.
    #[must_use]
    pub fn get(&self, facet: Facet) -> &str {
        self.prompts
            .get(&facet)
            .map_or_else(|| default_prompt(facet), String::as_str)
    }

    /// Replaces the prompt for one facet.
    #[must_use]
    pub fn with_prompt(mut self, facet: Facet, prompt: impl Into<String>) -> Self {
        self.prompts.insert(facet, prompt.into());
        self
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for facet in Facet::ALL {
            let path = dir.join(facet.spec().prompt_file);
            if !path.exists() {
                std::fs::write(&path, default_prompt(facet))?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Builds the user message for the judge facet.
#[must_use]
pub fn build_judge_prompt(original_text: &str, generated_summary: &str) -> String {
    format!(
        "You are an expert judge evaluating a text summarization system.\n\n\
         Original Text:\n{original_text}\n\n\
         Generated Summary:\n{generated_summary}\n\n\
         Evaluate the Generated Summary on the following two metrics (0-5 score):\n\n\
         1. Faithfulness: Does the summary strictly adhere to the original text without adding false information?\n\
         2. Clarity: Is the summary easy to read, coherent, and well-structured?\n\n\
         Return your response in this JSON format ONLY:\n\
         {{\n\
         \x20   \"faithfulness_score\": <int>,\n\
         \x20   \"faithfulness_reasoning\": \"<string>\",\n\
         \x20   \"clarity_score\": <int>,\n\
         \x20   \"clarity_reasoning\": \"<string>\"\n\
         }}"
    )
}
