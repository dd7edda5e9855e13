//! Summary quality verdicts.
//!
//! The judge facet asks the model for a JSON object scoring the summary
//! against the abstract. Responses are parsed strictly: anything that is
//! not a well-formed verdict with scores in `0..=5` is a validation error.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Highest score either metric may take.
pub const MAX_SCORE: u8 = 5;

/// First `{` through last `}` of a response.
static JSON_OBJECT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").ok());

/// Faithfulness and clarity scores for one summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    /// Does the summary stay true to the abstract (0-5).
    pub faithfulness_score: u8,
    /// Explanation of the faithfulness score.
    pub faithfulness_reasoning: String,
    /// Is the summary readable and well-structured (0-5).
    pub clarity_score: u8,
    /// Explanation of the clarity score.
    pub clarity_reasoning: String,
}

impl JudgeVerdict {
    /// Renders the verdict as a pretty-printed JSON string.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Parses a judge response into a [`JudgeVerdict`].
///
/// Accepts bare JSON, JSON inside a markdown code block, or JSON
/// surrounded by prose.
///
/// # Errors
///
/// Returns [`AgentError::Validation`] if no JSON object is found, a field
/// is missing or mistyped, a score exceeds [`MAX_SCORE`], or a reasoning
/// string is blank.
pub fn parse_verdict(content: &str) -> Result<JudgeVerdict, AgentError> {
    let trimmed = content.trim();

    // Handle markdown code blocks
    let unfenced = if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    };

    let json_str = JSON_OBJECT
        .as_ref()
        .and_then(|re| re.find(unfenced))
        .map(|m| m.as_str())
        .ok_or_else(|| invalid("no JSON object in judge response", content))?;

    let verdict: JudgeVerdict = serde_json::from_str(json_str)
        .map_err(|e| invalid(&format!("failed to parse judge verdict: {e}"), content))?;

    for (name, score) in [
        ("faithfulness_score", verdict.faithfulness_score),
        ("clarity_score", verdict.clarity_score),
    ] {
        if score > MAX_SCORE {
            return Err(invalid(
                &format!("{name} {score} is outside 0-{MAX_SCORE}"),
                content,
            ));
        }
    }
    for (name, text) in [
        ("faithfulness_reasoning", &verdict.faithfulness_reasoning),
        ("clarity_reasoning", &verdict.clarity_reasoning),
    ] {
        if text.trim().is_empty() {
            return Err(invalid(&format!("{name} is empty"), content));
        }
    }

    Ok(verdict)
}

fn invalid(message: &str, content: &str) -> AgentError {
    AgentError::Validation {
        message: message.to_string(),
        content: content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const VALID: &str = r#"{
        "faithfulness_score": 4,
        "faithfulness_reasoning": "Mostly grounded in the abstract.",
        "clarity_score": 5,
        "clarity_reasoning": "Clear and well organized."
    }"#;

    #[test]
    fn test_parse_bare_json() {
        let verdict = parse_verdict(VALID).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(verdict.faithfulness_score, 4);
        assert_eq!(verdict.clarity_score, 5);
        assert_eq!(verdict.clarity_reasoning, "Clear and well organized.");
    }

    #[test]
    fn test_parse_code_block() {
        let fenced = format!("```json\n{VALID}\n```");
        assert!(parse_verdict(&fenced).is_ok());
    }

    #[test]
    fn test_parse_surrounding_prose() {
        let wrapped = format!("Here is my evaluation:\n{VALID}\nHope this helps.");
        let verdict = parse_verdict(&wrapped).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(verdict.faithfulness_score, 4);
    }

    #[test]
    fn test_no_json_is_validation_error() {
        let err = parse_verdict("The summary is great.").err();
        assert!(matches!(err, Some(AgentError::Validation { .. })));
    }

    #[test]
    fn test_missing_field_is_validation_error() {
        let json = r#"{"faithfulness_score": 3, "faithfulness_reasoning": "ok", "clarity_score": 3}"#;
        let err = parse_verdict(json).err();
        assert!(matches!(err, Some(AgentError::Validation { .. })));
    }

    #[test]
    fn test_blank_reasoning_rejected() {
        let json = r#"{"faithfulness_score": 3, "faithfulness_reasoning": "  ",
                       "clarity_score": 3, "clarity_reasoning": "fine"}"#;
        let err = parse_verdict(json).err();
        assert!(matches!(err, Some(AgentError::Validation { .. })));
    }

    #[test]
    fn test_validation_keeps_raw_content() {
        let raw = "not json at all";
        match parse_verdict(raw) {
            Err(AgentError::Validation { content, .. }) => assert_eq!(content, raw),
            other => unreachable!("unexpected {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn prop_score_range_enforced(faith in 0u8..=20, clarity in 0u8..=20) {
            let json = format!(
                r#"{{"faithfulness_score": {faith}, "faithfulness_reasoning": "r",
                     "clarity_score": {clarity}, "clarity_reasoning": "r"}}"#
            );
            let result = parse_verdict(&json);
            let in_range = faith <= MAX_SCORE && clarity <= MAX_SCORE;
            prop_assert_eq!(result.is_ok(), in_range);
        }
    }
}
