//! Output parsing for model responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::chain::ChainError;
use crate::party::PartySummaries;

const JSON_FORMAT_INSTRUCTIONS: &str = r#"The output should be formatted as a JSON instance that conforms to the JSON schema below.

As an example, for the schema {"properties": {"foo": {"title": "Foo", "description": "a list of strings", "type": "array", "items": {"type": "string"}}}, "required": ["foo"]}
the object {"foo": ["bar", "baz"]} is a well-formatted instance of the schema. The object {"properties": {"foo": ["bar", "baz"]}} is not well-formatted.

Here is the output schema:
```
"#;

/// How raw model output is turned into an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputParser {
    /// Parse into [`PartySummaries`]; the prompt carries the JSON schema.
    #[default]
    Structured,
    /// Return model output verbatim.
    PlainText,
}

impl OutputParser {
    /// Instructions appended to the prompt, if any.
    pub fn format_instructions(&self) -> Option<String> {
        match self {
            OutputParser::Structured => {
                let schema = PartySummaries::json_schema().to_string();
                Some(format!("{JSON_FORMAT_INSTRUCTIONS}{schema}\n```"))
            }
            OutputParser::PlainText => None,
        }
    }

    /// Parses raw model output.
    pub fn parse(&self, raw: &str) -> Result<Answer, ParseError> {
        match self {
            OutputParser::Structured => {
                let json_str = extract_json(raw);
                let summaries: PartySummaries =
                    serde_json::from_str(json_str).map_err(|e| ParseError::InvalidJson {
                        reason: e.to_string(),
                        excerpt: json_str.chars().take(500).collect(),
                    })?;
                Ok(Answer::Structured(summaries))
            }
            OutputParser::PlainText => Ok(Answer::Text(raw.to_string())),
        }
    }

    /// The mode name used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputParser::Structured => "json",
            OutputParser::PlainText => "str",
        }
    }
}

impl FromStr for OutputParser {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputParser::Structured),
            "str" => Ok(OutputParser::PlainText),
            _ => Err(ChainError::InvalidArgument(
                "output_parser must be 'json' or 'str'".to_string(),
            )),
        }
    }
}

impl fmt::Display for OutputParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Structured(PartySummaries),
    Text(String),
}

impl Answer {
    /// The plain-text answer, if the chain ran in plain-text mode.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            Answer::Structured(_) => None,
        }
    }

    /// The per-party answer, if the chain ran in structured mode.
    pub fn as_structured(&self) -> Option<&PartySummaries> {
        match self {
            Answer::Structured(summaries) => Some(summaries),
            Answer::Text(_) => None,
        }
    }
}

/// Errors raised while parsing model output.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Model output is not a valid party summary: {reason}. Output: {excerpt}")]
    InvalidJson { reason: String, excerpt: String },
}

/// Extracts JSON from a response that might be wrapped in markdown code blocks.
///
/// Takes the body of the first fenced block anywhere in the response,
/// skipping a language tag. Without a closed fence, falls back to the span
/// from the first `{` to the last `}`.
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(open) = trimmed.find("```") {
        let rest = &trimmed[open + 3..];
        let body_start = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        let body = &rest[body_start..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
