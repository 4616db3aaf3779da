//! Question-answering pipelines.
//!
//! Both chains run the same four stages once per invocation: gather
//! context, render the prompt, call the model, parse the answer. A chain
//! holds only its build-time configuration, so invoking it twice with the
//! same question and deterministic collaborators gives the same result.

mod balanced;
mod single;

pub use balanced::{BalancedChain, BalancedOptions, BalancedOutput};
pub use single::{RagChain, RagOptions, RagOutput, VerboseOutput};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::LLMError;
use crate::parser::ParseError;
use crate::prompts::PromptError;
use crate::retrieval::RetrievalError;

/// Errors that can occur while building or invoking a chain.
///
/// `InvalidArgument` is raised while building, before any retrieval or
/// model call. Everything else is a collaborator failure passed through
/// unchanged.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("LLM error: {0}")]
    LLM(#[from] LLMError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// What a chain is invoked with: a bare question or `{"question": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainInput {
    Question(String),
    Object { question: String },
}

impl ChainInput {
    /// The question text.
    pub fn question(&self) -> &str {
        match self {
            ChainInput::Question(q) | ChainInput::Object { question: q } => q,
        }
    }

    /// Consumes the input, returning the question text.
    pub fn into_question(self) -> String {
        match self {
            ChainInput::Question(q) | ChainInput::Object { question: q } => q,
        }
    }
}

impl From<&str> for ChainInput {
    fn from(question: &str) -> Self {
        ChainInput::Question(question.to_string())
    }
}

impl From<String> for ChainInput {
    fn from(question: String) -> Self {
        ChainInput::Question(question)
    }
}

/// A runnable question-answering pipeline.
#[async_trait]
pub trait Chain: Send + Sync {
    type Output: Serialize + Send;

    async fn invoke(&self, input: ChainInput) -> Result<Self::Output, ChainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_accepts_string_and_object() {
        let plain: ChainInput = serde_json::from_str(r#""Was sagt die SPD?""#).unwrap();
        let object: ChainInput =
            serde_json::from_str(r#"{"question": "Was sagt die SPD?"}"#).unwrap();
        assert_eq!(plain.question(), object.question());
        assert_eq!(object.into_question(), "Was sagt die SPD?");
    }
}
