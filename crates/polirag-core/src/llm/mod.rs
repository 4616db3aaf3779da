mod claude;
mod error;
mod openai;
mod provider;

pub use claude::ClaudeClient;
pub use error::LLMError;
pub use openai::OpenAIClient;
pub use provider::Provider;

use async_trait::async_trait;

/// Trait for Large Language Model providers.
///
/// Chains only ever hold a `dyn LLM` or a generic `L: LLM`, so any
/// chat model (or a test double) can be swapped in.
///
/// # Supported Providers
///
/// - **OpenAI-compatible** (default): Works with OpenAI, Azure, Ollama, vLLM, OpenRouter, etc.
/// - **Anthropic**: Claude models via Anthropic API
/// - **Ollama**: Local models via Ollama
///
/// # Example
///
/// ```ignore
/// use polirag_core::llm::{Provider, LLM};
///
/// let llm = Provider::from_env()?;
/// let response = llm.complete("Hallo!").await?;
/// ```
#[async_trait]
pub trait LLM: Send + Sync {
    /// Complete a prompt and return the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String, LLMError>;

    /// Complete a prompt with a system message.
    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LLMError>;
}

/// Blanket implementation for boxed trait objects.
#[async_trait]
impl LLM for Box<dyn LLM> {
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        (**self).complete(prompt).await
    }

    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LLMError> {
        (**self).complete_with_system(system, prompt).await
    }
}
