pub mod chain;
pub mod config;
pub mod llm;
pub mod parser;
pub mod party;
pub mod prompts;
pub mod retrieval;

pub use chain::{
    BalancedChain, BalancedOptions, BalancedOutput, Chain, ChainError, ChainInput, RagChain,
    RagOptions, RagOutput, VerboseOutput,
};
pub use config::{ChainConfig, Config, ConfigError, LLMConfig};
pub use llm::{ClaudeClient, LLMError, OpenAIClient, Provider, LLM};
pub use parser::{Answer, OutputParser, ParseError};
pub use party::{Party, PartySummaries};
pub use prompts::{PromptError, PromptTemplate};
pub use retrieval::{Document, DocumentStore, PartyDatabase, PartyDocuments, RetrievalError, Retriever};
