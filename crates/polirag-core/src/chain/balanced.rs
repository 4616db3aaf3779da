use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{Chain, ChainError, ChainInput};
use crate::config::{ChainConfig, DEFAULT_K, DEFAULT_LANGUAGE};
use crate::llm::LLM;
use crate::parser::{Answer, OutputParser};
use crate::prompts::{self, PromptTemplate};
use crate::retrieval::{PartyDatabase, PartyDocuments};

/// Separator between the contexts of different databases.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Build-time options for [`BalancedChain`].
#[derive(Debug, Clone)]
pub struct BalancedOptions {
    pub output_parser: OutputParser,
    /// Documents retrieved from each database.
    pub k: usize,
    /// Language the answer is written in.
    pub language: String,
    /// Return joined context and per-source documents with the answer.
    pub return_context: bool,
}

impl Default for BalancedOptions {
    fn default() -> Self {
        Self {
            output_parser: OutputParser::Structured,
            k: DEFAULT_K,
            language: DEFAULT_LANGUAGE.to_string(),
            return_context: false,
        }
    }
}

impl BalancedOptions {
    /// Reads parser mode, `k`, language and context return from configuration.
    pub fn from_config(config: &ChainConfig) -> Result<Self, ChainError> {
        Ok(Self {
            output_parser: config.output_parser.parse()?,
            k: config.k,
            language: config.language.clone(),
            return_context: config.return_context,
        })
    }
}

/// Result of a [`BalancedChain`] invocation.
///
/// `context` and `docs` are only present when the chain was built with
/// `return_context`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancedOutput {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<BTreeMap<String, PartyDocuments>>,
    pub answer: Answer,
}

/// Everything gathered for one question before the model is called.
#[derive(Debug)]
struct ChainContext {
    question: String,
    context: String,
    docs: Option<BTreeMap<String, PartyDocuments>>,
}

/// Answers a question from several databases weighted equally.
///
/// Every database is asked for the same `k`, and their contexts are joined
/// in list order, so one large source can't crowd out the others.
pub struct BalancedChain<L: LLM> {
    databases: Vec<Arc<dyn PartyDatabase>>,
    llm: L,
    prompt: PromptTemplate,
    options: BalancedOptions,
}

impl<L: LLM> BalancedChain<L> {
    /// Assembles the chain. Fails if `databases` is empty.
    pub fn new(
        databases: Vec<Arc<dyn PartyDatabase>>,
        llm: L,
        options: BalancedOptions,
    ) -> Result<Self, ChainError> {
        if databases.is_empty() {
            return Err(ChainError::InvalidArgument(
                "at least one database is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for db in &databases {
            if !seen.insert(db.source_type()) {
                warn!(source_type = %db.source_type(), "Duplicate source type; its documents will share one entry");
            }
        }

        let mut prompt = PromptTemplate::new(prompts::BALANCED_PROMPT)
            .with_partial(prompts::LANGUAGE, options.language.clone());
        if let Some(instructions) = options.output_parser.format_instructions() {
            prompt = prompt
                .append(prompts::FORMAT_INSTRUCTIONS_SUFFIX)
                .with_partial(prompts::FORMAT_INSTRUCTIONS, instructions);
        }

        Ok(Self {
            databases,
            llm,
            prompt,
            options,
        })
    }

    /// Assembles the chain from a parser mode name (`"json"` or `"str"`),
    /// with the remaining options at their defaults.
    pub fn with_parser_name(
        databases: Vec<Arc<dyn PartyDatabase>>,
        llm: L,
        output_parser: &str,
    ) -> Result<Self, ChainError> {
        let options = BalancedOptions {
            output_parser: output_parser.parse()?,
            ..Default::default()
        };
        Self::new(databases, llm, options)
    }

    /// The prompt template this chain renders.
    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    /// Queries every database, in order, for the question.
    async fn gather(&self, question: String) -> Result<ChainContext, ChainError> {
        let k = self.options.k;

        let mut contexts = Vec::with_capacity(self.databases.len());
        for db in &self.databases {
            let context = db.build_context(&question, k).await?;
            debug!(source_type = %db.source_type(), chars = context.len(), "Built context");
            contexts.push(context);
        }

        let docs = if self.options.return_context {
            let mut docs = BTreeMap::new();
            for db in &self.databases {
                let party_docs = db.get_documents_for_each_party(&question, k).await?;
                docs.insert(db.source_type().to_string(), party_docs);
            }
            Some(docs)
        } else {
            None
        };

        Ok(ChainContext {
            question,
            context: contexts.join(CONTEXT_SEPARATOR),
            docs,
        })
    }
}

#[async_trait]
impl<L: LLM> Chain for BalancedChain<L> {
    type Output = BalancedOutput;

    async fn invoke(&self, input: ChainInput) -> Result<BalancedOutput, ChainError> {
        info!(
            databases = self.databases.len(),
            k = self.options.k,
            parser = %self.options.output_parser,
            "Answering question with balanced retrieval"
        );

        let gathered = self.gather(input.into_question()).await?;

        let prompt = self.prompt.format(&[
            (prompts::CONTEXT, gathered.context.as_str()),
            (prompts::QUESTION, gathered.question.as_str()),
        ])?;

        let raw = self.llm.complete(&prompt).await?;
        debug!(chars = raw.len(), "Model responded");

        let answer = self.options.output_parser.parse(&raw)?;

        let ChainContext {
            question,
            context,
            docs,
        } = gathered;

        Ok(BalancedOutput {
            question,
            context: self.options.return_context.then_some(context),
            docs,
            answer,
        })
    }
}
