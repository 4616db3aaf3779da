use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::{Chain, ChainError, ChainInput};
use crate::config::ChainConfig;
use crate::llm::LLM;
use crate::parser::{Answer, OutputParser};
use crate::prompts::{self, PromptTemplate};
use crate::retrieval::{format_documents, Document, Retriever};

/// Build-time options for [`RagChain`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RagOptions {
    pub output_parser: OutputParser,
    /// Return question and retrieved documents with the answer.
    pub verbose: bool,
}

impl RagOptions {
    /// Reads parser mode and verbosity from configuration.
    pub fn from_config(config: &ChainConfig) -> Result<Self, ChainError> {
        Ok(Self {
            output_parser: config.output_parser.parse()?,
            verbose: config.verbose,
        })
    }
}

/// Result of a [`RagChain`] invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RagOutput {
    Answer(Answer),
    Verbose(VerboseOutput),
}

/// Answer bundled with what it was generated from.
///
/// `answer` is always the unparsed model text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerboseOutput {
    pub question: String,
    pub context: Vec<Document>,
    pub answer: Answer,
}

/// Answers a question from one retriever's documents.
pub struct RagChain<R: Retriever, L: LLM> {
    retriever: R,
    llm: L,
    prompt: PromptTemplate,
    options: RagOptions,
}

impl<R: Retriever, L: LLM> RagChain<R, L> {
    /// Assembles the chain.
    pub fn new(retriever: R, llm: L, options: RagOptions) -> Self {
        let mut prompt = PromptTemplate::new(prompts::QUESTION_PROMPT);
        if let Some(instructions) = options.output_parser.format_instructions() {
            prompt = prompt
                .append(prompts::FORMAT_INSTRUCTIONS_SUFFIX)
                .with_partial(prompts::FORMAT_INSTRUCTIONS, instructions);
        }

        Self {
            retriever,
            llm,
            prompt,
            options,
        }
    }

    /// Assembles the chain from a parser mode name (`"json"` or `"str"`).
    ///
    /// Unknown modes fail here, before anything is retrieved.
    pub fn with_parser_name(
        retriever: R,
        llm: L,
        output_parser: &str,
        verbose: bool,
    ) -> Result<Self, ChainError> {
        let options = RagOptions {
            output_parser: output_parser.parse()?,
            verbose,
        };
        Ok(Self::new(retriever, llm, options))
    }

    /// The prompt template this chain renders.
    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }
}

#[async_trait]
impl<R: Retriever, L: LLM> Chain for RagChain<R, L> {
    type Output = RagOutput;

    async fn invoke(&self, input: ChainInput) -> Result<RagOutput, ChainError> {
        let question = input.into_question();
        info!(parser = %self.options.output_parser, verbose = self.options.verbose, "Answering question");

        let context = self.retriever.retrieve(&question).await?;
        debug!(documents = context.len(), "Retrieved context");

        let context_text = format_documents(&context);
        let prompt = self.prompt.format(&[
            (prompts::QUESTION, question.as_str()),
            (prompts::CONTEXT, context_text.as_str()),
        ])?;

        let raw = self.llm.complete(&prompt).await?;
        debug!(chars = raw.len(), "Model responded");

        // Verbose output carries the model text as-is, whatever the parser mode
        if self.options.verbose {
            return Ok(RagOutput::Verbose(VerboseOutput {
                question,
                context,
                answer: Answer::Text(raw),
            }));
        }

        Ok(RagOutput::Answer(self.options.output_parser.parse(&raw)?))
    }
}
