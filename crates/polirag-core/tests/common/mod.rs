#![allow(dead_code)]

use async_trait::async_trait;
use polirag_core::{
    Document, LLMError, Party, PartyDatabase, PartyDocuments, RetrievalError, Retriever, LLM,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const STRUCTURED_RESPONSE: &str = r#"{
    "cdu": "Die CDU/CSU setzt auf Technologieoffenheit.",
    "spd": "Die SPD will den Ausbau der Solarenergie beschleunigen.",
    "gruene": "Die Grünen fordern eine Solarpflicht.",
    "linke": "Die Linke will Bürgerenergie fördern.",
    "fdp": "Die FDP lehnt Subventionen ab.",
    "afd": "Die AfD lehnt den Ausbau ab."
}"#;

/// Model double returning a fixed response and recording every prompt.
#[derive(Clone)]
pub struct StubLlm {
    response: String,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl StubLlm {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLM for StubLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }

    async fn complete_with_system(&self, _system: &str, prompt: &str) -> Result<String, LLMError> {
        self.complete(prompt).await
    }
}

/// Model double that always fails.
pub struct FailingLlm;

#[async_trait]
impl LLM for FailingLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, LLMError> {
        Err(LLMError::RateLimited)
    }

    async fn complete_with_system(&self, _system: &str, _prompt: &str) -> Result<String, LLMError> {
        Err(LLMError::RateLimited)
    }
}

/// Retriever double returning fixed documents and counting calls.
#[derive(Clone)]
pub struct StubRetriever {
    docs: Vec<Document>,
    pub calls: Arc<AtomicUsize>,
}

impl StubRetriever {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            docs: texts.iter().map(|t| Document::new(*t)).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for StubRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Document>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.clone())
    }
}

/// Retriever double whose backend is always down.
pub struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Document>, RetrievalError> {
        Err(RetrievalError::backend("index unavailable"))
    }
}

/// Database double with a fixed context and one document per party.
pub struct StubDatabase {
    source_type: String,
    context: String,
    fail: bool,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl StubDatabase {
    pub fn new(source_type: &str, context: &str) -> Arc<Self> {
        Arc::new(Self {
            source_type: source_type.to_string(),
            context: context.to_string(),
            fail: false,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(source_type: &str) -> Arc<Self> {
        Arc::new(Self {
            source_type: source_type.to_string(),
            context: String::new(),
            fail: true,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl PartyDatabase for StubDatabase {
    fn source_type(&self) -> &str {
        &self.source_type
    }

    async fn build_context(&self, query: &str, k: usize) -> Result<String, RetrievalError> {
        self.queries.lock().unwrap().push((query.to_string(), k));
        if self.fail {
            return Err(RetrievalError::backend("index unavailable"));
        }
        Ok(self.context.clone())
    }

    async fn get_documents_for_each_party(
        &self,
        query: &str,
        k: usize,
    ) -> Result<PartyDocuments, RetrievalError> {
        self.queries.lock().unwrap().push((query.to_string(), k));
        Ok(Party::ALL
            .into_iter()
            .map(|p| {
                let doc = Document::new(format!("{} in {}", p.key(), self.source_type));
                (p, vec![doc])
            })
            .collect())
    }
}
