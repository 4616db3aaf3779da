//! Retrieval contracts consumed by the chains.
//!
//! Vector databases live outside this crate; they plug in by implementing
//! [`Retriever`] (single-retriever chain) or [`PartyDatabase`]
//! (balanced-retrieval chain). [`DocumentStore`] is a small file-backed
//! implementation of both.

mod error;
mod store;

pub use error::RetrievalError;
pub use store::{DocumentStore, StoreRetriever};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::party::Party;

/// A retrieved piece of text with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Creates a document without metadata.
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Retrieved documents grouped by party.
pub type PartyDocuments = BTreeMap<Party, Vec<Document>>;

/// Renders documents as prompt context, separated by blank lines.
pub fn format_documents(docs: &[Document]) -> String {
    docs.iter()
        .map(|d| d.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Returns the documents relevant to a query.
///
/// How many documents come back is the retriever's own configuration.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RetrievalError>;
}

/// A source of party-tagged documents, e.g. parliament debates or
/// election manifestos.
#[async_trait]
pub trait PartyDatabase: Send + Sync {
    /// Grouping key for this source in returned documents.
    fn source_type(&self) -> &str;

    /// Prompt-ready context for a query, using up to `k` documents per party.
    async fn build_context(&self, query: &str, k: usize) -> Result<String, RetrievalError>;

    /// Up to `k` documents per party for a query.
    async fn get_documents_for_each_party(
        &self,
        query: &str,
        k: usize,
    ) -> Result<PartyDocuments, RetrievalError>;
}

#[async_trait]
impl<T: Retriever + ?Sized> Retriever for Arc<T> {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RetrievalError> {
        (**self).retrieve(query).await
    }
}

#[async_trait]
impl<T: PartyDatabase + ?Sized> PartyDatabase for Arc<T> {
    fn source_type(&self) -> &str {
        (**self).source_type()
    }

    async fn build_context(&self, query: &str, k: usize) -> Result<String, RetrievalError> {
        (**self).build_context(query, k).await
    }

    async fn get_documents_for_each_party(
        &self,
        query: &str,
        k: usize,
    ) -> Result<PartyDocuments, RetrievalError> {
        (**self).get_documents_for_each_party(query, k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_documents() {
        let docs = vec![Document::new("eins"), Document::new("zwei")];
        assert_eq!(format_documents(&docs), "eins\n\nzwei");
        assert_eq!(format_documents(&[]), "");
    }

    #[test]
    fn test_document_metadata_defaults() {
        let doc: Document = serde_json::from_str(r#"{"page_content": "x"}"#).unwrap();
        assert!(doc.metadata.is_empty());

        let doc = Document::new("y").with_metadata("party", "spd");
        assert_eq!(doc.metadata["party"], "spd");
    }
}
