use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::{Document, PartyDatabase, PartyDocuments, RetrievalError, Retriever};
use crate::party::Party;

/// One entry of a document file.
#[derive(Debug, Deserialize)]
struct Record {
    party: String,
    text: String,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug)]
struct Entry {
    party: Party,
    document: Document,
    terms: HashSet<String>,
}

/// File-backed document source with lexical ranking.
///
/// Loads a JSON array of `{"party": "spd", "text": "...", "metadata": {...}}`
/// records. A document's score for a query is the number of distinct query
/// terms it contains; ties keep file order and zero-score documents are
/// never returned.
#[derive(Debug)]
pub struct DocumentStore {
    source_type: String,
    entries: Vec<Entry>,
    tokenizer: Regex,
}

impl DocumentStore {
    /// Loads a store from a JSON document file.
    pub fn open(path: impl AsRef<Path>, source_type: impl Into<String>) -> Result<Self, RetrievalError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content, source_type)
    }

    /// Builds a store from JSON document records.
    pub fn from_json(json: &str, source_type: impl Into<String>) -> Result<Self, RetrievalError> {
        let records: Vec<Record> = serde_json::from_str(json)?;
        let source_type = source_type.into();
        let tokenizer = Regex::new(r"\w+").map_err(RetrievalError::backend)?;

        let entries = records
            .into_iter()
            .map(|record| -> Result<Entry, RetrievalError> {
                let party = Party::from_key(&record.party)
                    .ok_or_else(|| RetrievalError::UnknownParty(record.party.clone()))?;
                let terms = tokenize(&tokenizer, &record.text).collect();

                let mut document = Document {
                    page_content: record.text,
                    metadata: record.metadata,
                };
                document
                    .metadata
                    .insert("party".to_string(), party.key().into());
                document
                    .metadata
                    .insert("source_type".to_string(), source_type.clone().into());

                Ok(Entry {
                    party,
                    document,
                    terms,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(source_type = %source_type, documents = entries.len(), "Loaded document store");

        Ok(Self {
            source_type,
            entries,
            tokenizer,
        })
    }

    /// Number of documents in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wraps the store as a [`Retriever`] returning the `k` best documents
    /// across all parties.
    pub fn as_retriever(self: &Arc<Self>, k: usize) -> StoreRetriever {
        StoreRetriever {
            store: Arc::clone(self),
            k,
        }
    }

    /// Ranked matches, optionally restricted to one party.
    fn search(&self, query: &str, party: Option<Party>, k: usize) -> Vec<Document> {
        let query_terms: HashSet<String> = tokenize(&self.tokenizer, query).collect();

        let mut scored: Vec<(usize, usize)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| party.map_or(true, |p| e.party == p))
            .map(|(i, e)| (e.terms.intersection(&query_terms).count(), i))
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort keeps file order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(k)
            .map(|(_, i)| self.entries[i].document.clone())
            .collect()
    }

    fn documents_for_each_party(&self, query: &str, k: usize) -> PartyDocuments {
        Party::ALL
            .into_iter()
            .map(|party| (party, self.search(query, Some(party), k)))
            .collect()
    }
}

fn tokenize<'a>(tokenizer: &'a Regex, text: &'a str) -> impl Iterator<Item = String> + 'a {
    tokenizer
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
}

#[async_trait]
impl PartyDatabase for DocumentStore {
    fn source_type(&self) -> &str {
        &self.source_type
    }

    async fn build_context(&self, query: &str, k: usize) -> Result<String, RetrievalError> {
        let docs = self.documents_for_each_party(query, k);

        let blocks: Vec<String> = Party::ALL
            .iter()
            .map(|party| {
                let mut block = format!("## {} ({})\n\n", party.display_name(), self.source_type);
                match docs.get(party).filter(|d| !d.is_empty()) {
                    Some(party_docs) => block.push_str(&super::format_documents(party_docs)),
                    None => block.push_str("(keine passenden Dokumente)"),
                }
                block
            })
            .collect();

        Ok(blocks.join("\n\n"))
    }

    async fn get_documents_for_each_party(
        &self,
        query: &str,
        k: usize,
    ) -> Result<PartyDocuments, RetrievalError> {
        Ok(self.documents_for_each_party(query, k))
    }
}

/// A [`DocumentStore`] viewed as a fixed-`k` [`Retriever`].
#[derive(Debug, Clone)]
pub struct StoreRetriever {
    store: Arc<DocumentStore>,
    k: usize,
}

#[async_trait]
impl Retriever for StoreRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>, RetrievalError> {
        Ok(self.store.search(query, None, self.k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCS: &str = r#"[
        {"party": "spd", "text": "Wir wollen Solarenergie auf jedem Dach."},
        {"party": "cdu", "text": "Kernenergie bleibt eine Option."},
        {"party": "spd", "text": "Solarenergie und Windenergie schaffen Arbeitsplätze.", "metadata": {"page": 12}},
        {"party": "fdp", "text": "Technologieoffenheit statt Verbote."}
    ]"#;

    fn store() -> DocumentStore {
        DocumentStore::from_json(DOCS, "manifestos").unwrap()
    }

    #[test]
    fn test_search_ranks_by_term_overlap() {
        let docs = store().search("Solarenergie Windenergie", None, 5);
        assert_eq!(docs.len(), 2);
        assert!(docs[0].page_content.starts_with("Solarenergie und Windenergie"));
        assert_eq!(docs[0].metadata["page"], 12);
        assert_eq!(docs[0].metadata["party"], "spd");
        assert_eq!(docs[0].metadata["source_type"], "manifestos");
    }

    #[test]
    fn test_search_respects_k_and_ties_keep_order() {
        let docs = store().search("solarenergie", None, 1);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].page_content, "Wir wollen Solarenergie auf jedem Dach.");
    }

    #[test]
    fn test_unknown_party_is_rejected() {
        let result = DocumentStore::from_json(r#"[{"party": "piraten", "text": "x"}]"#, "x");
        assert!(matches!(result, Err(RetrievalError::UnknownParty(p)) if p == "piraten"));
    }

    #[tokio::test]
    async fn test_documents_for_each_party_covers_all_parties() {
        let docs = store()
            .get_documents_for_each_party("Solarenergie", 5)
            .await
            .unwrap();
        assert_eq!(docs.len(), 6);
        assert_eq!(docs[&Party::Spd].len(), 2);
        assert!(docs[&Party::Cdu].is_empty());
    }

    #[tokio::test]
    async fn test_build_context_has_block_per_party() {
        let context = store().build_context("Kernenergie", 5).await.unwrap();
        assert!(context.starts_with("## CDU/CSU (manifestos)\n\nKernenergie bleibt eine Option."));
        assert!(context.contains("## AfD (manifestos)\n\n(keine passenden Dokumente)"));
    }

    #[tokio::test]
    async fn test_retriever_view() {
        let store = Arc::new(store());
        let retriever = store.as_retriever(3);
        let docs = retriever.retrieve("Technologieoffenheit").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].metadata["party"], "fdp");
    }
}
