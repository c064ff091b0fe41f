//! Retriever trait: an opaque source of documents for a query.
//!
//! Vector stores, CSV indexes and search APIs all sit behind this trait.
//! The core only needs the ranked text back.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Documents relevant to `query`, most relevant first.
    async fn retrieve(&self, query: &str) -> Result<Vec<String>>;
}

/// A fixed list of documents, returned for every query.
///
/// Handy for tests and for small catalogs that fit in one prompt.
pub struct StaticRetriever {
    documents: Vec<String>,
}

impl StaticRetriever {
    pub fn new(documents: Vec<String>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<String>> {
        Ok(self.documents.clone())
    }
}
