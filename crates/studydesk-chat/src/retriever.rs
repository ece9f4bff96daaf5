//! Context retrieval abstraction.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Identifies one uploaded source inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub collection_id: String,
    pub source_id: String,
}

impl DocumentRef {
    pub fn new(collection_id: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            source_id: source_id.into(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection_id, self.source_id)
    }
}

/// Finds the passages of a document most relevant to a query.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Return up to `top_k` text passages from `document`, best first.
    ///
    /// A document with nothing indexed yields an empty list, not an error.
    async fn retrieve(
        &self,
        document: &DocumentRef,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>>;
}

/// A retriever that can be shared across tasks.
pub type SharedRetriever = Arc<dyn ContextRetriever>;
