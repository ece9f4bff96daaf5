//! Local, in-memory retriever over plain-text documents.
//!
//! Stands in for the vector store when chatting with a file on disk:
//! documents are split into paragraph-packed chunks and ranked by how many
//! distinct query terms each chunk contains.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use studydesk_types::config_defaults as defaults;
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::retriever::{ContextRetriever, DocumentRef};

/// Terms shorter than this are ignored when scoring.
const MIN_TERM_CHARS: usize = 3;

/// Keyword-overlap retriever over documents held in memory.
#[derive(Debug)]
pub struct TextDocumentRetriever {
    chunk_chars: usize,
    documents: RwLock<HashMap<DocumentRef, Vec<String>>>,
}

impl Default for TextDocumentRetriever {
    fn default() -> Self {
        Self::new(defaults::CHUNK_CHARS)
    }
}

impl TextDocumentRetriever {
    /// Create an empty retriever that splits documents into chunks of at most `chunk_chars`.
    pub fn new(chunk_chars: usize) -> Self {
        Self {
            chunk_chars: chunk_chars.max(1),
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Index `text` under `document`, replacing any previous content.
    ///
    /// Returns the number of chunks produced.
    pub fn insert(&self, document: DocumentRef, text: &str) -> usize {
        let chunks = chunk_text(text, self.chunk_chars);
        let count = chunks.len();
        debug!(document = %document, chunks = count, "Indexed document");
        self.documents.write().insert(document, chunks);
        count
    }

    /// Read a UTF-8 text file and index it under `document`.
    pub fn load_file(&self, document: DocumentRef, path: &Path) -> Result<usize> {
        let text = std::fs::read_to_string(path).map_err(|e| ChatError::ReadDocument {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(self.insert(document, &text))
    }

    /// Number of chunks stored for `document`.
    pub fn chunk_count(&self, document: &DocumentRef) -> usize {
        self.documents
            .read()
            .get(document)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl ContextRetriever for TextDocumentRetriever {
    async fn retrieve(
        &self,
        document: &DocumentRef,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>> {
        let documents = self.documents.read();
        let Some(chunks) = documents.get(document) else {
            return Ok(Vec::new());
        };

        let query_terms = terms(query);
        let mut scored: Vec<(usize, &String)> = chunks
            .iter()
            .map(|chunk| (terms(chunk).intersection(&query_terms).count(), chunk))
            .collect();
        // Stable sort keeps document order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let matched: Vec<String> = scored
            .iter()
            .filter(|(score, _)| *score > 0)
            .take(top_k)
            .map(|(_, chunk)| (*chunk).clone())
            .collect();

        if matched.is_empty() {
            return Ok(chunks.iter().take(top_k).cloned().collect());
        }
        Ok(matched)
    }
}

/// Lowercased alphanumeric terms of at least [`MIN_TERM_CHARS`] characters.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TERM_CHARS)
        .map(str::to_lowercase)
        .collect()
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Paragraphs (separated by blank lines) are packed together while they fit;
/// a paragraph longer than `max_chars` is split on character boundaries.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let paragraph_chars = paragraph.chars().count();

        if paragraph_chars > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            let chars: Vec<char> = paragraph.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }

        // +2 for the blank line joining paragraphs.
        let joined_chars = if current.is_empty() {
            paragraph_chars
        } else {
            current_chars + 2 + paragraph_chars
        };

        if joined_chars > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(paragraph);
            current_chars = paragraph_chars;
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
            current_chars = joined_chars;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
