//! Document chat service.
//!
//! One turn:
//! 1. Load (or start) the caller's ephemeral history from the session cache
//! 2. Retrieve context passages for the document
//! 3. Build the prompt: system message, history, question wrapped in context
//! 4. Ask the model
//! 5. Append the raw question and the answer to the cached history

use std::sync::Arc;

use studydesk_session::SessionCache;
use studydesk_types::{ChatMessage, config_defaults as defaults};
use tracing::{debug, info};

use crate::error::{ChatError, Result};
use crate::model::{ChatModel, SharedModel};
use crate::retriever::{ContextRetriever, DocumentRef, SharedRetriever};

/// System prompt for single-document chat.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful and concise study assistant for a specific document.";

/// A single chat turn against one document.
#[derive(Debug, Clone)]
pub struct DocumentChatRequest {
    /// Client-supplied ephemeral session id.
    pub session_id: String,
    /// The authenticated user.
    pub owner_id: String,
    /// The document being studied.
    pub document: DocumentRef,
    /// The user's question.
    pub query: String,
}

/// Build the full prompt for one turn.
pub fn build_messages(history: &[ChatMessage], context: &str, query: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(format!(
        "Use the context below to answer the question. If you don't know, say that.\n\n\
         Context:\n\"\"\"\n{context}\n\"\"\"\n\nQuestion: {query}"
    )));
    messages
}

/// Orchestrates document chat turns over a shared session cache.
#[derive(Clone)]
pub struct DocumentChat {
    cache: SessionCache,
    retriever: SharedRetriever,
    model: SharedModel,
    top_k: usize,
}

impl DocumentChat {
    /// Create a new document chat service.
    pub fn new(
        cache: SessionCache,
        retriever: Arc<dyn ContextRetriever>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            cache,
            retriever,
            model,
            top_k: defaults::RETRIEVAL_TOP_K,
        }
    }

    /// Set how many context passages are retrieved per turn.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// The session cache backing this service.
    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Get the model backend name.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Execute one chat turn and return the assistant's reply.
    ///
    /// On retrieval or model failure the cached history is left unchanged.
    pub async fn turn(&self, request: &DocumentChatRequest) -> Result<ChatMessage> {
        let query = request.query.as_str();
        if query.trim().is_empty() {
            return Err(ChatError::EmptyQuery);
        }

        let history = self
            .cache
            .get_or_create_history(&request.session_id, &request.owner_id);

        debug!(
            session_id = %request.session_id,
            document = %request.document,
            history_len = history.len(),
            "Executing document chat turn"
        );

        let passages = self
            .retriever
            .retrieve(&request.document, query, self.top_k)
            .await?;
        let context = passages.join("\n\n");

        let messages = build_messages(&history, &context, query);
        let answer = self.model.complete(&messages).await?;

        let reply = ChatMessage::assistant(answer);
        self.cache.add_messages(
            &request.session_id,
            [ChatMessage::user(query), reply.clone()],
        );

        info!(
            session_id = %request.session_id,
            model = %self.model.name(),
            passages = passages.len(),
            response_len = reply.content.len(),
            "Document chat turn completed"
        );

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use studydesk_session::CacheConfig;
    use studydesk_types::Role;

    /// Returns canned replies in order and records every prompt.
    struct ScriptedModel {
        replies: Mutex<Vec<Result<String>>>,
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<Vec<ChatMessage>> {
            self.prompts.lock().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.prompts.lock().push(messages.to_vec());
            let mut replies = self.replies.lock();
            if replies.is_empty() {
                return Err(ChatError::Model("no more replies".to_string()));
            }
            replies.remove(0)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct FixedRetriever {
        passages: Vec<String>,
        fail: bool,
    }

    #[async_trait]
    impl ContextRetriever for FixedRetriever {
        async fn retrieve(
            &self,
            _document: &DocumentRef,
            _query: &str,
            top_k: usize,
        ) -> Result<Vec<String>> {
            if self.fail {
                return Err(ChatError::Retrieval("vector store unavailable".to_string()));
            }
            Ok(self.passages.iter().take(top_k).cloned().collect())
        }
    }

    fn retriever(passages: &[&str]) -> Arc<FixedRetriever> {
        Arc::new(FixedRetriever {
            passages: passages.iter().map(|p| p.to_string()).collect(),
            fail: false,
        })
    }

    fn request(session: &str, owner: &str, query: &str) -> DocumentChatRequest {
        DocumentChatRequest {
            session_id: session.to_string(),
            owner_id: owner.to_string(),
            document: DocumentRef::new("col-1", "src-1"),
            query: query.to_string(),
        }
    }

    #[test]
    fn test_build_messages_layout() {
        let history = vec![ChatMessage::user("q0"), ChatMessage::assistant("a0")];

        let messages = build_messages(&history, "ctx", "q1");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatMessage::system(SYSTEM_PROMPT));
        assert_eq!(&messages[1..3], history.as_slice());
        assert_eq!(messages[3].role, Role::User);
        assert!(messages[3].content.contains("Context:\n\"\"\"\nctx\n\"\"\""));
        assert!(messages[3].content.ends_with("Question: q1"));
    }

    #[tokio::test]
    async fn test_turn_stores_raw_query_and_answer() {
        let cache = SessionCache::new(CacheConfig::default());
        let model = Arc::new(ScriptedModel::new(vec![Ok("Mitochondria.".to_string())]));
        let chat = DocumentChat::new(cache.clone(), retriever(&["p1", "p2"]), model.clone());

        let reply = chat
            .turn(&request("s1", "u1", "  What is the powerhouse?  "))
            .await
            .unwrap();

        assert_eq!(reply, ChatMessage::assistant("Mitochondria."));
        assert_eq!(
            cache.peek_history("s1").unwrap(),
            vec![
                ChatMessage::user("  What is the powerhouse?  "),
                ChatMessage::assistant("Mitochondria."),
            ]
        );

        let prompt = &model.prompts()[0];
        assert_eq!(prompt.len(), 2);
        assert!(prompt[1].content.contains("p1\n\np2"));
        assert!(prompt[1].content.ends_with("Question:   What is the powerhouse?  "));
    }

    #[tokio::test]
    async fn test_second_turn_sees_history() {
        let cache = SessionCache::new(CacheConfig::default());
        let model = Arc::new(ScriptedModel::new(vec![
            Ok("first".to_string()),
            Ok("second".to_string()),
        ]));
        let chat = DocumentChat::new(cache, retriever(&["p"]), model.clone());

        chat.turn(&request("s1", "u1", "one")).await.unwrap();
        chat.turn(&request("s1", "u1", "two")).await.unwrap();

        let prompt = &model.prompts()[1];
        assert_eq!(prompt.len(), 4);
        assert_eq!(prompt[1], ChatMessage::user("one"));
        assert_eq!(prompt[2], ChatMessage::assistant("first"));
    }

    #[tokio::test]
    async fn test_new_session_for_owner_starts_fresh() {
        let cache = SessionCache::new(CacheConfig::default());
        let model = Arc::new(ScriptedModel::new(vec![
            Ok("a".to_string()),
            Ok("b".to_string()),
        ]));
        let chat = DocumentChat::new(cache.clone(), retriever(&["p"]), model.clone());

        chat.turn(&request("doc-a", "u1", "q")).await.unwrap();
        chat.turn(&request("doc-b", "u1", "q")).await.unwrap();

        assert_eq!(model.prompts()[1].len(), 2);
        assert!(!cache.contains("doc-a"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let cache = SessionCache::new(CacheConfig::default());
        let model = Arc::new(ScriptedModel::new(vec![]));
        let chat = DocumentChat::new(cache.clone(), retriever(&[]), model.clone());

        let err = chat.turn(&request("s1", "u1", "   ")).await.unwrap_err();

        assert!(matches!(err, ChatError::EmptyQuery));
        assert!(cache.is_empty());
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_leaves_history_untouched() {
        let cache = SessionCache::new(CacheConfig::default());
        let model = Arc::new(ScriptedModel::new(vec![
            Ok("ok".to_string()),
            Err(ChatError::Model("boom".to_string())),
        ]));
        let chat = DocumentChat::new(cache.clone(), retriever(&["p"]), model);

        chat.turn(&request("s1", "u1", "q1")).await.unwrap();
        let err = chat.turn(&request("s1", "u1", "q2")).await.unwrap_err();

        assert!(matches!(err, ChatError::Model(_)));
        assert_eq!(cache.peek_history("s1").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retrieval_failure_propagates() {
        let cache = SessionCache::new(CacheConfig::default());
        let model = Arc::new(ScriptedModel::new(vec![Ok("unused".to_string())]));
        let failing = Arc::new(FixedRetriever {
            passages: Vec::new(),
            fail: true,
        });
        let chat = DocumentChat::new(cache.clone(), failing, model.clone());

        let err = chat.turn(&request("s1", "u1", "q")).await.unwrap_err();

        assert!(matches!(err, ChatError::Retrieval(_)));
        assert!(model.prompts().is_empty());
        assert!(cache.peek_history("s1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_k_limits_passages() {
        let cache = SessionCache::new(CacheConfig::default());
        let model = Arc::new(ScriptedModel::new(vec![Ok("x".to_string())]));
        let chat = DocumentChat::new(cache, retriever(&["p1", "p2", "p3", "p4"]), model.clone())
            .with_top_k(2);

        chat.turn(&request("s1", "u1", "q")).await.unwrap();

        let user_prompt = &model.prompts()[0][1].content;
        assert!(user_prompt.contains("p2"));
        assert!(!user_prompt.contains("p3"));
    }
}
