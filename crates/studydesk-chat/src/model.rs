//! Chat model abstraction.

use std::sync::Arc;

use async_trait::async_trait;
use studydesk_types::ChatMessage;

use crate::error::Result;

/// A hosted or local LLM that answers a conversation.
///
/// `messages` is the full prompt in order: system message, prior history,
/// then the current user message.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the assistant reply for `messages`.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Get the name of this model backend.
    fn name(&self) -> &str;
}

/// A model that can be shared across tasks.
pub type SharedModel = Arc<dyn ChatModel>;
