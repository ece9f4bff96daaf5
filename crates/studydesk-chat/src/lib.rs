//! Document chat for studydesk.
//!
//! A chat turn reads the caller's ephemeral history from the
//! [`SessionCache`](studydesk_session::SessionCache), retrieves context for
//! the document being studied, asks the model, and appends the new
//! user/assistant pair back into the cache.
//!
//! The vector store and the LLM are reached through the [`ContextRetriever`]
//! and [`ChatModel`] traits.

pub mod document;
pub mod error;
pub mod model;
pub mod openai;
pub mod retriever;
pub mod service;

pub use document::TextDocumentRetriever;
pub use error::{ChatError, Result};
pub use model::{ChatModel, SharedModel};
pub use openai::{OpenAiChatModel, OpenAiConfig};
pub use retriever::{ContextRetriever, DocumentRef, SharedRetriever};
pub use service::{DocumentChat, DocumentChatRequest, SYSTEM_PROMPT, build_messages};
