//! Conversation backend
//!
//! The server decides what the bot says; the widget only needs a way to post
//! a message to one of two endpoints and get a reply back.

mod error;
mod http;

pub use error::{BackendError, BackendErrorKind};
pub use http::HttpBackend;

use crate::reply::BotReply;
use async_trait::async_trait;
use std::sync::Arc;

/// Endpoint a message is posted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Option selections (`set-choice/`)
    Choice,
    /// Free-form text (`/chat/`)
    Chat,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Choice => "choice",
            Endpoint::Chat => "chat",
        }
    }
}

/// Client for the conversation endpoints
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Post `{message}` and return the parsed reply
    async fn send(&self, endpoint: Endpoint, message: &str) -> Result<BotReply, BackendError>;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for Arc<T> {
    async fn send(&self, endpoint: Endpoint, message: &str) -> Result<BotReply, BackendError> {
        (**self).send(endpoint, message).await
    }
}
