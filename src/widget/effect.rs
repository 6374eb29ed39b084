//! Effects produced by state transitions

use crate::backend::{BackendError, Endpoint};
use crate::widget::state::RequestToken;

/// Effects to be executed after the new state has been rendered
#[derive(Debug, Clone)]
pub enum Effect {
    /// POST `{message}` to an endpoint; the outcome comes back as
    /// `ReplyReceived` / `ReplyFailed` carrying the same token
    SendRequest {
        token: RequestToken,
        endpoint: Endpoint,
        message: String,
    },

    /// Store the consent flag
    PersistConsent,

    /// Empty the free-text input
    ClearInput,

    /// Give the free-text input keyboard focus
    FocusInput,

    ScrollToBottom,

    /// Hand the typed failure to the host; the transcript only shows the apology
    ReportFailure { error: BackendError },
}

impl Effect {
    pub fn send(token: RequestToken, endpoint: Endpoint, message: impl Into<String>) -> Self {
        Effect::SendRequest {
            token,
            endpoint,
            message: message.into(),
        }
    }
}
