//! Events that can occur in the widget

use crate::backend::BackendError;
use crate::reply::BotReply;
use crate::widget::state::RequestToken;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Page events
    PageLoaded {
        consent_stored: bool,
    },
    ConsentAccepted,

    // Window events
    ToggleClicked,
    CloseClicked,

    // User input
    OptionSelected {
        label: String,
    },
    TextSubmitted {
        text: String,
    },

    // Server events
    ReplyReceived {
        token: RequestToken,
        reply: BotReply,
    },
    ReplyFailed {
        token: RequestToken,
        error: BackendError,
    },

    /// Host-requested restart of the greeting flow
    Reset,
}

impl Event {
    pub fn option(label: impl Into<String>) -> Self {
        Event::OptionSelected {
            label: label.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Event::TextSubmitted { text: text.into() }
    }

    /// Short name for log fields
    pub fn name(&self) -> &'static str {
        match self {
            Event::PageLoaded { .. } => "page_loaded",
            Event::ConsentAccepted => "consent_accepted",
            Event::ToggleClicked => "toggle_clicked",
            Event::CloseClicked => "close_clicked",
            Event::OptionSelected { .. } => "option_selected",
            Event::TextSubmitted { .. } => "text_submitted",
            Event::ReplyReceived { .. } => "reply_received",
            Event::ReplyFailed { .. } => "reply_failed",
            Event::Reset => "reset",
        }
    }
}
