//! Pure state transition function
//!
//! Every user action and server outcome goes through `transition`, which
//! returns the next state plus the effects the runtime must perform. No I/O
//! happens here.

use super::state::{
    ConsentGate, Message, OptionSource, PendingRequest, Phase, RequestToken, TranscriptEntry,
    WidgetContext, WidgetState,
};
use super::{Effect, Event, FreeFlowMode, SelectionEndpoint};
use crate::backend::Endpoint;
use crate::reply::BotReply;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: WidgetState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: WidgetState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Chat is unavailable until consent is accepted")]
    ConsentRequired,
    #[error("Input is disabled while options are shown or a reply is pending")]
    InputDisabled,
    #[error("No option set is displayed")]
    NoOptionsDisplayed,
    #[error("Option is not on display: {0}")]
    UnknownOption(String),
    #[error("Conversation has not started")]
    NotStarted,
    #[error("Reply {0} does not match the pending request")]
    StaleReply(RequestToken),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &WidgetState,
    context: &WidgetContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&state.phase, event) {
        // ============================================================
        // Consent gate
        // ============================================================
        (_, Event::PageLoaded { consent_stored }) => {
            if state.consent != ConsentGate::Unchecked {
                return Err(TransitionError::InvalidTransition(
                    "consent is checked once per page load".to_string(),
                ));
            }
            let mut next = state.clone();
            next.consent = if consent_stored {
                ConsentGate::Given
            } else {
                ConsentGate::Pending
            };
            Ok(TransitionResult::new(next))
        }

        (_, Event::ConsentAccepted) => match state.consent {
            ConsentGate::Pending => {
                let mut next = state.clone();
                next.consent = ConsentGate::Given;
                Ok(TransitionResult::new(next).with_effect(Effect::PersistConsent))
            }
            ConsentGate::Given => Ok(TransitionResult::new(state.clone())),
            ConsentGate::Unchecked => Err(TransitionError::InvalidTransition(
                "consent accepted before the page loaded".to_string(),
            )),
        },

        // ============================================================
        // Window
        // ============================================================
        (_, Event::ToggleClicked) if state.consent != ConsentGate::Given => {
            Err(TransitionError::ConsentRequired)
        }

        (_, Event::ToggleClicked) if state.window_open => Ok(TransitionResult::new(state.clone())),

        // First reveal starts the conversation
        (Phase::NotStarted, Event::ToggleClicked) => {
            let mut next = state.clone();
            next.window_open = true;
            start_conversation(&mut next, context);
            Ok(TransitionResult::new(next)
                .with_effect(Effect::ClearInput)
                .with_effect(Effect::ScrollToBottom))
        }

        (_, Event::ToggleClicked) => {
            let mut next = state.clone();
            next.window_open = true;
            Ok(TransitionResult::new(next))
        }

        (_, Event::CloseClicked) => {
            let mut next = state.clone();
            next.window_open = false;
            Ok(TransitionResult::new(next))
        }

        // ============================================================
        // Option selection
        // ============================================================
        (Phase::AwaitingSelection { options, source }, Event::OptionSelected { label }) => {
            if !options.contains(&label) {
                return Err(TransitionError::UnknownOption(label));
            }
            let source = *source;

            let mut next = state.clone();
            next.transcript
                .push(TranscriptEntry::Message(Message::user(label.clone())));

            if source == OptionSource::Initial
                && label == context.free_flow_label
                && context.free_flow == FreeFlowMode::LocalUnlock
            {
                next.phase = Phase::AwaitingFreeText;
                return Ok(TransitionResult::new(next)
                    .with_effect(Effect::ScrollToBottom)
                    .with_effect(Effect::FocusInput));
            }

            let endpoint = selection_endpoint(context.selection_endpoint, source);
            // The chat endpoint resets the server conversation on these labels
            let reset_after = endpoint == Endpoint::Chat && context.is_reset_keyword(&label);
            let token = issue_request(&mut next, reset_after);
            Ok(TransitionResult::new(next)
                .with_effect(Effect::ScrollToBottom)
                .with_effect(Effect::send(token, endpoint, label)))
        }

        (Phase::NotStarted, Event::OptionSelected { .. }) => Err(TransitionError::NotStarted),

        (_, Event::OptionSelected { .. }) => Err(TransitionError::NoOptionsDisplayed),

        // ============================================================
        // Free text
        // ============================================================
        (Phase::AwaitingFreeText, Event::TextSubmitted { text }) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(TransitionResult::new(state.clone()));
            }

            let mut next = state.clone();
            next.transcript
                .push(TranscriptEntry::Message(Message::user(text)));
            let reset_after = context.is_reset_keyword(text);
            let token = issue_request(&mut next, reset_after);

            Ok(TransitionResult::new(next).with_effects([
                Effect::ClearInput,
                Effect::ScrollToBottom,
                Effect::send(token, Endpoint::Chat, text),
            ]))
        }

        (Phase::NotStarted, Event::TextSubmitted { .. }) => Err(TransitionError::NotStarted),

        (_, Event::TextSubmitted { .. }) => Err(TransitionError::InputDisabled),

        // ============================================================
        // Server outcomes
        // ============================================================
        (Phase::AwaitingServerReply { request }, Event::ReplyReceived { token, mut reply })
            if request.token == token =>
        {
            let options = std::mem::take(&mut reply.options);
            let mut next = state.clone();
            append_reply(&mut next, reply);

            let result = if request.reset_after {
                restart(&mut next, context);
                TransitionResult::new(next).with_effect(Effect::ClearInput)
            } else if options.is_empty() {
                next.phase = Phase::AwaitingFreeText;
                TransitionResult::new(next).with_effect(Effect::FocusInput)
            } else {
                next.phase = Phase::AwaitingSelection {
                    options,
                    source: OptionSource::Server,
                };
                TransitionResult::new(next).with_effect(Effect::ClearInput)
            };

            Ok(result.with_effect(Effect::ScrollToBottom))
        }

        (Phase::AwaitingServerReply { request }, Event::ReplyFailed { token, error })
            if request.token == token =>
        {
            let mut next = state.clone();
            next.transcript
                .push(TranscriptEntry::Message(Message::bot(context.apology.clone())));

            let result = if request.reset_after {
                restart(&mut next, context);
                TransitionResult::new(next).with_effect(Effect::ClearInput)
            } else {
                next.phase = Phase::AwaitingFreeText;
                TransitionResult::new(next).with_effect(Effect::FocusInput)
            };

            Ok(result
                .with_effect(Effect::ScrollToBottom)
                .with_effect(Effect::ReportFailure { error }))
        }

        (_, Event::ReplyReceived { token, .. } | Event::ReplyFailed { token, .. }) => {
            Err(TransitionError::StaleReply(token))
        }

        // ============================================================
        // Host reset
        // ============================================================
        (Phase::NotStarted, Event::Reset) => Err(TransitionError::NotStarted),

        (_, Event::Reset) => {
            let mut next = state.clone();
            restart(&mut next, context);
            Ok(TransitionResult::new(next)
                .with_effect(Effect::ClearInput)
                .with_effect(Effect::ScrollToBottom))
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Greeting plus the fixed option set
fn start_conversation(state: &mut WidgetState, context: &WidgetContext) {
    state
        .transcript
        .push(TranscriptEntry::Message(Message::bot(context.greeting.clone())));
    state.phase = Phase::AwaitingSelection {
        options: context.initial_options.clone(),
        source: OptionSource::Initial,
    };
}

/// Confirmation followed by a fresh greeting. Any pending request is dropped,
/// so its reply will be rejected as stale.
fn restart(state: &mut WidgetState, context: &WidgetContext) {
    state.transcript.push(TranscriptEntry::Message(Message::bot(
        context.reset_confirmation.clone(),
    )));
    start_conversation(state, context);
}

/// `set-choice/` only understands the greeting's options; answers to
/// server-provided sets belong to the chat endpoint.
fn selection_endpoint(routing: SelectionEndpoint, source: OptionSource) -> Endpoint {
    match (routing, source) {
        (SelectionEndpoint::Choice, _) | (SelectionEndpoint::Split, OptionSource::Initial) => {
            Endpoint::Choice
        }
        (SelectionEndpoint::Chat, _) | (SelectionEndpoint::Split, OptionSource::Server) => {
            Endpoint::Chat
        }
    }
}

fn issue_request(state: &mut WidgetState, reset_after: bool) -> RequestToken {
    let token = RequestToken(state.next_token);
    state.next_token += 1;
    state.phase = Phase::AwaitingServerReply {
        request: PendingRequest { token, reset_after },
    };
    token
}

/// Reply lines first, then result cards. Every line except the last is compact.
fn append_reply(state: &mut WidgetState, reply: BotReply) {
    let last = reply.lines.len().saturating_sub(1);
    for (i, text) in reply.lines.into_iter().enumerate() {
        state.transcript.push(TranscriptEntry::Message(Message {
            compact: i < last,
            ..Message::bot(text)
        }));
    }
    state
        .transcript
        .extend(reply.results.into_iter().map(TranscriptEntry::Result));
}
