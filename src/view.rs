//! View snapshots and render patches
//!
//! The runtime never touches a rendering surface directly. It derives a
//! [`WidgetView`] from the state after every transition, diffs it against the
//! previous one and hands the resulting [`Patch`]es to a [`Renderer`].

pub mod markup;

pub use markup::{format_price, HtmlDocument};

use crate::reply::ResultRecord;
use crate::widget::{ConsentGate, Message, Speaker, TranscriptEntry, WidgetState};

/// Result record prepared for display
#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub name: String,
    pub image: String,
    pub price_label: String,
    pub url: String,
}

impl From<&ResultRecord> for ResultCard {
    fn from(record: &ResultRecord) -> Self {
        Self {
            name: record.name.clone(),
            image: record.image.clone(),
            price_label: format_price(record.current_price),
            url: record.url.clone(),
        }
    }
}

/// One rendered transcript node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Message {
        speaker: Speaker,
        text: String,
        compact: bool,
    },
    ResultCard(ResultCard),
}

impl From<&TranscriptEntry> for Node {
    fn from(entry: &TranscriptEntry) -> Self {
        match entry {
            TranscriptEntry::Message(Message {
                speaker,
                text,
                compact,
            }) => Node::Message {
                speaker: *speaker,
                text: text.clone(),
                compact: *compact,
            },
            TranscriptEntry::Result(record) => Node::ResultCard(record.into()),
        }
    }
}

/// Everything visible about the widget at one instant
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetView {
    pub toggle_visible: bool,
    pub window_visible: bool,
    pub consent_banner_visible: bool,
    pub transcript: Vec<Node>,
    pub options: Vec<String>,
    pub typing_visible: bool,
    pub input_enabled: bool,
}

impl WidgetView {
    pub fn from_state(state: &WidgetState) -> Self {
        let consent_given = state.consent == ConsentGate::Given;
        Self {
            toggle_visible: consent_given && !state.window_open,
            window_visible: state.window_open,
            consent_banner_visible: state.consent == ConsentGate::Pending,
            transcript: state.transcript.iter().map(Node::from).collect(),
            options: state.options().to_vec(),
            typing_visible: state.typing_visible(),
            input_enabled: state.input_enabled(),
        }
    }
}

/// A single change to apply to the rendering surface
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    SetToggleVisible(bool),
    SetWindowVisible(bool),
    SetConsentBannerVisible(bool),
    AppendNode(Node),
    /// Transcript diverged from what is on screen; redraw it entirely
    ReplaceTranscript(Vec<Node>),
    ShowOptions(Vec<String>),
    ClearOptions,
    SetTyping(bool),
    SetInputEnabled(bool),
    ClearInput,
    FocusInput,
    ScrollToBottom,
}

/// Patches that turn `old` into `new`.
///
/// Transcript nodes are appended when `old` is a prefix of `new`, which is
/// always the case for transitions; anything else redraws the transcript.
/// Nodes are emitted before options so result cards land ahead of bubbles.
pub fn diff(old: &WidgetView, new: &WidgetView) -> Vec<Patch> {
    let mut patches = Vec::new();

    if old.consent_banner_visible != new.consent_banner_visible {
        patches.push(Patch::SetConsentBannerVisible(new.consent_banner_visible));
    }
    if old.toggle_visible != new.toggle_visible {
        patches.push(Patch::SetToggleVisible(new.toggle_visible));
    }
    if old.window_visible != new.window_visible {
        patches.push(Patch::SetWindowVisible(new.window_visible));
    }

    if new.transcript.starts_with(&old.transcript) {
        patches.extend(
            new.transcript
                .iter()
                .skip(old.transcript.len())
                .cloned()
                .map(Patch::AppendNode),
        );
    } else {
        patches.push(Patch::ReplaceTranscript(new.transcript.clone()));
    }

    if old.typing_visible != new.typing_visible {
        patches.push(Patch::SetTyping(new.typing_visible));
    }
    if old.options != new.options {
        if new.options.is_empty() {
            patches.push(Patch::ClearOptions);
        } else {
            patches.push(Patch::ShowOptions(new.options.clone()));
        }
    }
    if old.input_enabled != new.input_enabled {
        patches.push(Patch::SetInputEnabled(new.input_enabled));
    }

    patches
}

/// Rendering surface (DOM, HTML document, terminal, ...)
pub trait Renderer {
    fn apply(&mut self, patch: &Patch);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn apply(&mut self, patch: &Patch) {
        (**self).apply(patch);
    }
}
