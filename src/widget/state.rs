//! Widget state types

use crate::reply::ResultRecord;
use serde::{Deserialize, Serialize};

pub const GREETING: &str = "Hi there! How would you like the conversation to go?";
pub const GUIDED_QUESTIONS: &str = "Guided Questions";
pub const FREE_FLOW: &str = "Free Flow";
pub const APOLOGY: &str = "Sorry, something went wrong.";
pub const RESET_CONFIRMATION: &str = "Chat reset. Let's start over.";
pub const RESET_KEYWORDS: &[&str] = &[
    "reset",
    "clear",
    "restart",
    "start over",
    "new",
    "new chat",
    "new conversation",
];

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Bot,
}

impl Speaker {
    pub fn as_str(self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Bot => "bot",
        }
    }
}

/// A rendered chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub speaker: Speaker,
    pub text: String,
    /// Rendered without the trailing paragraph gap. Set on every line of a
    /// multi-line bot reply except the last.
    #[serde(default)]
    pub compact: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            compact: false,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Bot,
            text: text.into(),
            compact: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptEntry {
    Message(Message),
    Result(ResultRecord),
}

// ============================================================================
// Conversation phase
// ============================================================================

/// Identifies one outbound request. Issued from a monotonically increasing
/// counter, so a reply can be matched against the request still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(pub u64);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub token: RequestToken,
    /// The submitted text was a reset keyword; restart locally once the
    /// reply has been rendered.
    pub reset_after: bool,
}

/// Where the displayed option set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptionSource {
    /// Fixed set shown with the greeting
    #[default]
    Initial,
    /// Set carried by a server reply
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// Window never opened; no greeting yet
    #[default]
    NotStarted,
    /// Option bubbles displayed, free text locked
    AwaitingSelection {
        options: Vec<String>,
        source: OptionSource,
    },
    /// Request in flight, typing indicator shown
    AwaitingServerReply { request: PendingRequest },
    /// Input enabled and focused
    AwaitingFreeText,
}

impl Phase {
    pub fn options(&self) -> &[String] {
        match self {
            Phase::AwaitingSelection { options, .. } => options,
            _ => &[],
        }
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        match self {
            Phase::AwaitingServerReply { request } => Some(request),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsentGate {
    /// Storage not consulted yet
    #[default]
    Unchecked,
    /// Banner shown, toggle hidden
    Pending,
    Given,
}

/// Complete widget state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WidgetState {
    pub window_open: bool,
    pub consent: ConsentGate,
    pub phase: Phase,
    pub transcript: Vec<TranscriptEntry>,
    /// Next token to hand out
    pub next_token: u64,
}

impl WidgetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text input accepts typing only when nothing else is pending.
    pub fn input_enabled(&self) -> bool {
        matches!(self.phase, Phase::AwaitingFreeText)
    }

    pub fn typing_visible(&self) -> bool {
        matches!(self.phase, Phase::AwaitingServerReply { .. })
    }

    pub fn options(&self) -> &[String] {
        self.phase.options()
    }

    pub fn started(&self) -> bool {
        !matches!(self.phase, Phase::NotStarted)
    }

    pub fn messages(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.transcript.iter().filter_map(|entry| match entry {
            TranscriptEntry::Message(m) => Some(m),
            TranscriptEntry::Result(_) => None,
        })
    }
}

// ============================================================================
// Context
// ============================================================================

/// Whether picking "Free Flow" goes to the server or just unlocks input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreeFlowMode {
    #[default]
    Dispatch,
    LocalUnlock,
}

impl FreeFlowMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "dispatch" | "server" => Some(Self::Dispatch),
            "local" | "local_unlock" | "unlock" => Some(Self::LocalUnlock),
            _ => None,
        }
    }
}

/// Endpoint that receives option selections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionEndpoint {
    /// Initial options go to `set-choice/`, server-provided options to `/chat/`
    #[default]
    Split,
    /// Every selection goes to `set-choice/`
    Choice,
    /// Every selection goes to `/chat/`
    Chat,
}

impl SelectionEndpoint {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "split" | "auto" => Some(Self::Split),
            "choice" | "set-choice" => Some(Self::Choice),
            "chat" => Some(Self::Chat),
            _ => None,
        }
    }
}

/// Fixed conversation script and behavior switches
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetContext {
    pub greeting: String,
    pub initial_options: Vec<String>,
    pub free_flow_label: String,
    pub free_flow: FreeFlowMode,
    pub selection_endpoint: SelectionEndpoint,
    pub apology: String,
    pub reset_confirmation: String,
    pub reset_keywords: Vec<String>,
}

impl Default for WidgetContext {
    fn default() -> Self {
        Self {
            greeting: GREETING.to_string(),
            initial_options: vec![GUIDED_QUESTIONS.to_string(), FREE_FLOW.to_string()],
            free_flow_label: FREE_FLOW.to_string(),
            free_flow: FreeFlowMode::default(),
            selection_endpoint: SelectionEndpoint::default(),
            apology: APOLOGY.to_string(),
            reset_confirmation: RESET_CONFIRMATION.to_string(),
            reset_keywords: RESET_KEYWORDS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl WidgetContext {
    #[must_use]
    pub fn with_free_flow(mut self, mode: FreeFlowMode) -> Self {
        self.free_flow = mode;
        self
    }

    #[must_use]
    pub fn with_selection_endpoint(mut self, endpoint: SelectionEndpoint) -> Self {
        self.selection_endpoint = endpoint;
        self
    }

    /// Case-insensitive match of already-trimmed text against the reset keywords
    pub fn is_reset_keyword(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.reset_keywords.iter().any(|k| k.to_lowercase() == lowered)
    }
}
