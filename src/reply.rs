//! Server reply wire types
//!
//! Both endpoints answer with the same loosely shaped JSON object. The text
//! may arrive under `message`, `reply` or `response`, as a single string or a
//! list of lines. Extra keys (e.g. `success`) are ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// Request body sent to every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub message: String,
}

/// One product-like record rendered as a result card
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultRecord {
    pub name: String,
    pub image: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub current_price: f64,
    pub url: String,
}

/// Normalized bot reply
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "WireReply")]
pub struct BotReply {
    /// Reply text, one entry per rendered line
    pub lines: Vec<String>,
    pub options: Vec<String>,
    pub results: Vec<ResultRecord>,
}

impl BotReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_results(mut self, results: Vec<ResultRecord>) -> Self {
        self.results = results;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplyText {
    One(String),
    Many(Vec<String>),
}

impl From<ReplyText> for Vec<String> {
    fn from(text: ReplyText) -> Self {
        match text {
            ReplyText::One(line) => vec![line],
            ReplyText::Many(lines) => lines,
        }
    }
}

#[derive(Deserialize)]
struct WireReply {
    #[serde(default)]
    message: Option<ReplyText>,
    #[serde(default)]
    reply: Option<ReplyText>,
    #[serde(default)]
    response: Option<ReplyText>,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    results: Option<Vec<ResultRecord>>,
}

impl From<WireReply> for BotReply {
    fn from(wire: WireReply) -> Self {
        let lines = wire
            .message
            .or(wire.reply)
            .or(wire.response)
            .map(Vec::from)
            .unwrap_or_default();

        Self {
            lines,
            options: wire.options.unwrap_or_default(),
            results: wire.results.unwrap_or_default(),
        }
    }
}

/// Accepts a JSON number or a numeric string (decimal fields are often
/// serialized as strings). Anything else is a parse error.
fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Price {
        Number(f64),
        Text(String),
    }

    match Price::deserialize(deserializer)? {
        Price::Number(n) => Ok(n),
        Price::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid price: {s:?}"))),
    }
}
