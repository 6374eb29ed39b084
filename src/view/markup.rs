//! HTML markup for the widget
//!
//! Produces the same element ids and classes the widget's stylesheet targets.
//! All server-provided text is escaped.

use super::{Node, Patch, Renderer, ResultCard};
use crate::widget::Speaker;
use std::fmt::Write as _;

/// Format an amount as Indian rupees with en-IN digit grouping
/// (`1999` -> `Rs. 1,999`, `100000` -> `Rs. 1,00,000`). At most two decimals
/// are kept and trailing zeros dropped.
pub fn format_price(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("Rs. {amount}");
    }

    // Rounded to paise; prices are far below u64 range
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let paise = (amount.abs() * 100.0).round() as u64;
    let (whole, fraction) = (paise / 100, paise % 100);

    let mut out = String::from("Rs. ");
    if amount < 0.0 && paise > 0 {
        out.push('-');
    }
    out.push_str(&group_indian(whole));
    if fraction != 0 {
        if fraction % 10 == 0 {
            let _ = write!(out, ".{}", fraction / 10);
        } else {
            let _ = write!(out, ".{fraction:02}");
        }
    }
    out
}

/// Last three digits, then groups of two
fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);

    let mut out = String::with_capacity(digits.len() + digits.len() / 2);
    let len = head.len();
    for (i, c) in head.chars().enumerate() {
        if i > 0 && (len - i) % 2 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push(',');
    out.push_str(tail);
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_node(node: &Node) -> String {
    match node {
        Node::Message {
            speaker,
            text,
            compact,
        } => {
            let spacing = if *compact { " m-0" } else { "" };
            let align = if *speaker == Speaker::User { " text-end" } else { "" };
            format!(
                r#"<div class="message {}{spacing}"><div class="bubble px-4 py-2{align}">{}</div></div>"#,
                speaker.as_str(),
                escape_html(text),
            )
        }
        Node::ResultCard(card) => render_card(card),
    }
}

fn render_card(card: &ResultCard) -> String {
    let name = escape_html(&card.name);
    format!(
        r#"<div class="result-card"><a href="{}" target="_blank" rel="noopener"><img src="{}" alt="{name}"><div class="result-name">{name}</div><div class="result-price">{}</div></a></div>"#,
        escape_html(&card.url),
        escape_html(&card.image),
        escape_html(&card.price_label),
    )
}

fn render_option(label: &str) -> String {
    format!(r#"<div class="option-bubble">{}</div>"#, escape_html(label))
}

/// In-memory widget document kept in sync through patches
#[derive(Debug, Clone, Default)]
pub struct HtmlDocument {
    pub toggle_visible: bool,
    pub window_visible: bool,
    pub consent_banner_visible: bool,
    /// Rendered transcript nodes in order
    pub nodes: Vec<String>,
    pub options: Vec<String>,
    pub typing_visible: bool,
    pub input_enabled: bool,
    pub input_value: String,
    pub input_focused: bool,
    pub scrolled_to_bottom: bool,
}

impl HtmlDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user typing into the input box
    pub fn type_text(&mut self, text: &str) {
        if self.input_enabled {
            self.input_value = text.to_string();
        }
    }

    pub fn to_html(&self) -> String {
        let hidden = |visible: bool| if visible { "" } else { " d-none" };
        let mut html = String::new();

        let _ = write!(
            html,
            r#"<div id="consent-banner" class="consent-banner{}"><button id="consent-accept">Accept</button></div>"#,
            hidden(self.consent_banner_visible)
        );
        let _ = write!(
            html,
            r#"<button id="chat-toggle-button" class="chat-toggle{}"></button>"#,
            if self.toggle_visible { "" } else { " hide" }
        );
        let _ = write!(
            html,
            r#"<div id="chat-window" class="chat-window{}"><div id="chat-body"><div id="chat-messages">{}</div>"#,
            if self.window_visible { " show" } else { "" },
            self.nodes.concat()
        );
        let _ = write!(
            html,
            r#"<div id="typing-indicator" class="typing{}"></div>"#,
            hidden(self.typing_visible)
        );
        let _ = write!(
            html,
            r#"<div id="chat-options" style="display: {}">{}</div></div>"#,
            if self.options.is_empty() { "none" } else { "flex" },
            self.options.iter().map(|o| render_option(o)).collect::<String>()
        );
        let _ = write!(
            html,
            r#"<form id="chat-form"><input id="chat-input" value="{}"{}></form></div>"#,
            escape_html(&self.input_value),
            if self.input_enabled { "" } else { " disabled" }
        );
        html
    }
}

impl Renderer for HtmlDocument {
    fn apply(&mut self, patch: &Patch) {
        match patch {
            Patch::SetToggleVisible(v) => self.toggle_visible = *v,
            Patch::SetWindowVisible(v) => self.window_visible = *v,
            Patch::SetConsentBannerVisible(v) => self.consent_banner_visible = *v,
            Patch::AppendNode(node) => self.nodes.push(render_node(node)),
            Patch::ReplaceTranscript(nodes) => {
                self.nodes = nodes.iter().map(render_node).collect();
            }
            Patch::ShowOptions(options) => self.options.clone_from(options),
            Patch::ClearOptions => self.options.clear(),
            Patch::SetTyping(v) => self.typing_visible = *v,
            Patch::SetInputEnabled(v) => {
                self.input_enabled = *v;
                if !*v {
                    self.input_focused = false;
                }
            }
            Patch::ClearInput => self.input_value.clear(),
            Patch::FocusInput => self.input_focused = self.input_enabled,
            Patch::ScrollToBottom => self.scrolled_to_bottom = true,
        }
    }
}
