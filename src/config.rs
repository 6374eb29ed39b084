//! Widget configuration
//!
//! Defaults reproduce the stock widget; every knob can be overridden from the
//! environment by the host binary.

use crate::widget::{FreeFlowMode, SelectionEndpoint, WidgetContext};
use std::path::PathBuf;
use std::time::Duration;

/// Default page URL the endpoint paths are resolved against
pub const DEFAULT_PAGE_URL: &str = "http://127.0.0.1:8000/";

/// Storage key holding the consent flag
pub const DEFAULT_CONSENT_KEY: &str = "chat_consent";

/// Transport settings for the HTTP backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Page the widget is embedded in. Endpoint paths are joined onto it the
    /// same way a browser resolves relative URLs.
    pub page_url: String,
    pub choice_path: String,
    pub chat_path: String,
    pub csrf_cookie: String,
    pub csrf_header: String,
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            choice_path: "set-choice/".to_string(),
            chat_path: "/chat/".to_string(),
            csrf_cookie: "csrftoken".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Complete widget configuration
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub context: WidgetContext,
    pub backend: BackendConfig,
    /// File backing the client-local key/value storage
    pub storage_path: PathBuf,
    pub consent_key: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            context: WidgetContext::default(),
            backend: BackendConfig::default(),
            storage_path: default_storage_path(),
            consent_key: DEFAULT_CONSENT_KEY.to_string(),
        }
    }
}

impl WidgetConfig {
    /// Build a configuration from `CHAT_WIDGET_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = var("CHAT_WIDGET_URL") {
            config.backend.page_url = url;
        }
        if let Some(path) = var("CHAT_WIDGET_STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }
        if let Some(value) = var("CHAT_WIDGET_TIMEOUT_SECS") {
            match value.trim().parse::<u64>() {
                Ok(secs) => config.backend.timeout = Duration::from_secs(secs),
                Err(_) => tracing::warn!(%value, "Ignoring invalid CHAT_WIDGET_TIMEOUT_SECS"),
            }
        }
        if let Some(value) = var("CHAT_WIDGET_FREE_FLOW") {
            match FreeFlowMode::parse(&value) {
                Some(mode) => config.context.free_flow = mode,
                None => tracing::warn!(%value, "Ignoring unknown CHAT_WIDGET_FREE_FLOW"),
            }
        }
        if let Some(value) = var("CHAT_WIDGET_SELECTION_ENDPOINT") {
            match SelectionEndpoint::parse(&value) {
                Some(endpoint) => config.context.selection_endpoint = endpoint,
                None => tracing::warn!(%value, "Ignoring unknown CHAT_WIDGET_SELECTION_ENDPOINT"),
            }
        }

        config
    }
}

fn default_storage_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(format!("{home}/.chat-widget/storage.json"))
}
