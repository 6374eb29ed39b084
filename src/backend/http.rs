//! HTTP backend
//!
//! Posts JSON to the endpoints relative to the page URL and forwards the
//! CSRF cookie the page endpoint issued as a request header.

use super::{BackendError, ChatBackend, Endpoint};
use crate::config::BackendConfig;
use crate::reply::{BotReply, OutboundMessage};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Url};
use std::borrow::Cow;
use std::sync::Arc;

/// reqwest-backed implementation of [`ChatBackend`]
pub struct HttpBackend {
    client: Client,
    jar: Arc<Jar>,
    page_url: Url,
    choice_url: Url,
    chat_url: Url,
    csrf_cookie: String,
    csrf_header: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let page_url = Url::parse(&config.page_url)
            .map_err(|e| BackendError::network(format!("Invalid page URL {}: {e}", config.page_url)))?;
        let resolve = |path: &str| {
            page_url
                .join(path)
                .map_err(|e| BackendError::network(format!("Invalid endpoint path {path}: {e}")))
        };
        let choice_url = resolve(&config.choice_path)?;
        let chat_url = resolve(&config.chat_path)?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            jar,
            page_url,
            choice_url,
            chat_url,
            csrf_cookie: config.csrf_cookie.clone(),
            csrf_header: config.csrf_header.clone(),
        })
    }

    /// Load the page once so the server can set the CSRF cookie
    pub async fn bootstrap(&self) -> Result<(), BackendError> {
        let response = self.client.get(self.page_url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::status(
                status.as_u16(),
                format!("Page {} returned {status}", self.page_url),
            ));
        }
        tracing::debug!(
            url = %self.page_url,
            csrf = self.csrf_token().is_some(),
            "Page loaded"
        );
        Ok(())
    }

    /// Current value of the CSRF cookie, if the server has set one
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.page_url)?;
        cookie_value(header.to_str().ok()?, &self.csrf_cookie)
    }

    fn url(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Choice => &self.choice_url,
            Endpoint::Chat => &self.chat_url,
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send(&self, endpoint: Endpoint, message: &str) -> Result<BotReply, BackendError> {
        let url = self.url(endpoint);
        let body = OutboundMessage {
            message: message.to_string(),
        };

        let mut request = self.client.post(url.clone()).json(&body);
        if let Some(token) = self.csrf_token() {
            request = request.header(self.csrf_header.as_str(), token);
        }

        tracing::debug!(endpoint = endpoint.as_str(), %url, "Posting message");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::status(
                status.as_u16(),
                format!("{url} returned {status}: {text}"),
            ));
        }

        serde_json::from_str(&text)
            .map_err(|e| BackendError::parse(format!("Invalid reply from {url}: {e}")))
    }
}

/// Percent-decoded value of `name` in a `Cookie` header (`a=1; b=2`).
/// A value that does not decode to UTF-8 is returned as sent.
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| {
            urlencoding::decode(value).map_or_else(|_| value.to_string(), Cow::into_owned)
        })
    })
}
