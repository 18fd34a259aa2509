//! # Reply API client
//!
//! Sends user text to the reply endpoint as a single percent-encoded query parameter and extracts the
//! `reply` field from the JSON body.
//!
//! ## Example
//!
//! ```rust,no_run
//! use reply_client::{ReplyClient, DEFAULT_REPLY_API_URL};
//! use std::time::Duration;
//!
//! async fn example() -> Result<(), reply_client::ReplyClientError> {
//!     let client = ReplyClient::new(DEFAULT_REPLY_API_URL, Duration::from_secs(30))?;
//!     let reply = client.fetch_reply("Hi how are you").await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure classes
//!
//! - [`ReplyClientError::Network`]: connect error, timeout, or non-2xx status.
//! - [`ReplyClientError::MalformedResponse`]: body is not a JSON object.
//! - [`ReplyClientError::EmptyReply`]: `reply` missing, null, or blank.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// Endpoint template; `{}` is replaced by the percent-encoded user text.
pub const DEFAULT_REPLY_API_URL: &str = "https://legendxdata.site/Api/gpt/wormgpt.php?q={}";
/// Placeholder substituted by [`build_request_url`].
pub const QUERY_PLACEHOLDER: &str = "{}";

#[derive(Error, Debug)]
pub enum ReplyClientError {
    #[error("URL template must contain '{{}}': {0}")]
    InvalidTemplate(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to reply API failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("reply API returned an invalid response: {0}")]
    MalformedResponse(String),

    #[error("reply API returned an empty reply")]
    EmptyReply,
}

/// Percent-encodes `text` and substitutes it for the first `{}` in `template`.
pub fn build_request_url(template: &str, text: &str) -> String {
    template.replacen(QUERY_PLACEHOLDER, &urlencoding::encode(text), 1)
}

/// Extracts the reply text from a response body.
pub fn parse_reply(body: &str) -> Result<String, ReplyClientError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ReplyClientError::MalformedResponse(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(ReplyClientError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    };
    match fields.remove("reply") {
        None | Some(Value::Null) => Err(ReplyClientError::EmptyReply),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ReplyClientError::EmptyReply),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ReplyClientError::MalformedResponse(format!(
            "'reply' is not a string: {}",
            other
        ))),
    }
}

/// Client for the reply endpoint. Cheap to clone; holds one connection pool.
#[derive(Debug, Clone)]
pub struct ReplyClient {
    client: Client,
    url_template: String,
}

impl ReplyClient {
    /// Builds a client for `url_template` with a per-request `timeout`.
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, ReplyClientError> {
        let url_template = url_template.into();
        if !url_template.contains(QUERY_PLACEHOLDER) {
            return Err(ReplyClientError::InvalidTemplate(url_template));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ReplyClientError::Client)?;
        Ok(Self {
            client,
            url_template,
        })
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Full request URL for `text`.
    pub fn request_url(&self, text: &str) -> String {
        build_request_url(&self.url_template, text)
    }

    /// GETs the endpoint for `text` and returns the non-empty `reply` field.
    pub async fn fetch_reply(&self, text: &str) -> Result<String, ReplyClientError> {
        let url = self.request_url(text);
        info!(url = %url, "Sending request to reply API");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(ReplyClientError::Network)?;
        let status = response.status();
        let body = response.text().await.map_err(ReplyClientError::Network)?;
        debug!(status = %status, body_len = body.len(), "Reply API responded");

        parse_reply(&body)
    }
}
