//! URL fetch utility.
//!
//! Retrieves a page and reduces HTML to readable text so the calling agent
//! can extract entities from it. Fetches target arbitrary third-party
//! servers, so they are attempted once rather than enrolled in the backend
//! read-retry policy.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::Config;
use crate::error::GatewayError;
use crate::validate::check_url;

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:script|style)[^>]*>.*?</(?:script|style)\s*>").unwrap()
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Result of fetching one URL.
#[derive(Debug, Serialize)]
pub struct FetchOutcome {
    pub text: String,
    pub char_count: usize,
    pub metadata: FetchMetadata,
    pub source_url: String,
}

/// Transport-level details of the fetch.
#[derive(Debug, Serialize)]
pub struct FetchMetadata {
    pub content_type: String,
    pub status_code: u16,
}

/// HTTP client for the `fetch_url_content` tool.
#[derive(Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    max_chars: usize,
}

impl FetchClient {
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.policy.fetch_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            max_chars: config.policy.max_content_chars,
        })
    }

    /// Fetch a URL and extract clean text from it.
    pub async fn fetch(&self, raw_url: &str) -> Result<FetchOutcome, GatewayError> {
        let url = check_url(raw_url)?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest("fetch_url", e))?;
        let resp = super::check_status("fetch_url", resp).await?;

        let status_code = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::from_reqwest("fetch_url", e))?;

        let text = if content_type.contains("text/html") {
            html_to_text(&body)
        } else {
            body
        };
        let text = truncate_chars(text, self.max_chars);

        Ok(FetchOutcome {
            char_count: text.chars().count(),
            text,
            metadata: FetchMetadata {
                content_type,
                status_code,
            },
            source_url: raw_url.to_string(),
        })
    }
}

/// Reduce an HTML document to plain text: drop script/style blocks, strip
/// tags, collapse whitespace.
fn html_to_text(html: &str) -> String {
    let text = SCRIPT_STYLE_RE.replace_all(html, "");
    let text = TAG_RE.replace_all(&text, " ");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Cap a string at `max` characters without splitting a code point.
fn truncate_chars(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        text
    } else {
        text.chars().take(max).collect()
    }
}
