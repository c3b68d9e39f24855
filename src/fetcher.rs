use std::time::Duration;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, warn};
use crate::error::{AppError, Result};

/// Builds the pooled HTTP client shared by the article fetch and the gateway call.
/// Per-call timeouts are applied on each request.
pub fn build_http_client() -> Result<Client> {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Fetches the raw body of `url`. Only transport failures are errors; a non-success
/// status still yields its body.
pub async fn fetch_text(client: &Client, url: &str, timeout: Duration) -> Result<String> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| AppError::UpstreamFetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        warn!(%url, %status, "article responded with non-success status");
    }

    let body = response
        .text()
        .await
        .map_err(|e| AppError::UpstreamFetch(e.to_string()))?;
    debug!(%url, bytes = body.len(), "article fetched");
    Ok(body)
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_user_prompt(url: &str, excerpt: &str) -> String {
    let mut result = String::with_capacity(excerpt.len() + url.len() + 64);
    result.push_str("Analyze this article content:\n\nURL: ");
    result.push_str(url);
    result.push_str("\n\nContent excerpt:\n");
    result.push_str(excerpt);
    result
}
