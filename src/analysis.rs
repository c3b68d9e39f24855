//! The analysis payload and its extraction from a model's free-text reply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::fetcher::{build_user_prompt, excerpt, fetch_text};
use crate::llm::call_gateway;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ContentKind {
    News,
    Ad,
    Opinion,
    Misinformation,
    Satire,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Ad => "ad",
            ContentKind::Opinion => "opinion",
            ContentKind::Misinformation => "misinformation",
            ContentKind::Satire => "satire",
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        [
            ContentKind::News,
            ContentKind::Ad,
            ContentKind::Opinion,
            ContentKind::Misinformation,
            ContentKind::Satire,
        ]
        .into_iter()
        .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("unknown content type: {}", s))
    }
}

impl TryFrom<String> for ContentKind {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum CredibilityScore {
    High,
    Medium,
    Low,
}

impl CredibilityScore {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredibilityScore::High => "high",
            CredibilityScore::Medium => "medium",
            CredibilityScore::Low => "low",
        }
    }

    /// Marker shown next to the score: a check, an info sign or a warning.
    pub fn icon(&self) -> &'static str {
        match self {
            CredibilityScore::High => "✔",
            CredibilityScore::Medium => "ℹ",
            CredibilityScore::Low => "⚠",
        }
    }
}

impl FromStr for CredibilityScore {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        [CredibilityScore::High, CredibilityScore::Medium, CredibilityScore::Low]
            .into_iter()
            .find(|score| score.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown credibility score: {}", s))
    }
}

impl TryFrom<String> for CredibilityScore {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for CredibilityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of a model's analysis, used for rendering. Labels are matched
/// case-insensitively and missing lists read as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub credibility_score: CredibilityScore,
    pub emotional_tone: String,
    pub content_type: String,
    #[serde(default)]
    pub credibility_flags: Vec<String>,
    #[serde(default)]
    pub emotional_tactics: Vec<String>,
    #[serde(default)]
    pub algorithm_factors: Vec<String>,
    pub summary: String,
}

/// An analysis as the model wrote it, plus its typed reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// The object exactly as it appeared in the reply; this is what goes on the wire.
    pub raw: Map<String, Value>,
    pub result: AnalysisResult,
}

impl Analysis {
    fn from_candidate(text: &str) -> std::result::Result<Self, String> {
        let raw: Map<String, Value> = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let result = serde_json::from_value(Value::Object(raw.clone())).map_err(|e| e.to_string())?;
        Ok(Analysis { raw, result })
    }
}

/// Pulls an [`Analysis`] out of a model reply.
///
/// A reply that is exactly one JSON object is parsed directly. Otherwise every
/// brace-balanced object in the text is tried from left to right, ignoring braces
/// inside JSON strings, and the first one with the right shape wins.
pub fn extract_analysis(reply: &str) -> Result<Analysis> {
    let trimmed = reply.trim();
    let mut last_error = match Analysis::from_candidate(trimmed) {
        Ok(analysis) => return Ok(analysis),
        Err(e) => e,
    };

    let mut found_object = false;
    for candidate in json_object_candidates(trimmed) {
        found_object = true;
        match Analysis::from_candidate(candidate) {
            Ok(analysis) => return Ok(analysis),
            Err(e) => last_error = e,
        }
    }

    if !found_object {
        last_error = "no JSON object in model reply".to_string();
    }
    Err(AppError::MalformedModelOutput(last_error))
}

/// Yields each balanced `{...}` span of `text`, one per opening brace.
fn json_object_candidates(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(|&(_, c)| c == '{')
        .filter_map(move |(start, _)| balanced_end(&text[start..]).map(|end| &text[start..start + end]))
}

/// Byte length of the object starting at `text[0] == '{'`, if it closes.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Runs the whole pipeline for one URL: fetch, truncate, ask the gateway, extract.
pub async fn analyze_url(state: &AppState, url: &str) -> Result<Analysis> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::InvalidInput("URL is required".to_string()));
    }
    let config: &Config = &state.config;

    info!(%url, "analyzing article");
    let fetch_start = std::time::Instant::now();
    let body = fetch_text(&state.http, url, config.fetch_timeout).await.map_err(|e| {
        error!(%url, error = ?e, "article fetch failed");
        e
    })?;
    info!(%url, elapsed = ?fetch_start.elapsed(), "article fetched");

    let excerpt = excerpt(&body, config.excerpt_chars);
    let prompt = build_user_prompt(url, excerpt);

    let llm_start = std::time::Instant::now();
    let reply = call_gateway(&state.http, config, &prompt).await?;
    info!(%url, elapsed = ?llm_start.elapsed(), "AI gateway call finished");

    extract_analysis(&reply).map_err(|e| {
        if let AppError::MalformedModelOutput(detail) = &e {
            error!(%url, %detail, "could not parse model reply");
        }
        e
    })
}
