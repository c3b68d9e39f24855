use serde::{Deserialize, Serialize};
use reqwest::{Client, StatusCode};
use tracing::{error, debug};
use crate::config::Config;
use crate::error::{Result, AppError};

pub const SYSTEM_PROMPT: &str = r#"You are an expert content analyst specializing in digital literacy and misinformation detection.
Analyze the provided article content and return a structured assessment.

Respond with a JSON object containing:
{
  "type": "news" | "ad" | "opinion" | "misinformation" | "satire",
  "credibilityScore": "high" | "medium" | "low",
  "emotionalTone": string,
  "contentType": string (brief description),
  "credibilityFlags": string[] (specific observations about credibility),
  "emotionalTactics": string[] (emotional manipulation techniques used),
  "algorithmFactors": string[] (factors that might affect algorithmic visibility),
  "summary": string (2-3 sentence summary)
}"#;

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Sends the system prompt and `user_content` to the chat-completion gateway and
/// returns the model's free-text reply.
pub async fn call_gateway(client: &Client, config: &Config, user_content: &str) -> Result<String> {
    let body = ChatRequest {
        model: &config.model,
        messages: vec![
            Message { role: "system", content: SYSTEM_PROMPT },
            Message { role: "user", content: user_content },
        ],
        response_format: config.json_mode.then_some(ResponseFormat { kind: "json_object" }),
    };

    let res = client
        .post(&config.gateway_url)
        .bearer_auth(&config.gateway_api_key)
        .timeout(config.gateway_timeout)
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, "AI gateway request failed");
            AppError::Upstream(e.to_string())
        })?;

    let status = res.status();
    if !status.is_success() {
        return Err(match status {
            StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited,
            StatusCode::PAYMENT_REQUIRED => AppError::PaymentRequired,
            _ => {
                let error_text = res.text().await.unwrap_or_default();
                error!(%status, body = %error_text, "AI gateway error");
                AppError::Upstream(format!("gateway returned {}", status))
            }
        });
    }

    let reply: ChatResponse = res.json().await.map_err(|e| {
        error!(error = %e, "AI gateway returned an undecodable body");
        AppError::Upstream(e.to_string())
    })?;

    let content = reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AppError::Upstream("gateway reply has no message content".to_string()))?;

    debug!(chars = content.len(), "AI gateway replied");
    Ok(content)
}
