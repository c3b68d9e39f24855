#![allow(dead_code)]

use std::collections::HashMap;

use axum::body::Body;
use literacy_lab::{config::Config, AppState};
use serde_json::{json, Value};
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GATEWAY_PATH: &str = "/v1/chat/completions";
pub const ARTICLE_PATH: &str = "/article";

/// State whose gateway points at `server`.
pub fn state_for(server: &MockServer) -> AppState {
    state_with(server, &[])
}

/// Like [`state_for`], with extra config keys layered on top.
pub fn state_with(server: &MockServer, overrides: &[(&str, &str)]) -> AppState {
    let gateway_url = format!("{}{}", server.uri(), GATEWAY_PATH);
    let overrides: HashMap<String, String> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = Config::from_lookup(|key| {
        if let Some(value) = overrides.get(key) {
            return Some(value.clone());
        }
        match key {
            "AI_GATEWAY_API_KEY" => Some("test-key".to_string()),
            "AI_GATEWAY_URL" => Some(gateway_url.clone()),
            "FETCH_TIMEOUT_SECS" => Some("5".to_string()),
            "GATEWAY_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        }
    })
    .expect("test config should load");
    AppState::new(config).expect("state should build")
}

/// State that resolves sessions against the auth provider mocked on `server`.
pub fn auth_state(server: &MockServer) -> AppState {
    let auth_url = server.uri();
    state_with(
        server,
        &[("AUTH_URL", auth_url.as_str()), ("AUTH_SIGN_IN_URL", "https://auth.example.org/sign-in")],
    )
}

/// Auth provider knows `token` as user `user_id` with first name `first_name`.
pub async fn mount_auth_user(server: &MockServer, token: &str, user_id: &str, first_name: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(bearer_token(token))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": user_id })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{}", user_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "first_name": first_name, "last_name": null }])),
        )
        .mount(server)
        .await;
}

pub fn session_cookie_header(token: &str) -> String {
    format!("lab_access_token={}", token)
}

pub fn article_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), ARTICLE_PATH)
}

pub fn analysis_json() -> Value {
    json!({
        "type": "misinformation",
        "credibilityScore": "low",
        "emotionalTone": "alarmist",
        "contentType": "Viral post presented as breaking news",
        "credibilityFlags": ["No named sources", "Claims contradict public data"],
        "emotionalTactics": ["Fear appeal", "False urgency"],
        "algorithmFactors": ["Outrage drives shares"],
        "summary": "The post claims a cover-up. None of its claims are sourced."
    })
}

/// Chat-completion envelope carrying `content` as the model's reply.
pub fn gateway_reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
}

pub async fn mount_article(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path(ARTICLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn mount_gateway(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(GATEWAY_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

pub async fn extract_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}
