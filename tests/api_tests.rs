//! Integration tests for the analysis endpoint, with the article site and the AI
//! gateway mocked by wiremock.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use literacy_lab::api::routes::create_router;
use serde_json::{json, Value};
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot`
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

fn analyze_request(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/analyze-article")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn returns_exactly_the_model_object() {
    let server = MockServer::start().await;
    mount_article(&server, "<html><body><p>Shocking truth</p></body></html>").await;
    let reply = format!(
        "Here is my assessment:\n```json\n{}\n```",
        serde_json::to_string_pretty(&analysis_json()).unwrap()
    );
    mount_gateway(&server, ResponseTemplate::new(200).set_body_json(gateway_reply(&reply))).await;

    let app = create_router(state_for(&server));
    let response = app
        .oneshot(analyze_request(json!({ "url": article_url(&server) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["analysis"], analysis_json());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn model_object_is_relayed_untouched() {
    let server = MockServer::start().await;
    mount_article(&server, "article text").await;
    let object = json!({
        "type": "news",
        "credibilityScore": "Medium",
        "emotionalTone": "neutral",
        "contentType": "Local news report",
        "credibilityFlags": ["Quotes officials"],
        "emotionalTactics": [],
        "summary": "A council vote is reported. Sources are named.",
        "confidence": 0.8
    });
    mount_gateway(
        &server,
        ResponseTemplate::new(200).set_body_json(gateway_reply(&format!("Result: {}", object))),
    )
    .await;

    let app = create_router(state_for(&server));
    let response = app
        .oneshot(analyze_request(json!({ "url": article_url(&server) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["analysis"], object);
    assert!(body["analysis"].get("algorithmFactors").is_none());
}

async fn analyze_against(server: &MockServer, app: axum::Router) -> (StatusCode, Value) {
    let response = app
        .oneshot(analyze_request(json!({ "url": article_url(server) })))
        .await
        .unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

#[tokio::test]
async fn empty_choices_is_an_analysis_failure() {
    let server = MockServer::start().await;
    mount_article(&server, "article text").await;
    mount_gateway(&server, ResponseTemplate::new(200).set_body_json(json!({ "choices": [] }))).await;

    let (status, body) = analyze_against(&server, create_router(state_for(&server))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AI analysis failed");
}

#[tokio::test]
async fn undecodable_gateway_body_is_an_analysis_failure() {
    let server = MockServer::start().await;
    mount_article(&server, "article text").await;
    mount_gateway(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

    let (status, body) = analyze_against(&server, create_router(state_for(&server))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AI analysis failed");
}

#[tokio::test]
async fn slow_gateway_times_out() {
    let server = MockServer::start().await;
    mount_article(&server, "article text").await;
    mount_gateway(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(gateway_reply(&analysis_json().to_string()))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let state = state_with(&server, &[("GATEWAY_TIMEOUT_SECS", "1")]);
    let (status, body) = analyze_against(&server, create_router(state)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AI analysis failed");
}

#[tokio::test]
async fn json_mode_requests_a_json_object() {
    let server = MockServer::start().await;
    mount_article(&server, "article text").await;
    mount_gateway(
        &server,
        ResponseTemplate::new(200).set_body_json(gateway_reply(&analysis_json().to_string())),
    )
    .await;

    let state = state_with(&server, &[("AI_JSON_MODE", "true")]);
    let (status, _) = analyze_against(&server, create_router(state)).await;
    assert_eq!(status, StatusCode::OK);

    let requests = server.received_requests().await.unwrap();
    let gateway_call = requests
        .iter()
        .find(|r| r.url.path() == GATEWAY_PATH)
        .expect("gateway should be called");
    let sent: Value = serde_json::from_slice(&gateway_call.body).unwrap();
    assert_eq!(sent["response_format"], json!({ "type": "json_object" }));
}

#[tokio::test]
async fn gateway_receives_prompt_with_truncated_excerpt() {
    let server = MockServer::start().await;
    let article = format!("{}{}", "a".repeat(3000), "b".repeat(2000));
    mount_article(&server, &article).await;
    mount_gateway(
        &server,
        ResponseTemplate::new(200).set_body_json(gateway_reply(&analysis_json().to_string())),
    )
    .await;

    let app = create_router(state_for(&server));
    let url = article_url(&server);
    let response = app.oneshot(analyze_request(json!({ "url": url }))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let requests = server.received_requests().await.unwrap();
    let gateway_call = requests
        .iter()
        .find(|r| r.url.path() == GATEWAY_PATH)
        .expect("gateway should be called");

    assert_eq!(
        gateway_call.headers.get("authorization").unwrap(),
        "Bearer test-key"
    );
    let sent: Value = serde_json::from_slice(&gateway_call.body).unwrap();
    assert_eq!(sent["model"], "google/gemini-2.5-flash");
    assert_eq!(sent["messages"][0]["role"], "system");
    assert!(sent["messages"][0]["content"].as_str().unwrap().contains("credibilityScore"));

    let user = sent["messages"][1]["content"].as_str().unwrap();
    assert!(user.starts_with(&format!("Analyze this article content:\n\nURL: {}", url)));
    assert!(user.ends_with(&"a".repeat(3000)));
    assert!(!user.contains('b'));
    assert!(sent.get("response_format").is_none());
}

#[tokio::test]
async fn reply_without_json_is_an_error() {
    let server = MockServer::start().await;
    mount_article(&server, "article text").await;
    mount_gateway(
        &server,
        ResponseTemplate::new(200).set_body_json(gateway_reply("Sorry, I can't help with that.")),
    )
    .await;

    let app = create_router(state_for(&server));
    let response = app
        .oneshot(analyze_request(json!({ "url": article_url(&server) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Failed to parse AI response");
    assert!(body.get("analysis").is_none());
}

#[tokio::test]
async fn incomplete_json_is_never_partially_returned() {
    let server = MockServer::start().await;
    mount_article(&server, "article text").await;
    mount_gateway(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(gateway_reply(r#"{"type": "news", "credibilityScore": "high"}"#)),
    )
    .await;

    let app = create_router(state_for(&server));
    let response = app
        .oneshot(analyze_request(json!({ "url": article_url(&server) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());
    assert!(body.get("analysis").is_none());
}

#[tokio::test]
async fn gateway_429_maps_to_rate_limit() {
    let server = MockServer::start().await;
    mount_article(&server, "article text").await;
    mount_gateway(&server, ResponseTemplate::new(429)).await;

    let app = create_router(state_for(&server));
    let response = app
        .oneshot(analyze_request(json!({ "url": article_url(&server) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("Rate limit"));
}

#[tokio::test]
async fn gateway_402_maps_to_payment_required() {
    let server = MockServer::start().await;
    mount_article(&server, "article text").await;
    mount_gateway(&server, ResponseTemplate::new(402)).await;

    let app = create_router(state_for(&server));
    let response = app
        .oneshot(analyze_request(json!({ "url": article_url(&server) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("Payment required"));
}

#[tokio::test]
async fn other_gateway_failures_are_generic() {
    let server = MockServer::start().await;
    mount_article(&server, "article text").await;
    mount_gateway(&server, ResponseTemplate::new(503).set_body_string("upstream overloaded")).await;

    let app = create_router(state_for(&server));
    let response = app
        .oneshot(analyze_request(json!({ "url": article_url(&server) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "AI analysis failed");
}

#[tokio::test]
async fn missing_url_is_rejected_before_any_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GATEWAY_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = create_router(state_for(&server));
    for body in [json!({}), json!({ "url": "" }), json!({ "url": "   " })] {
        let response = app.clone().oneshot(analyze_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["error"], "URL is required");
    }

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/analyze-article")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unreachable_article_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GATEWAY_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = create_router(state_for(&server));
    let response = app
        .oneshot(analyze_request(json!({ "url": "http://127.0.0.1:1/nowhere" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Failed to fetch article");
    assert!(!body.to_string().contains("127.0.0.1"));
}

#[tokio::test]
async fn non_success_article_body_is_still_analyzed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ARTICLE_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("<h1>Not found</h1>"))
        .mount(&server)
        .await;
    mount_gateway(
        &server,
        ResponseTemplate::new(200).set_body_json(gateway_reply(&analysis_json().to_string())),
    )
    .await;

    let app = create_router(state_for(&server));
    let response = app
        .oneshot(analyze_request(json!({ "url": article_url(&server) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn preflight_allows_any_origin() {
    let server = MockServer::start().await;
    let app = create_router(state_for(&server));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/analyze-article")
        .header(header::ORIGIN, "https://lab.example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn health_reports_service() {
    let server = MockServer::start().await;
    let app = create_router(state_for(&server));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "literacy-lab");
}
