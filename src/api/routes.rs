use axum::{
    routing::{get, post},
    Router,
    extract::{Json, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, error};

use crate::analysis::analyze_url;
use crate::api::models::{AnalyzeRequest, HealthResponse};
use crate::api::response;
use crate::error::AppError;
use crate::ui::pages;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/analyze-article", post(analyze_handler))
        .route("/health", get(health_handler))
        .route("/", get(pages::index).post(pages::index_submit))
        .route("/verify", get(pages::verify_form).post(pages::verify_submit))
        .route("/feed", get(pages::feed))
        .route("/auth/callback", get(pages::auth_callback))
        .route("/auth/sign-out", post(pages::sign_out))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn analyze_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let url = match payload {
        Ok(Json(req)) => req.url.unwrap_or_default(),
        Err(rejection) => {
            warn!(error = %rejection, "unreadable analyze request");
            return AppError::InvalidInput("URL is required".to_string()).into_response();
        }
    };

    let start_time = std::time::Instant::now();
    let result = analyze_url(&state, &url).await;
    let elapsed = start_time.elapsed();

    match result {
        Ok(analysis) => {
            info!(%url, ?elapsed, kind = %analysis.result.kind, "article analyzed");
            response::success(analysis.raw)
        }
        Err(err) => {
            match &err {
                AppError::InvalidInput(msg) => warn!(%msg, "rejected analyze request"),
                AppError::RateLimited | AppError::PaymentRequired => {
                    warn!(%url, ?elapsed, error = %err, "AI gateway quota error")
                }
                _ => error!(%url, ?elapsed, error = ?err, "Article analysis error"),
            }
            err.into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
