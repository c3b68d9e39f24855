use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use serde_json::{Map, Value};

use crate::api::models::AnalyzeResponse;
use crate::error::ErrorResponse;

pub fn success(analysis: Map<String, Value>) -> Response {
    (
        StatusCode::OK,
        Json(AnalyzeResponse {
            success: true,
            analysis,
        }),
    )
        .into_response()
}

pub fn error(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}
