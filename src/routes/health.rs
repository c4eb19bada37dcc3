use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Liveness only; the database is not probed.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up")
    )
)]
#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
