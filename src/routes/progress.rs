use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        auth_dto::DetailResponse,
        progress_dto::{FeedbackPayload, ProgressUpdatePayload},
    },
    error::{Error, Result},
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/progress",
    request_body = ProgressUpdatePayload,
    responses(
        (status = 204, description = "Progress recorded"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Module not found")
    )
)]
#[axum::debug_handler]
pub async fn record_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ProgressUpdatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .progress_service
        .record(claims.require_user_id()?, payload)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/progress/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Per-module progress", body = UserProgressResponse),
        (status = 403, description = "Students may only read their own progress")
    )
)]
#[axum::debug_handler]
pub async fn get_progress(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    if !claims.is_staff() && claims.require_user_id()? != user_id {
        return Err(Error::Forbidden("forbidden".into()));
    }
    let progress = state.progress_service.for_user(user_id).await?;
    Ok(Json(progress))
}

#[utoipa::path(
    post,
    path = "/feedback",
    request_body = FeedbackPayload,
    responses(
        (status = 201, description = "Feedback stored", body = DetailResponse),
        (status = 400, description = "Stars outside 1..=5"),
        (status = 404, description = "Workshop not found")
    )
)]
#[axum::debug_handler]
pub async fn submit_feedback(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<FeedbackPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .feedback_service
        .submit(claims.require_user_id()?, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(DetailResponse::new("Feedback submitted"))))
}
