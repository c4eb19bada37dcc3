use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{error::Result, AppState};

#[utoipa::path(
    get,
    path = "/workshops/{id}/stats",
    params(
        ("id" = Uuid, Path, description = "Workshop ID")
    ),
    responses(
        (status = 200, description = "Completion, quiz and feedback summary", body = WorkshopStats),
        (status = 404, description = "Workshop not found")
    )
)]
#[axum::debug_handler]
pub async fn workshop_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let stats = state.stats_service.workshop_stats(id).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/analytics/{id}",
    params(
        ("id" = Uuid, Path, description = "Workshop ID")
    ),
    responses(
        (status = 200, description = "Quiz score and question failure breakdown", body = WorkshopAnalytics),
        (status = 404, description = "Workshop not found")
    )
)]
#[axum::debug_handler]
pub async fn workshop_analytics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let analytics = state.stats_service.analytics(id).await?;
    Ok(Json(analytics))
}
