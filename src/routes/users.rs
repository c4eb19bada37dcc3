use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::auth_dto::{AdminUpdateUserPayload, BulkUserUpdate, UserOut},
    error::Result,
    AppState,
};

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = Vec<UserOut>),
        (status = 403, description = "Admin role required")
    )
)]
#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let users = state.user_service.list().await?;
    Ok(Json(users.into_iter().map(UserOut::from).collect::<Vec<_>>()))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserOut),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get_by_id(id).await?;
    Ok(Json(UserOut::from(user)))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = AdminUpdateUserPayload,
    responses(
        (status = 200, description = "User updated", body = UserOut),
        (status = 400, description = "Invalid payload or role"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use")
    )
)]
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminUpdateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.admin_update(id, payload).await?;
    Ok(Json(UserOut::from(user)))
}

#[utoipa::path(
    put,
    path = "/users/bulk",
    request_body = Vec<BulkUserUpdate>,
    responses(
        (status = 200, description = "Every user updated", body = Vec<UserOut>),
        (status = 400, description = "Invalid item; nothing applied")
    )
)]
#[axum::debug_handler]
pub async fn bulk_update_users(
    State(state): State<AppState>,
    Json(payload): Json<Vec<BulkUserUpdate>>,
) -> Result<impl IntoResponse> {
    for item in &payload {
        item.validate()?;
    }
    let users = state.user_service.bulk_update(payload).await?;
    Ok(Json(users.into_iter().map(UserOut::from).collect::<Vec<_>>()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.user_service.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
