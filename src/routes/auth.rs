use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::auth_dto::{
        ChangePasswordPayload, DetailResponse, ForgotPasswordPayload, LoginPayload,
        RefreshTokenPayload, RegisterPayload, ResetPasswordPayload, UpdateProfilePayload, UserOut,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "User registered", body = UserOut),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(UserOut::from(user))))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 401, description = "Incorrect email or password")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let pair = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(pair))
}

#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    request_body = RefreshTokenPayload,
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 401, description = "Unknown, expired or revoked refresh token")
    )
)]
#[axum::debug_handler]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let pair = state.auth_service.refresh(&payload.refresh_token).await?;
    Ok(Json(pair))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = RefreshTokenPayload,
    responses(
        (status = 200, description = "Refresh token revoked", body = DetailResponse)
    )
)]
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.auth_service.logout(&payload.refresh_token).await?;
    Ok(Json(DetailResponse::new("Logged out")))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserOut),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get_by_id(claims.require_user_id()?).await?;
    Ok(Json(UserOut::from(user)))
}

#[utoipa::path(
    put,
    path = "/auth/me",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Profile updated", body = UserOut),
        (status = 409, description = "Email already in use")
    )
)]
#[axum::debug_handler]
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .update_profile(claims.require_user_id()?, payload)
        .await?;
    Ok(Json(UserOut::from(user)))
}

#[utoipa::path(
    put,
    path = "/auth/change-password",
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Password changed", body = DetailResponse),
        (status = 400, description = "Incorrect old password")
    )
)]
#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .auth_service
        .change_password(
            claims.require_user_id()?,
            &payload.old_password,
            &payload.new_password,
        )
        .await?;
    Ok(Json(DetailResponse::new("Password updated successfully")))
}

#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordPayload,
    responses(
        (status = 200, description = "Reset token issued", body = ForgotPasswordResponse),
        (status = 404, description = "Email not registered")
    )
)]
#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let issued = state.auth_service.forgot_password(&payload.email).await?;
    Ok(Json(issued))
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Password reset", body = DetailResponse),
        (status = 400, description = "Invalid, expired or used token")
    )
)]
#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .auth_service
        .reset_password(&payload.token, &payload.new_password)
        .await?;
    Ok(Json(DetailResponse::new("Password has been reset successfully")))
}
