use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::Role;
use crate::utils::token::decode_access_token;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }

    pub fn require_user_id(&self) -> Result<Uuid> {
        self.user_id()
            .ok_or_else(|| Error::Unauthorized("invalid_token".into()))
    }

    pub fn is_staff(&self) -> bool {
        self.role().map(|r| r.can_manage_content()).unwrap_or(false)
    }
}

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

/// Decodes the bearer token and checks its role against `allowed` (empty = any role).
async fn require_roles(mut req: Request, next: Next, allowed: &[Role]) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return reject(StatusCode::UNAUTHORIZED, "missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return reject(StatusCode::UNAUTHORIZED, "bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return reject(StatusCode::UNAUTHORIZED, "unsupported_scheme");
    };

    let config = crate::config::get_config();
    match decode_access_token(token, &config.jwt_secret) {
        Ok(claims) => {
            if !allowed.is_empty() && !claims.role().is_some_and(|r| allowed.contains(&r)) {
                return reject(StatusCode::FORBIDDEN, "forbidden");
            }
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => reject(StatusCode::UNAUTHORIZED, "invalid_token"),
    }
}

pub async fn require_bearer_auth(req: Request, next: Next) -> Response {
    require_roles(req, next, &[]).await
}

pub async fn require_trainer_or_admin(req: Request, next: Next) -> Response {
    require_roles(req, next, &[Role::Trainer, Role::Admin]).await
}

pub async fn require_admin(req: Request, next: Next) -> Response {
    require_roles(req, next, &[Role::Admin]).await
}
