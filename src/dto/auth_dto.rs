use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshTokenPayload {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfilePayload {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub username: Option<String>,
    #[validate(length(max = 255))]
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordPayload {
    #[validate(length(min = 1))]
    pub old_password: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordPayload {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordResponse {
    pub detail: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordPayload {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 6))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminUpdateUserPayload {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub username: Option<String>,
    #[validate(length(max = 255))]
    pub profile_picture_url: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkUserUpdate {
    pub id: Uuid,
    #[serde(flatten)]
    #[validate(nested)]
    pub changes: AdminUpdateUserPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOut {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl From<User> for UserOut {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            email: value.email,
            username: value.username,
            role: value.role,
            is_active: value.is_active,
            profile_picture_url: value.profile_picture_url,
            created_at: value.created_at,
            last_login: value.last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_rejects_short_password_and_bad_email() {
        let payload = RegisterPayload {
            email: "not-an-email".into(),
            password: "123".into(),
            username: None,
        };
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn register_ignores_a_requested_role() {
        let raw = serde_json::json!({
            "email": "eve@example.com",
            "password": "secret123",
            "role": "admin"
        });
        let payload: RegisterPayload = serde_json::from_value(raw).unwrap();
        assert!(payload.validate().is_ok());
        let echoed = serde_json::to_value(&payload).unwrap();
        assert!(echoed.get("role").is_none());
    }

    #[test]
    fn bulk_update_reads_flattened_fields() {
        let raw = serde_json::json!({
            "id": "6f1c1c4e-4a48-4c58-9a4c-3f4a7b8a0c11",
            "is_active": false,
            "role": "trainer"
        });
        let item: BulkUserUpdate = serde_json::from_value(raw).unwrap();
        assert_eq!(item.changes.is_active, Some(false));
        assert_eq!(item.changes.role.as_deref(), Some("trainer"));
        assert!(item.validate().is_ok());
    }
}
