use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::dto::auth_dto::{ForgotPasswordResponse, RegisterPayload, TokenPair};
use crate::error::{Error, Result};
use crate::models::auth_token::{PasswordResetToken, RefreshToken};
use crate::models::user::{Role, User};
use crate::services::user_service::{ensure_email_free, fetch_by_id, role_id, USER_SELECT};
use crate::utils::crypto::{hash_password, hash_token, verify_password};
use crate::utils::time::minutes_from_now;
use crate::utils::token::{generate_opaque_token, issue_access_token, OPAQUE_TOKEN_LEN};

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    jwt_secret: String,
    access_token_minutes: i64,
    refresh_token_minutes: i64,
    reset_token_minutes: i64,
}

impl AuthService {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            access_token_minutes: config.access_token_expire_minutes,
            refresh_token_minutes: config.refresh_token_expire_minutes,
            reset_token_minutes: config.reset_token_expire_minutes,
        }
    }

    /// Self-registration always yields a student; other roles are granted by an admin.
    #[instrument(skip(self, payload), fields(email = %payload.email))]
    pub async fn register(&self, payload: RegisterPayload) -> Result<User> {
        let mut tx = self.pool.begin().await?;
        ensure_email_free(&mut tx, &payload.email, None).await?;
        let role_id = role_id(&mut tx, Role::Student).await?;
        let password_hash = hash_password(&payload.password)?;
        let user = insert_user(
            &mut tx,
            &payload.email,
            payload.username.as_deref(),
            &password_hash,
            role_id,
        )
        .await?;
        tx.commit().await?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let invalid = || Error::Unauthorized("Incorrect email or password".into());

        let query = format!("{} WHERE lower(u.email) = lower($1)", USER_SELECT);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash)? || !user.is_active {
            warn!(user_id = %user.id, "rejected login");
            return Err(invalid());
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        let pair = self.issue_tokens(&mut tx, &user).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "user logged in");
        Ok(pair)
    }

    /// Exchanges a live refresh token for a new pair; the presented token is revoked.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let mut tx = self.pool.begin().await?;
        let stored = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, revoked_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > NOW()
            FOR UPDATE
            "#,
        )
        .bind(hash_token(refresh_token))
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::Unauthorized("Invalid refresh token".into()))?;

        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE id = $1")
            .bind(stored.id)
            .execute(&mut *tx)
            .await?;

        let user = fetch_by_id(&mut tx, stored.user_id).await?;
        if !user.is_active {
            return Err(Error::Unauthorized("Account is disabled".into()));
        }
        let pair = self.issue_tokens(&mut tx, &user).await?;
        tx.commit().await?;
        Ok(pair)
    }

    /// Idempotent: unknown or already revoked tokens are ignored.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(hash_token(refresh_token))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let user = fetch_by_id(&mut conn, user_id).await?;
        if !verify_password(old_password, &user.password_hash)? {
            return Err(Error::BadRequest("Incorrect old password".into()));
        }
        set_password(&mut conn, user_id, new_password).await?;
        info!(user_id = %user_id, "password changed");
        Ok(())
    }

    /// No mailer is wired in: the reset token goes back to the caller.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordResponse> {
        let user_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Email not registered".into()))?;

        let token = generate_opaque_token(OPAQUE_TOKEN_LEN);
        let expires_at = minutes_from_now(self.reset_token_minutes);
        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        info!(user_id = %user_id, "password reset token issued");
        Ok(ForgotPasswordResponse {
            detail: "Password reset link sent".into(),
            token,
            expires_at,
        })
    }

    /// Single use; also revokes every refresh token of the user.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let stored = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, used_at, created_at
            FROM password_reset_tokens
            WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
            FOR UPDATE
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::BadRequest("Invalid token".into()))?;

        set_password(&mut tx, stored.user_id, new_password).await?;
        sqlx::query("UPDATE password_reset_tokens SET used_at = NOW() WHERE id = $1")
            .bind(stored.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
            .bind(stored.user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(user_id = %stored.user_id, "password reset");
        Ok(())
    }

    /// Creates the configured admin account on first start.
    pub async fn bootstrap_admin(&self, email: Option<&str>, password: Option<&str>) -> Result<()> {
        let (Some(email), Some(password)) = (email, password) else {
            return Ok(());
        };
        let mut tx = self.pool.begin().await?;
        match ensure_email_free(&mut tx, email, None).await {
            Ok(()) => {}
            Err(Error::Conflict(_)) => return Ok(()),
            Err(err) => return Err(err),
        }
        let role_id = role_id(&mut tx, Role::Admin).await?;
        let password_hash = hash_password(password)?;
        let admin = insert_user(&mut tx, email, None, &password_hash, role_id).await?;
        tx.commit().await?;
        info!(user_id = %admin.id, "bootstrap admin created");
        Ok(())
    }

    async fn issue_tokens(&self, conn: &mut PgConnection, user: &User) -> Result<TokenPair> {
        let access_token = issue_access_token(
            user.id,
            &user.email,
            &user.role,
            &self.jwt_secret,
            self.access_token_minutes,
        )?;
        let refresh_token = generate_opaque_token(OPAQUE_TOKEN_LEN);
        sqlx::query("INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(hash_token(&refresh_token))
            .bind(minutes_from_now(self.refresh_token_minutes))
            .execute(&mut *conn)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer".into(),
        })
    }
}

async fn insert_user(
    conn: &mut PgConnection,
    email: &str,
    username: Option<&str>,
    password_hash: &str,
    role_id: i32,
) -> Result<User> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO users (email, username, password_hash, role_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .bind(role_id)
    .fetch_one(&mut *conn)
    .await?;
    fetch_by_id(conn, id).await
}

async fn set_password(conn: &mut PgConnection, user_id: Uuid, new_password: &str) -> Result<()> {
    let password_hash = hash_password(new_password)?;
    let res = sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *conn)
        .await?;
    if res.rows_affected() == 0 {
        return Err(Error::NotFound("User not found".into()));
    }
    Ok(())
}
