use sqlx::{PgConnection, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::dto::auth_dto::{AdminUpdateUserPayload, BulkUserUpdate, UpdateProfilePayload};
use crate::error::{Error, Result};
use crate::models::user::{Role, User};

/// `users u JOIN roles r` projection matching [`User`].
pub(crate) const USER_SELECT: &str = r#"
    SELECT u.id, u.email, u.username, u.password_hash, r.name AS role, u.is_active,
           u.profile_picture_url, u.created_at, u.updated_at, u.last_login
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let query = format!("{} ORDER BY u.created_at ASC", USER_SELECT);
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    #[instrument(skip(self, payload), fields(user_id = %id))]
    pub async fn update_profile(&self, id: Uuid, payload: UpdateProfilePayload) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        let changes = AdminUpdateUserPayload {
            email: payload.email,
            username: payload.username,
            profile_picture_url: payload.profile_picture_url,
            role: None,
            is_active: None,
        };
        apply_update(&mut conn, id, &changes).await
    }

    #[instrument(skip(self, payload), fields(user_id = %id))]
    pub async fn admin_update(&self, id: Uuid, payload: AdminUpdateUserPayload) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        apply_update(&mut conn, id, &payload).await
    }

    /// All-or-nothing: the first failing item rolls back every change.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn bulk_update(&self, items: Vec<BulkUserUpdate>) -> Result<Vec<User>> {
        let mut tx = self.pool.begin().await?;
        let mut updated = Vec::with_capacity(items.len());
        for item in &items {
            updated.push(apply_update(&mut tx, item.id, &item.changes).await?);
        }
        tx.commit().await?;
        tracing::info!(count = updated.len(), "bulk user update applied");
        Ok(updated)
    }

    /// Soft delete: the row stays, the account can no longer log in.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("User not found".into()));
        }
        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub(crate) async fn fetch_by_id(conn: &mut PgConnection, id: Uuid) -> Result<User> {
    let query = format!("{} WHERE u.id = $1", USER_SELECT);
    sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".into()))
}

pub(crate) async fn role_id(conn: &mut PgConnection, role: Role) -> Result<i32> {
    let id = sqlx::query_scalar::<_, i32>("SELECT id FROM roles WHERE name = $1")
        .bind(role.as_str())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::Internal(format!("Role '{}' is not seeded", role.as_str())))?;
    Ok(id)
}

pub(crate) async fn ensure_email_free(
    conn: &mut PgConnection,
    email: &str,
    except: Option<Uuid>,
) -> Result<()> {
    let taken = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM users WHERE lower(email) = lower($1) AND ($2::uuid IS NULL OR id <> $2)",
    )
    .bind(email)
    .bind(except)
    .fetch_optional(&mut *conn)
    .await?;
    if taken.is_some() {
        return Err(Error::Conflict("Email already in use".into()));
    }
    Ok(())
}

async fn apply_update(
    conn: &mut PgConnection,
    id: Uuid,
    changes: &AdminUpdateUserPayload,
) -> Result<User> {
    fetch_by_id(conn, id).await?;

    if let Some(email) = changes.email.as_deref() {
        ensure_email_free(conn, email, Some(id)).await?;
    }
    let role_id = match changes.role.as_deref() {
        Some(raw) => {
            let role = Role::parse(raw).ok_or_else(|| Error::BadRequest("Invalid role".into()))?;
            Some(role_id(conn, role).await?)
        }
        None => None,
    };

    sqlx::query(
        r#"
        UPDATE users
        SET
            email = COALESCE($2, email),
            username = COALESCE($3, username),
            profile_picture_url = COALESCE($4, profile_picture_url),
            role_id = COALESCE($5, role_id),
            is_active = COALESCE($6, is_active),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(changes.email.as_deref())
    .bind(changes.username.as_deref())
    .bind(changes.profile_picture_url.as_deref())
    .bind(role_id)
    .bind(changes.is_active)
    .execute(&mut *conn)
    .await?;

    fetch_by_id(conn, id).await
}
