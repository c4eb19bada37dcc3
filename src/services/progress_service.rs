use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::dto::progress_dto::{ModuleProgressOut, ProgressUpdatePayload, UserProgressResponse};
use crate::error::{Error, Result};
use crate::models::progress::StudentProgress;
use crate::services::workshop_service::fetch_module;

#[derive(Clone)]
pub struct ProgressService {
    pool: PgPool,
}

impl ProgressService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Keeps the furthest substep ever reached and accumulates time across calls.
    #[instrument(skip(self, payload), fields(module_id = %payload.module_id))]
    pub async fn record(&self, user_id: Uuid, payload: ProgressUpdatePayload) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        fetch_module(&mut conn, payload.module_id).await?;
        let substep_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM substeps WHERE module_id = $1")
            .bind(payload.module_id)
            .fetch_one(&mut *conn)
            .await?;
        check_substep_index(payload.substep_position, substep_count)?;

        sqlx::query(
            r#"
            INSERT INTO student_progress (user_id, module_id, highest_substep, time_spent)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, module_id) DO UPDATE
            SET highest_substep = GREATEST(student_progress.highest_substep, EXCLUDED.highest_substep),
                time_spent = student_progress.time_spent + EXCLUDED.time_spent,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(payload.module_id)
        .bind(payload.substep_position)
        .bind(payload.time_spent.unwrap_or(0))
        .execute(&mut *conn)
        .await?;

        debug!(user_id = %user_id, index = payload.substep_position, "progress recorded");
        Ok(())
    }

    pub async fn for_user(&self, user_id: Uuid) -> Result<UserProgressResponse> {
        let rows = sqlx::query_as::<_, StudentProgress>(
            r#"
            SELECT id, user_id, module_id, highest_substep, time_spent, updated_at
            FROM student_progress
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(UserProgressResponse {
            user_id,
            modules: rows.into_iter().map(ModuleProgressOut::from).collect(),
        })
    }
}

/// `index` counts substeps in position order from 0; `-1` means none reached yet.
fn check_substep_index(index: i32, substep_count: i64) -> Result<()> {
    if i64::from(index) >= substep_count {
        return Err(Error::BadRequest(format!(
            "substep_position must be below the module's substep count ({})",
            substep_count
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_must_stay_below_substep_count() {
        assert!(check_substep_index(0, 4).is_ok());
        assert!(check_substep_index(3, 4).is_ok());
        assert!(matches!(check_substep_index(4, 4), Err(Error::BadRequest(_))));
        assert!(matches!(check_substep_index(500, 4), Err(Error::BadRequest(_))));
    }

    #[test]
    fn nothing_reached_is_always_accepted() {
        assert!(check_substep_index(-1, 0).is_ok());
        assert!(check_substep_index(-1, 4).is_ok());
        assert!(check_substep_index(0, 0).is_err());
    }
}
