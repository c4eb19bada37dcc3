use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dto::progress_dto::FeedbackPayload;
use crate::error::{Error, Result};
use crate::models::feedback::Feedback;

#[derive(Clone)]
pub struct FeedbackService {
    pool: PgPool,
}

impl FeedbackService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One entry per user and workshop; resubmitting replaces the previous one.
    #[instrument(skip(self, payload), fields(workshop_id = %payload.workshop_id))]
    pub async fn submit(&self, user_id: Uuid, payload: FeedbackPayload) -> Result<Feedback> {
        let known = sqlx::query_scalar::<_, Uuid>("SELECT id FROM workshops WHERE id = $1")
            .bind(payload.workshop_id)
            .fetch_optional(&self.pool)
            .await?;
        if known.is_none() {
            return Err(Error::NotFound("Workshop not found".into()));
        }

        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (user_id, workshop_id, stars, comments)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, workshop_id) DO UPDATE
            SET stars = EXCLUDED.stars,
                comments = EXCLUDED.comments,
                created_at = NOW()
            RETURNING id, user_id, workshop_id, stars, comments, created_at
            "#,
        )
        .bind(user_id)
        .bind(payload.workshop_id)
        .bind(payload.stars)
        .bind(payload.comments.as_deref())
        .fetch_one(&self.pool)
        .await?;

        info!(user_id = %user_id, stars = ?feedback.stars, "feedback submitted");
        Ok(feedback)
    }
}
