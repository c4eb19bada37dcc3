use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workshop_id: Uuid,
    pub stars: Option<i32>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}
