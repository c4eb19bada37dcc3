use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    /// 0-based index of the furthest substep reached in position order, `-1` before any.
    /// Always below the module's substep count.
    pub highest_substep: i32,
    /// Seconds.
    pub time_spent: i64,
    pub updated_at: DateTime<Utc>,
}
