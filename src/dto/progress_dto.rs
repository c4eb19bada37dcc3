use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::progress::StudentProgress;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProgressUpdatePayload {
    pub module_id: Uuid,
    /// 0-based index into the module's substeps ordered by position.
    #[validate(range(min = -1))]
    pub substep_position: i32,
    #[validate(range(min = 0))]
    pub time_spent: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleProgressOut {
    pub module_id: Uuid,
    pub highest_substep: i32,
    pub time_spent: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgressResponse {
    pub user_id: Uuid,
    pub modules: Vec<ModuleProgressOut>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeedbackPayload {
    pub workshop_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub stars: Option<i32>,
    #[validate(length(max = 5000))]
    pub comments: Option<String>,
}

impl From<StudentProgress> for ModuleProgressOut {
    fn from(value: StudentProgress) -> Self {
        Self {
            module_id: value.module_id,
            highest_substep: value.highest_substep,
            time_spent: value.time_spent,
            updated_at: value.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_outside_one_to_five_are_rejected() {
        let mut payload = FeedbackPayload {
            workshop_id: Uuid::new_v4(),
            stars: Some(6),
            comments: None,
        };
        assert!(payload.validate().is_err());
        payload.stars = Some(0);
        assert!(payload.validate().is_err());
        payload.stars = None;
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn negative_time_and_positions_below_minus_one_are_rejected() {
        let mut payload = ProgressUpdatePayload {
            module_id: Uuid::new_v4(),
            substep_position: -2,
            time_spent: None,
        };
        assert!(payload.validate().is_err());
        payload.substep_position = -1;
        assert!(payload.validate().is_ok());
        payload.time_spent = Some(-5);
        assert!(payload.validate().is_err());
    }
}
