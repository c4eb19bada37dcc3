use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleStats {
    pub module_id: Uuid,
    pub module_title: String,
    pub avg_completion_percentage: f64,
    pub enrolled_students: usize,
    /// `None` only when the module has no quiz.
    pub avg_quiz_score_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopStats {
    pub workshop_id: Uuid,
    pub average_completion_percentage: f64,
    /// Seconds per (user, module) pair.
    pub average_time_spent: f64,
    pub modules: Vec<ModuleStats>,
    pub average_rating: Option<f64>,
    pub total_feedback: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleQuizScore {
    pub module_id: Uuid,
    pub module_title: String,
    pub avg_score_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionFailureRate {
    pub question_id: Uuid,
    pub question_text: String,
    /// Always null: per-question answers are not stored.
    pub failure_rate_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleQuestionFailures {
    pub module_id: Uuid,
    pub module_title: String,
    pub questions: Vec<QuestionFailureRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopAnalytics {
    pub module_quiz_scores: Vec<ModuleQuizScore>,
    pub question_failure_rates: Vec<ModuleQuestionFailures>,
}
