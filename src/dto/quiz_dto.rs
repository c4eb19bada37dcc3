use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::quiz::{Question, QuestionOptions, Quiz};
use crate::utils::validation::{validate_correct_answer, validate_question_options};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_new_question"))]
pub struct CreateQuestionPayload {
    #[validate(length(min = 1))]
    pub text: String,
    pub options: QuestionOptions,
    pub correct_answer: String,
}

fn validate_new_question(payload: &CreateQuestionPayload) -> Result<(), ValidationError> {
    validate_question_options(&payload.options)?;
    validate_correct_answer(&payload.options, &payload.correct_answer)
}

/// Partial update; the merged result is re-validated by the service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateQuestionPayload {
    #[validate(length(min = 1))]
    pub text: Option<String>,
    pub options: Option<QuestionOptions>,
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuizPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(nested)]
    pub questions: Vec<CreateQuestionPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmissionPayload {
    /// Question id to chosen option label.
    pub answers: HashMap<Uuid, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub score: i32,
    pub total: i32,
}

/// Question as shown to students: no correct answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOut {
    pub id: Uuid,
    pub text: String,
    pub options: QuestionOptions,
}

/// Question as returned to the trainer who manages it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedQuestionOut {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub text: String,
    pub options: QuestionOptions,
    pub correct_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOut {
    pub id: Uuid,
    pub title: String,
    pub questions: Vec<QuestionOut>,
}

impl From<Question> for QuestionOut {
    fn from(value: Question) -> Self {
        Self {
            id: value.id,
            text: value.text,
            options: value.options.0,
        }
    }
}

impl From<Question> for ManagedQuestionOut {
    fn from(value: Question) -> Self {
        Self {
            id: value.id,
            quiz_id: value.quiz_id,
            text: value.text,
            options: value.options.0,
            correct_answer: value.correct_answer,
        }
    }
}

impl QuizOut {
    pub fn new(quiz: Quiz, questions: Vec<Question>) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            questions: questions.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_with_unknown_answer_label_is_invalid() {
        let raw = serde_json::json!({
            "title": "Ownership check",
            "questions": [{
                "text": "Who owns the value?",
                "options": { "A": "the caller", "B": "the callee" },
                "correct_answer": "C"
            }]
        });
        let payload: CreateQuizPayload = serde_json::from_value(raw).unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn well_formed_quiz_is_valid() {
        let raw = serde_json::json!({
            "title": "Ownership check",
            "questions": [{
                "text": "Who owns the value?",
                "options": { "A": "the caller", "B": "the callee" },
                "correct_answer": "B"
            }]
        });
        let payload: CreateQuizPayload = serde_json::from_value(raw).unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn submission_keys_parse_as_question_ids() {
        let id = Uuid::new_v4();
        let raw = serde_json::json!({ "answers": { id.to_string(): "A" } });
        let payload: QuizSubmissionPayload = serde_json::from_value(raw).unwrap();
        assert_eq!(payload.answers.get(&id).map(String::as_str), Some("A"));
    }
}
