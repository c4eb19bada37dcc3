use std::collections::HashMap;

use uuid::Uuid;

use crate::dto::quiz_dto::SubmissionResult;
use crate::models::quiz::Question;

pub struct GradingService;

impl GradingService {
    /// One point per question whose submitted label matches `correct_answer`.
    /// Unanswered questions score zero; answers to unknown question ids are ignored.
    pub fn grade(questions: &[Question], answers: &HashMap<Uuid, String>) -> SubmissionResult {
        let score = questions
            .iter()
            .filter(|q| {
                answers
                    .get(&q.id)
                    .is_some_and(|given| given.trim() == q.correct_answer.trim())
            })
            .count();

        SubmissionResult {
            score: score as i32,
            total: questions.len() as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::QuestionOptions;
    use chrono::Utc;
    use sqlx::types::Json;

    fn question(correct: &str) -> Question {
        let options: QuestionOptions = [("A", "yes"), ("B", "no"), ("C", "maybe")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Question {
            id: Uuid::new_v4(),
            quiz_id: Uuid::nil(),
            text: "?".into(),
            options: Json(options),
            correct_answer: correct.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn counts_matching_labels() {
        let questions = vec![question("A"), question("B"), question("C")];
        let answers = HashMap::from([
            (questions[0].id, "A".to_string()),
            (questions[1].id, "C".to_string()),
            (questions[2].id, " C ".to_string()),
        ]);

        let result = GradingService::grade(&questions, &answers);
        assert_eq!(result, SubmissionResult { score: 2, total: 3 });
    }

    #[test]
    fn unanswered_and_foreign_ids_score_nothing() {
        let questions = vec![question("A"), question("B")];
        let answers = HashMap::from([(Uuid::new_v4(), "A".to_string())]);

        let result = GradingService::grade(&questions, &answers);
        assert_eq!(result, SubmissionResult { score: 0, total: 2 });
    }

    #[test]
    fn empty_quiz_grades_to_zero_of_zero() {
        let result = GradingService::grade(&[], &HashMap::new());
        assert_eq!(result, SubmissionResult { score: 0, total: 0 });
    }
}
