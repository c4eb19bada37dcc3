use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dto::quiz_dto::{
    CreateQuestionPayload, CreateQuizPayload, QuizOut, SubmissionResult, UpdateQuestionPayload,
};
use crate::error::{Error, Result};
use crate::models::quiz::{Question, Quiz};
use crate::services::grading_service::GradingService;
use crate::services::workshop_service::fetch_module;
use crate::utils::validation::{validate_correct_answer, validate_question_options};

const QUESTION_COLUMNS: &str = "id, quiz_id, text, options, correct_answer, created_at";

#[derive(Clone)]
pub struct QuizService {
    pool: PgPool,
}

impl QuizService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One quiz per module; the quiz and its questions are written together.
    #[instrument(skip(self, payload), fields(questions = payload.questions.len()))]
    pub async fn create(&self, module_id: Uuid, payload: CreateQuizPayload) -> Result<Quiz> {
        let mut tx = self.pool.begin().await?;
        fetch_module(&mut tx, module_id).await?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM quizzes WHERE module_id = $1")
            .bind(module_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_some() {
            return Err(quiz_exists());
        }

        let quiz = sqlx::query_as::<_, Quiz>(
            "INSERT INTO quizzes (module_id, title) VALUES ($1, $2) RETURNING id, module_id, title",
        )
        .bind(module_id)
        .bind(&payload.title)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| quiz_exists_on_conflict(err.into()))?;

        for question in payload.questions {
            insert_question(&mut tx, quiz.id, question).await?;
        }
        tx.commit().await?;

        info!(quiz_id = %quiz.id, module_id = %module_id, "quiz created");
        Ok(quiz)
    }

    pub async fn get_for_module(&self, module_id: Uuid) -> Result<QuizOut> {
        let mut conn = self.pool.acquire().await?;
        fetch_module(&mut conn, module_id).await?;

        let quiz = sqlx::query_as::<_, Quiz>("SELECT id, module_id, title FROM quizzes WHERE module_id = $1")
            .bind(module_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| Error::NotFound("Quiz not found".into()))?;
        let questions = fetch_questions(&mut conn, quiz.id).await?;
        Ok(QuizOut::new(quiz, questions))
    }

    #[instrument(skip(self, payload))]
    pub async fn add_question(&self, quiz_id: Uuid, payload: CreateQuestionPayload) -> Result<Question> {
        let mut conn = self.pool.acquire().await?;
        fetch_quiz(&mut conn, quiz_id).await?;
        insert_question(&mut conn, quiz_id, payload).await
    }

    /// The merged question must still be well formed: a partial update may not leave
    /// `correct_answer` pointing at a label that no longer exists.
    #[instrument(skip(self, payload))]
    pub async fn update_question(&self, id: Uuid, payload: UpdateQuestionPayload) -> Result<Question> {
        let mut conn = self.pool.acquire().await?;
        let current = fetch_question(&mut conn, id).await?;

        let text = payload.text.unwrap_or(current.text);
        let options = payload.options.unwrap_or(current.options.0);
        let correct_answer = payload.correct_answer.unwrap_or(current.correct_answer);
        validate_question_options(&options).map_err(invalid_question)?;
        validate_correct_answer(&options, &correct_answer).map_err(invalid_question)?;

        let query = format!(
            r#"
            UPDATE questions
            SET text = $2, options = $3, correct_answer = $4
            WHERE id = $1
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        );
        let question = sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .bind(&text)
            .bind(Json(&options))
            .bind(&correct_answer)
            .fetch_one(&mut *conn)
            .await?;
        Ok(question)
    }

    #[instrument(skip(self))]
    pub async fn delete_question(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Question not found".into()));
        }
        Ok(())
    }

    /// Grades the answers and stores them as the user's only score for this quiz.
    #[instrument(skip(self, answers), fields(answered = answers.len()))]
    pub async fn submit(
        &self,
        quiz_id: Uuid,
        user_id: Uuid,
        answers: &HashMap<Uuid, String>,
    ) -> Result<SubmissionResult> {
        let mut conn = self.pool.acquire().await?;
        fetch_quiz(&mut conn, quiz_id).await?;
        let questions = fetch_questions(&mut conn, quiz_id).await?;
        let result = GradingService::grade(&questions, answers);

        sqlx::query(
            r#"
            INSERT INTO student_quiz_scores (user_id, quiz_id, score, total_questions)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, quiz_id) DO UPDATE
            SET score = EXCLUDED.score,
                total_questions = EXCLUDED.total_questions,
                completed_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .bind(result.score)
        .bind(result.total)
        .execute(&mut *conn)
        .await?;

        info!(
            quiz_id = %quiz_id,
            user_id = %user_id,
            score = result.score,
            total = result.total,
            "quiz submitted"
        );
        Ok(result)
    }
}

fn invalid_question(err: validator::ValidationError) -> Error {
    let msg = err
        .message
        .map(|m| m.into_owned())
        .unwrap_or_else(|| err.code.into_owned());
    Error::BadRequest(msg)
}

fn quiz_exists() -> Error {
    Error::BadRequest("Quiz already exists for module".into())
}

/// A concurrent create can slip past the existence check and trip the unique index on `module_id`.
fn quiz_exists_on_conflict(err: Error) -> Error {
    match err {
        Error::Conflict(_) => quiz_exists(),
        other => other,
    }
}

async fn fetch_quiz(conn: &mut PgConnection, id: Uuid) -> Result<Quiz> {
    sqlx::query_as::<_, Quiz>("SELECT id, module_id, title FROM quizzes WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound("Quiz not found".into()))
}

async fn fetch_question(conn: &mut PgConnection, id: Uuid) -> Result<Question> {
    let query = format!("SELECT {} FROM questions WHERE id = $1", QUESTION_COLUMNS);
    sqlx::query_as::<_, Question>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound("Question not found".into()))
}

async fn fetch_questions(conn: &mut PgConnection, quiz_id: Uuid) -> Result<Vec<Question>> {
    let query = format!(
        "SELECT {} FROM questions WHERE quiz_id = $1 ORDER BY created_at ASC",
        QUESTION_COLUMNS
    );
    let questions = sqlx::query_as::<_, Question>(&query)
        .bind(quiz_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(questions)
}

async fn insert_question(
    conn: &mut PgConnection,
    quiz_id: Uuid,
    payload: CreateQuestionPayload,
) -> Result<Question> {
    let query = format!(
        r#"
        INSERT INTO questions (quiz_id, text, options, correct_answer)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        QUESTION_COLUMNS
    );
    let question = sqlx::query_as::<_, Question>(&query)
        .bind(quiz_id)
        .bind(&payload.text)
        .bind(Json(&payload.options))
        .bind(&payload.correct_answer)
        .fetch_one(&mut *conn)
        .await?;
    Ok(question)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_quiz_insert_reads_as_bad_request() {
        let err = quiz_exists_on_conflict(Error::Conflict(
            "duplicate key value violates unique constraint".into(),
        ));
        match err {
            Error::BadRequest(msg) => assert_eq!(msg, "Quiz already exists for module"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn other_insert_failures_pass_through() {
        let err = quiz_exists_on_conflict(Error::NotFound("Module not found".into()));
        assert!(matches!(err, Error::NotFound(_)));
    }
}
