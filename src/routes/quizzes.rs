use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        quiz_dto::{
            CreateQuestionPayload, CreateQuizPayload, ManagedQuestionOut, QuizSubmissionPayload,
            UpdateQuestionPayload,
        },
        workshop_dto::CreatedResponse,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/modules/{id}/quiz",
    params(
        ("id" = Uuid, Path, description = "Module ID")
    ),
    request_body = CreateQuizPayload,
    responses(
        (status = 201, description = "Quiz created", body = CreatedResponse),
        (status = 400, description = "Invalid question or quiz already exists for module"),
        (status = 404, description = "Module not found")
    )
)]
#[axum::debug_handler]
pub async fn create_quiz(
    State(state): State<AppState>,
    Path(module_id): Path<Uuid>,
    Json(payload): Json<CreateQuizPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let quiz = state.quiz_service.create(module_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: quiz.id,
            title: quiz.title,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/modules/{id}/quiz",
    params(
        ("id" = Uuid, Path, description = "Module ID")
    ),
    responses(
        (status = 200, description = "Quiz without answers", body = QuizOut),
        (status = 404, description = "Module or quiz not found")
    )
)]
#[axum::debug_handler]
pub async fn get_module_quiz(
    State(state): State<AppState>,
    Path(module_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let quiz = state.quiz_service.get_for_module(module_id).await?;
    Ok(Json(quiz))
}

#[utoipa::path(
    post,
    path = "/quizzes/{id}/questions",
    params(
        ("id" = Uuid, Path, description = "Quiz ID")
    ),
    request_body = CreateQuestionPayload,
    responses(
        (status = 201, description = "Question added", body = ManagedQuestionOut),
        (status = 404, description = "Quiz not found")
    )
)]
#[axum::debug_handler]
pub async fn add_question(
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
    Json(payload): Json<CreateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let question = state.quiz_service.add_question(quiz_id, payload).await?;
    Ok((StatusCode::CREATED, Json(ManagedQuestionOut::from(question))))
}

#[utoipa::path(
    patch,
    path = "/questions/{id}",
    params(
        ("id" = Uuid, Path, description = "Question ID")
    ),
    request_body = UpdateQuestionPayload,
    responses(
        (status = 200, description = "Question updated", body = ManagedQuestionOut),
        (status = 400, description = "Merged question is invalid"),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let question = state.quiz_service.update_question(id, payload).await?;
    Ok(Json(ManagedQuestionOut::from(question)))
}

#[utoipa::path(
    delete,
    path = "/questions/{id}",
    params(
        ("id" = Uuid, Path, description = "Question ID")
    ),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.quiz_service.delete_question(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/quizzes/{id}/submit",
    params(
        ("id" = Uuid, Path, description = "Quiz ID")
    ),
    request_body = QuizSubmissionPayload,
    responses(
        (status = 200, description = "Graded submission", body = SubmissionResult),
        (status = 404, description = "Quiz not found")
    )
)]
#[axum::debug_handler]
pub async fn submit_quiz(
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<QuizSubmissionPayload>,
) -> Result<impl IntoResponse> {
    let result = state
        .quiz_service
        .submit(quiz_id, claims.require_user_id()?, &payload.answers)
        .await?;
    Ok(Json(result))
}
