use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::workshop_dto::{
        CreateModulePayload, CreateSubstepPayload, CreateWorkshopPayload, CreatedResponse,
        SubstepOut, UpdateModulePayload, UpdateSubstepPayload, UpdateWorkshopPayload,
        WorkshopSummary,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    get,
    path = "/workshops",
    responses(
        (status = 200, description = "Workshop summaries", body = Vec<WorkshopSummary>)
    )
)]
#[axum::debug_handler]
pub async fn list_workshops(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let workshops = state.workshop_service.list().await?;
    Ok(Json(
        workshops
            .into_iter()
            .map(WorkshopSummary::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/workshops/{id}",
    params(
        ("id" = Uuid, Path, description = "Workshop ID")
    ),
    responses(
        (status = 200, description = "Workshop with modules, substeps and quizzes", body = WorkshopDetail),
        (status = 404, description = "Workshop not found")
    )
)]
#[axum::debug_handler]
pub async fn get_workshop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let detail = state.workshop_service.detail(id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/workshops",
    request_body = CreateWorkshopPayload,
    responses(
        (status = 201, description = "Workshop created", body = CreatedResponse),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_workshop(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateWorkshopPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let workshop = state
        .workshop_service
        .create(payload, claims.require_user_id()?)
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::from(workshop))))
}

#[utoipa::path(
    patch,
    path = "/workshops/{id}",
    params(
        ("id" = Uuid, Path, description = "Workshop ID")
    ),
    request_body = UpdateWorkshopPayload,
    responses(
        (status = 200, description = "Workshop updated", body = WorkshopSummary),
        (status = 404, description = "Workshop not found")
    )
)]
#[axum::debug_handler]
pub async fn update_workshop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWorkshopPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let workshop = state.workshop_service.update(id, payload).await?;
    Ok(Json(WorkshopSummary::from(workshop)))
}

#[utoipa::path(
    delete,
    path = "/workshops/{id}",
    params(
        ("id" = Uuid, Path, description = "Workshop ID")
    ),
    responses(
        (status = 204, description = "Workshop deleted"),
        (status = 404, description = "Workshop not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_workshop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.workshop_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/workshops/{id}/modules",
    params(
        ("id" = Uuid, Path, description = "Workshop ID")
    ),
    request_body = CreateModulePayload,
    responses(
        (status = 201, description = "Module created", body = CreatedResponse),
        (status = 404, description = "Workshop not found")
    )
)]
#[axum::debug_handler]
pub async fn add_module(
    State(state): State<AppState>,
    Path(workshop_id): Path<Uuid>,
    Json(payload): Json<CreateModulePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let module = state.workshop_service.add_module(workshop_id, payload).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::from(module))))
}

#[utoipa::path(
    patch,
    path = "/modules/{id}",
    params(
        ("id" = Uuid, Path, description = "Module ID")
    ),
    request_body = UpdateModulePayload,
    responses(
        (status = 200, description = "Module updated", body = Module),
        (status = 404, description = "Module not found")
    )
)]
#[axum::debug_handler]
pub async fn update_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateModulePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let module = state.workshop_service.update_module(id, payload).await?;
    Ok(Json(module))
}

#[utoipa::path(
    delete,
    path = "/modules/{id}",
    params(
        ("id" = Uuid, Path, description = "Module ID")
    ),
    responses(
        (status = 204, description = "Module deleted"),
        (status = 404, description = "Module not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.workshop_service.delete_module(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/modules/{id}/substeps",
    params(
        ("id" = Uuid, Path, description = "Module ID")
    ),
    request_body = CreateSubstepPayload,
    responses(
        (status = 201, description = "Substep created", body = CreatedResponse),
        (status = 404, description = "Module not found")
    )
)]
#[axum::debug_handler]
pub async fn add_substep(
    State(state): State<AppState>,
    Path(module_id): Path<Uuid>,
    Json(payload): Json<CreateSubstepPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let substep = state.workshop_service.add_substep(module_id, payload).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::from(substep))))
}

#[utoipa::path(
    patch,
    path = "/substeps/{id}",
    params(
        ("id" = Uuid, Path, description = "Substep ID")
    ),
    request_body = UpdateSubstepPayload,
    responses(
        (status = 200, description = "Substep updated", body = SubstepOut),
        (status = 404, description = "Substep not found")
    )
)]
#[axum::debug_handler]
pub async fn update_substep(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubstepPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let substep = state.workshop_service.update_substep(id, payload).await?;
    Ok(Json(SubstepOut::from(substep)))
}

#[utoipa::path(
    delete,
    path = "/substeps/{id}",
    params(
        ("id" = Uuid, Path, description = "Substep ID")
    ),
    responses(
        (status = 204, description = "Substep deleted"),
        (status = 404, description = "Substep not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_substep(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.workshop_service.delete_substep(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
