use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::dto::quiz_dto::QuizOut;
use crate::models::workshop::{Module, Substep, Workshop};
use crate::utils::validation::validate_date_range;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSubstepPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub content: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateSubstepPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub content: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateModulePayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    #[validate(nested)]
    pub substeps: Option<Vec<CreateSubstepPayload>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateModulePayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_create_workshop_dates"))]
pub struct CreateWorkshopPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(nested)]
    pub modules: Option<Vec<CreateModulePayload>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_update_workshop_dates"))]
pub struct UpdateWorkshopPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn validate_create_workshop_dates(payload: &CreateWorkshopPayload) -> Result<(), ValidationError> {
    validate_date_range(payload.start_date, payload.end_date)
}

fn validate_update_workshop_dates(payload: &UpdateWorkshopPayload) -> Result<(), ValidationError> {
    validate_date_range(payload.start_date, payload.end_date)
}

/// `{id, title}` acknowledgement returned by create endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkshopSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstepOut {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleOut {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub substeps: Vec<SubstepOut>,
    pub quiz: Option<QuizOut>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkshopDetail {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub modules: Vec<ModuleOut>,
}

impl From<Workshop> for WorkshopSummary {
    fn from(value: Workshop) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            start_date: value.start_date,
            end_date: value.end_date,
        }
    }
}

impl From<Substep> for SubstepOut {
    fn from(value: Substep) -> Self {
        Self {
            id: value.id,
            title: value.title,
            content: value.content,
            position: value.position,
        }
    }
}

impl ModuleOut {
    pub fn new(module: Module, substeps: Vec<Substep>, quiz: Option<QuizOut>) -> Self {
        Self {
            id: module.id,
            title: module.title,
            description: module.description,
            position: module.position,
            substeps: substeps.into_iter().map(Into::into).collect(),
            quiz,
        }
    }
}

impl From<Workshop> for CreatedResponse {
    fn from(value: Workshop) -> Self {
        Self {
            id: value.id,
            title: value.title,
        }
    }
}

impl From<Module> for CreatedResponse {
    fn from(value: Module) -> Self {
        Self {
            id: value.id,
            title: value.title,
        }
    }
}

impl From<Substep> for CreatedResponse {
    fn from(value: Substep) -> Self {
        Self {
            id: value.id,
            title: value.title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_substeps_are_validated() {
        let raw = serde_json::json!({
            "title": "Rust 101",
            "start_date": "2025-04-01",
            "end_date": "2025-04-02",
            "modules": [{
                "title": "Ownership",
                "position": 1,
                "substeps": [{ "title": "", "content": "x", "position": 0 }]
            }]
        });
        let payload: CreateWorkshopPayload = serde_json::from_value(raw).unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let raw = serde_json::json!({
            "title": "Rust 101",
            "start_date": "2025-04-02",
            "end_date": "2025-04-01"
        });
        let payload: CreateWorkshopPayload = serde_json::from_value(raw).unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn minimal_workshop_is_valid() {
        let payload: CreateWorkshopPayload =
            serde_json::from_value(serde_json::json!({ "title": "Rust 101" })).unwrap();
        assert!(payload.validate().is_ok());
        assert!(payload.modules.is_none());
    }
}
