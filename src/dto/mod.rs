pub mod auth_dto;
pub mod progress_dto;
pub mod quiz_dto;
pub mod stats_dto;
pub mod workshop_dto;
