pub mod auth_service;
pub mod feedback_service;
pub mod grading_service;
pub mod progress_service;
pub mod quiz_service;
pub mod stats_aggregator;
pub mod stats_service;
pub mod user_service;
pub mod workshop_service;
