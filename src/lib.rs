pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;
pub mod utils;

use crate::services::{
    auth_service::AuthService, feedback_service::FeedbackService,
    progress_service::ProgressService, quiz_service::QuizService, stats_service::StatsService,
    user_service::UserService, workshop_service::WorkshopService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub workshop_service: WorkshopService,
    pub quiz_service: QuizService,
    pub progress_service: ProgressService,
    pub feedback_service: FeedbackService,
    pub stats_service: StatsService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        Self {
            auth_service: AuthService::new(pool.clone(), config),
            user_service: UserService::new(pool.clone()),
            workshop_service: WorkshopService::new(pool.clone()),
            quiz_service: QuizService::new(pool.clone()),
            progress_service: ProgressService::new(pool.clone()),
            feedback_service: FeedbackService::new(pool.clone()),
            stats_service: StatsService::new(pool.clone()),
            pool,
        }
    }
}
