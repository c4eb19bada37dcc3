pub mod auth;
pub mod health;
pub mod progress;
pub mod quizzes;
pub mod stats;
pub mod users;
pub mod workshops;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::get_config,
    middleware::{
        auth::{require_admin, require_bearer_auth, require_trainer_or_admin},
        cors::cors_layer,
    },
    AppState,
};

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Builds the full HTTP surface. Access is enforced per route group with `route_layer`,
/// so unknown paths still answer 404 rather than 401.
pub fn app(state: AppState) -> Router {
    let config = get_config();

    let public_api = Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh-token", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/workshops", get(workshops::list_workshops))
        .route("/workshops/:id", get(workshops::get_workshop));

    let authenticated_api = Router::new()
        .route("/auth/me", get(auth::me).put(auth::update_me))
        .route("/auth/change-password", put(auth::change_password))
        .route("/modules/:id/quiz", get(quizzes::get_module_quiz))
        .route("/quizzes/:id/submit", post(quizzes::submit_quiz))
        .route("/progress", post(progress::record_progress))
        .route("/progress/:user_id", get(progress::get_progress))
        .route("/feedback", post(progress::submit_feedback))
        .route_layer(from_fn(require_bearer_auth));

    let trainer_api = Router::new()
        .route("/workshops", post(workshops::create_workshop))
        .route(
            "/workshops/:id",
            patch(workshops::update_workshop).delete(workshops::delete_workshop),
        )
        .route("/workshops/:id/modules", post(workshops::add_module))
        .route(
            "/modules/:id",
            patch(workshops::update_module).delete(workshops::delete_module),
        )
        .route("/modules/:id/substeps", post(workshops::add_substep))
        .route(
            "/substeps/:id",
            patch(workshops::update_substep).delete(workshops::delete_substep),
        )
        .route("/modules/:id/quiz", post(quizzes::create_quiz))
        .route("/quizzes/:id/questions", post(quizzes::add_question))
        .route(
            "/questions/:id",
            patch(quizzes::update_question).delete(quizzes::delete_question),
        )
        .route("/workshops/:id/stats", get(stats::workshop_stats))
        .route("/analytics/:id", get(stats::workshop_analytics))
        .route_layer(from_fn(require_trainer_or_admin));

    let admin_api = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/bulk", put(users::bulk_update_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(from_fn(require_admin));

    public_api
        .merge(authenticated_api)
        .merge(trainer_api)
        .merge(admin_api)
        .with_state(state)
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
