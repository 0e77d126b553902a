//! API Router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let api_routes = Router::new()
        // Health and status
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::daemon_status))
        // Catalogue
        .route("/catalogue", get(handlers::get_catalogue))
        // Periods
        .route(
            "/periods",
            get(handlers::list_periods).post(handlers::create_period),
        )
        .route("/periods/active", get(handlers::get_active_period))
        .route("/periods/:id", get(handlers::get_period))
        .route("/periods/:id/activate", post(handlers::activate_period))
        .route("/periods/:id/archive", post(handlers::archive_period))
        .route("/periods/:id/deadlines", put(handlers::set_deadlines))
        // Barangays
        .route(
            "/barangays",
            get(handlers::list_barangays).post(handlers::register_barangay),
        )
        .route(
            "/barangays/:id/assessment",
            get(handlers::get_current_assessment),
        )
        // Assessments
        .route("/assessments/:id", get(handlers::get_assessment))
        .route(
            "/assessments/:id/validation",
            get(handlers::get_validation_summary),
        )
        .route("/assessments/:id/progress", get(handlers::get_progress))
        .route("/assessments/:id/seal", get(handlers::get_seal))
        .route("/assessments/:id/history", get(handlers::get_history))
        .route("/assessments/:id/unreviewed", get(handlers::get_unreviewed))
        .route("/assessments/:id/submit", post(handlers::submit_assessment))
        .route("/assessments/:id/close-review", post(handlers::close_review))
        .route("/assessments/:id/finalize", post(handlers::finalize_assessment))
        // Responses
        .route("/responses/:id/answer", put(handlers::set_answer))
        .route("/responses/:id/evidence", post(handlers::upload_evidence))
        .route(
            "/responses/:id/evidence/:file_id",
            get(handlers::download_evidence).delete(handlers::delete_evidence),
        )
        .route("/responses/:id/validation", put(handlers::record_validation))
        .route(
            "/responses/:id/assessor-evidence",
            post(handlers::upload_assessor_evidence),
        )
        // Assessor
        .route("/assessor/queue", get(handlers::get_queue));

    // Build router with middleware
    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.max_body_size))
        .layer(TraceLayer::new_for_http());

    let router = if server.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
