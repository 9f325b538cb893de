pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::matching::handlers as matching;
use crate::pipeline::handlers as pipeline;
use crate::scoring::handlers as scoring;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matching & deduplication
        .route(
            "/api/v1/entities/:id/duplicates",
            get(matching::handle_find_duplicates),
        )
        .route(
            "/api/v1/entities/:id/similar",
            get(matching::handle_find_similar),
        )
        .route("/api/v1/duplicates", get(matching::handle_scan_duplicates))
        .route("/api/v1/entities/merge", post(matching::handle_merge))
        // Compatibility scoring
        .route(
            "/api/v1/entities/:id/compatibility/:vacancy_id",
            get(scoring::handle_compatibility),
        )
        .route("/api/v1/entities/:id", patch(scoring::handle_update_entity))
        .route("/api/v1/vacancies/:id", patch(scoring::handle_update_vacancy))
        // Pipeline
        .route(
            "/api/v1/vacancies/:id/applications",
            post(pipeline::handle_create_application),
        )
        .route(
            "/api/v1/applications/:id/stage",
            put(pipeline::handle_move_stage),
        )
        .route(
            "/api/v1/applications/bulk-move",
            post(pipeline::handle_bulk_move),
        )
        .route(
            "/api/v1/applications/:id",
            delete(pipeline::handle_delete_application),
        )
        .with_state(state)
}
