use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::runtime::BarrelRuntime;

use crate::admin;

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<BarrelRuntime>,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: health plus barrel admin routes
pub fn build_router(runtime: Arc<BarrelRuntime>, cors: CorsLayer) -> Router {
    let state = AppState { runtime };

    // Public routes (health)
    let public = Router::new().route("/health", get(health));

    // Registry and barrel admin routes
    let barrels = Router::new()
        .route("/barrels", get(admin::list_barrels))
        .route("/registry/info", get(admin::info))
        .route("/registry/save", post(admin::save))
        .route("/barrels/:id", get(admin::get_barrel).delete(admin::delete_barrel))
        .route("/barrels/:id/lock", put(admin::set_lock))
        .route("/barrels/:id/owner", put(admin::set_owner))
        .route("/barrels/:id/capacity", put(admin::set_capacity))
        .route("/barrels/:id/clear", post(admin::clear_barrel))
        .route("/locations/:world/:x/:y/:z", get(admin::get_barrel_at));

    // Compose
    public
        .merge(barrels)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one span per request with method and path, at INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // mark request arrival
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::DEBUG),
                )
                // mark the response with status code and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // failures (5xx and the like) at ERROR
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
