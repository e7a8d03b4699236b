//! HTTP surface of the platform: configuration, shared state, DTOs,
//! authentication extractors, the route table and the background analysis
//! worker pool.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;
pub mod worker;

use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the full route table. `/health` is the only unauthenticated
/// endpoint; everything else checks an API key or a bearer token inside
/// its handler.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/change-password", post(handlers::change_password))
        .route("/api/logs", post(handlers::create_log))
        .route("/api/logs/search", post(handlers::search_logs))
        .route("/api/logs/{id}", get(handlers::get_log))
        .route("/api/logs/{id}/analyze", post(handlers::analyze_log))
        .route(
            "/api/services",
            get(handlers::list_services).post(handlers::create_service),
        )
        .route("/api/services/search", post(handlers::search_services))
        .route("/api/services/offline", get(handlers::offline_services))
        .route(
            "/api/services/{id}",
            get(handlers::get_service).put(handlers::update_service),
        )
        .route("/api/services/{id}/activate", patch(handlers::activate_service))
        .route("/api/services/{id}/deactivate", patch(handlers::deactivate_service))
        .route(
            "/api/services/{id}/regenerate-api-key",
            post(handlers::regenerate_api_key),
        )
        .route("/api/services/{id}/report", post(handlers::service_report))
        .route(
            "/api/clients",
            get(handlers::list_clients).post(handlers::create_client),
        )
        .route(
            "/api/clients/{id}",
            get(handlers::get_client).put(handlers::update_client),
        )
        .route("/api/clients/{id}/activate", patch(handlers::activate_client))
        .route("/api/clients/{id}/deactivate", patch(handlers::deactivate_client))
        .route("/api/clients/{id}/contacts", post(handlers::add_contact))
        .route(
            "/api/clients/{id}/contacts/{contact_id}",
            delete(handlers::remove_contact),
        )
        .route(
            "/api/clients/{id}/notification-settings",
            put(handlers::set_notification_settings),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
