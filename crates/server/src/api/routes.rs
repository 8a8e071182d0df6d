use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{handlers, library, middleware::metrics_middleware, subtitles};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Subtitle files are loaded by players on other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let subtitle_routes = Router::new()
        .route("/subtitles/{id}/{file}", get(subtitles::get_subtitle))
        .layer(cors);

    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Library
        .route("/library", get(library::list_library))
        .route("/library/migrate", post(library::migrate_library))
        .route("/titles/{id}", get(library::get_title))
        .route("/titles/{id}/subtitles", post(library::fetch_subtitles))
        .route("/titles/{id}/subtitles/rescan", post(library::rescan_subtitles))
        .merge(subtitle_routes)
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
