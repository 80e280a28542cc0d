//! API router.
//!
//! Everything is nested under `/api/` except the WebSocket upgrade,
//! which lives at `/ws/sessions/:id`. The server binds loopback only;
//! this surface is for the UI running on the same machine, so there is
//! no auth layer, just permissive CORS for the dev frontend.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::api::websocket;

/// Build the full router for a pre-constructed `ApiContext`.
pub fn api_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/sessions", post(endpoints::sessions::open))
        .route("/sessions/:id", delete(endpoints::sessions::close))
        .route(
            "/sessions/:id/suggestions",
            get(endpoints::sessions::suggestions),
        )
        .route(
            "/sessions/:id/suggestions/:sid/accept",
            post(endpoints::sessions::accept),
        )
        .route(
            "/sessions/:id/suggestions/:sid/dismiss",
            post(endpoints::sessions::dismiss),
        )
        .route("/sessions/:id/clear", post(endpoints::sessions::clear))
        .with_state(ctx.clone());

    let ws_routes = Router::new()
        .route("/ws/sessions/:id", get(websocket::ws_upgrade))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
}
