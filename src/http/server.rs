//! Main router configuration assembling the OAuth and sample resource endpoints.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::{
    context::AppState,
    handler_authorize::{handle_oauth_authorize, handle_oauth_authorize_decision},
    handler_resource::{handle_protected_resource, handle_public_resource},
    handler_token::handle_oauth_token,
};

/// Build the application router
pub fn build_router(ctx: AppState) -> Router {
    let oauth_routes = Router::new()
        .route(
            "/authorize",
            get(handle_oauth_authorize).post(handle_oauth_authorize_decision),
        )
        .route("/token", post(handle_oauth_token));

    let api_routes = Router::new()
        .route(
            "/resource",
            get(handle_protected_resource).post(handle_protected_resource),
        )
        .route("/public", get(handle_public_resource));

    Router::new()
        .nest("/oauth", oauth_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
