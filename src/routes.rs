use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::session::{self, handlers};
use crate::shared::AppState;

/// Builds the HTTP surface. Only `/me` sits behind the auth layer.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_auth,
        ));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/login", post(handlers::login))
        .route("/token/refresh", post(handlers::refresh))
        .route("/logout", post(handlers::logout))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
