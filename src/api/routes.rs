use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the dashboard router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Derived view and feed lifecycle
        .route("/view", get(handlers::get_view))
        .route("/refresh", post(handlers::refresh))
        .route("/session/new", post(handlers::new_session))
        .route("/session/new-user", post(handlers::new_user))
        .route("/query", put(handlers::set_query))
        .route("/error", delete(handlers::dismiss_error))
        // Preferences
        .route("/preferences", get(handlers::get_preferences))
        .route("/preferences/hidden", delete(handlers::unhide_all))
        .route("/preferences/hidden/:item_id", post(handlers::hide_item))
        .route(
            "/preferences/:kind/:item_id/toggle",
            post(handlers::toggle_preference),
        )
        // Detail view
        .route("/items/open", post(handlers::open_item))
        .route("/items/read", post(handlers::confirm_read))
        .route("/items/close", post(handlers::close_item))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
