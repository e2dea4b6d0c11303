//! Assembles the Axum [`Router`] from all handler modules.

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServiceConfig,
    friends::FriendGraph,
    handlers::{friends, index, users, AppState},
    middleware::notify::notify_middleware,
    notification::Notifier,
    storage::GraphStore,
};

/// Build the complete application router with shared state.
pub fn build_router(
    store: Arc<dyn GraphStore>,
    config: ServiceConfig,
    notifier: Arc<dyn Notifier>,
) -> Router {
    let state = AppState {
        friends: FriendGraph::new(store),
        config,
        notifier,
    };

    Router::new()
        .route("/", get(index::index))
        // Users. The static segments win over `{user}`.
        .route("/friends/insert", post(users::insert))
        .route("/friends/delete", delete(users::delete))
        // Lists
        .route("/friends/{user}", get(friends::list_friends))
        .route("/friends/{user}/pending", get(friends::list_pending))
        .route(
            "/friends/{user}/pending_request",
            get(friends::list_pending_request),
        )
        .route("/friends/{user}/status/{friend}", get(friends::status))
        // Lifecycle
        .route("/friends/{user}/add", post(friends::add))
        .route("/friends/{user}/cancel", delete(friends::cancel))
        .route("/friends/{user}/accept", post(friends::accept))
        .route("/friends/{user}/decline", delete(friends::decline))
        .route("/friends/{user}/delete", delete(friends::remove))
        .layer(from_fn_with_state(state.clone(), notify_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
