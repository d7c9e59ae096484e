//! Route definitions for the Fortress API.

pub mod auth;
pub mod automation;
pub mod health;
pub mod items;
pub mod notifications;
pub mod orders;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/users", post(auth::create_user))
        .route("/auth/me", get(auth::me))
        .route("/items", get(items::list).post(items::create))
        .route(
            "/items/{id}",
            get(items::get_by_id)
                .put(items::update)
                .delete(items::delete),
        )
        .route("/items/{id}/adjust", post(items::adjust_stock))
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/{id}", get(orders::get_by_id))
        .route("/orders/{id}/status", patch(orders::transition))
        .route(
            "/automation/rules",
            get(automation::list_rules).post(automation::create_rule),
        )
        .route(
            "/automation/rules/{id}",
            get(automation::get_rule)
                .put(automation::update_rule)
                .delete(automation::delete_rule),
        )
        .route("/automation/log", get(automation::list_log))
        .route("/notifications", get(notifications::list))
        .route("/notifications/{id}/read", post(notifications::mark_read));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
