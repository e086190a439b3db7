use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{categories, favorites, listings, messages, vendors};

/// Full REST surface under /api. Public routes sit next to the
/// token-guarded ones; the guard layer only wraps the protected router.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/listings", get(listings::get_all))
        .route("/listings/{id}", get(listings::get_one))
        .route("/categories", get(categories::get_all))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/auth/profile", get(auth::profile))
        .route("/listings", post(listings::create))
        .route("/listings/vendor/my-listings", get(listings::get_mine))
        .route("/listings/admin/all", get(listings::get_all_admin))
        .route("/listings/admin/{id}/status", patch(listings::update_status_admin))
        .route("/listings/{id}", patch(listings::update).delete(listings::delete))
        .route("/vendors/profile", get(vendors::get_profile))
        .route("/favorites", get(favorites::get_mine))
        .route("/favorites/{listing_id}", post(favorites::add).delete(favorites::remove))
        .route("/favorites/{listing_id}/check", get(favorites::check))
        .route("/messages", post(messages::send))
        .route("/messages/inbox", get(messages::inbox))
        .route("/messages/sent", get(messages::sent))
        .route("/messages/unread-count", get(messages::unread_count))
        .route("/messages/conversation/{user_id}", get(messages::conversation))
        .route("/messages/{id}", get(messages::get_one).delete(messages::delete))
        .route("/messages/{id}/read", patch(messages::mark_read))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().nest("/api", public.merge(protected))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "success", "message": "Server is running" }))
}
