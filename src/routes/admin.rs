use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch},
};

/// Admin Router Module
///
/// Account oversight. Mounted behind the identity guard; each handler then
/// resolves the caller's stored role through `AccessPolicy::require_admin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/all-sellers", get(handlers::all_sellers))
        .route("/all-buyers", get(handlers::all_buyers))
        // DELETE /all-{sellers,buyers}/{id}
        // Removal by user ID, scoped to the role the path names.
        .route("/all-sellers/{id}", delete(handlers::remove_seller))
        .route("/all-buyers/{id}", delete(handlers::remove_buyer))
        // PATCH /users/{id}/role
        // The only way a role changes after registration.
        .route("/users/{id}/role", patch(handlers::update_user_role))
}
