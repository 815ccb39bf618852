use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated endpoints: token issuance, registration, the public role
/// checks the storefront uses to pick a dashboard, and featured listings.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Liveness banner.
        .route("/", get(|| async { "Car Bazaar Server Running!" }))
        // GET /health
        // Load balancer check.
        .route("/health", get(|| async { "ok" }))
        // GET /jwt?email=...
        // Issues a 24h token, only for registered emails.
        .route("/jwt", get(handlers::issue_token))
        // POST /users
        // First-time registration. Cannot self-assign admin.
        .route("/users", post(handlers::register_user))
        // GET /users/{seller|admin|buyer}/{email}
        // Role existence checks; unknown emails answer false.
        .route("/users/seller/{email}", get(handlers::seller_check))
        .route("/users/admin/{email}", get(handlers::admin_check))
        .route("/users/buyer/{email}", get(handlers::buyer_check))
        // GET /advertised-products
        // Advertised listings that are still available.
        .route("/advertised-products", get(handlers::advertised_products))
}
