use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Every route here runs behind `require_identity`, so handlers always receive
/// a verified `AuthUser`. Ownership is bound to that identity, never to
/// anything in the payload.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /my-advertisements?email=...
        // Self-match: the email must be the caller's.
        .route("/my-advertisements", get(handlers::my_advertisements))
        // GET /my-orders
        // Bookings of the caller.
        .route("/my-orders", get(handlers::my_orders))
        // GET /category/{id}
        // Available listings in a category, registered users only.
        .route("/category/{id}", get(handlers::category_listings))
        // POST /cars
        // Seller creates a listing in state `available`.
        .route("/cars", post(handlers::create_car))
        // POST /bookings
        // Buyer books a listing; this is the only way a listing becomes `booked`.
        .route("/bookings", post(handlers::create_booking))
        // PATCH/DELETE /advertisements/{id}
        // Owner or admin: promote to advertised, or remove.
        .route(
            "/advertisements/{id}",
            patch(handlers::advertise_listing).delete(handlers::delete_listing),
        )
}
