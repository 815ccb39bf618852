use crate::models::{Booking, CarListing, ListingFilter, Role, User};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness constraint rejected the write.
    #[error("duplicate {0}")]
    Duplicate(String),

    /// A stored row could not be mapped back onto the domain model.
    #[error("corrupt row: {0}")]
    Decode(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The abstract persistence contract consumed by the marketplace core. Only
/// per-row atomicity is assumed; nothing here spans a transaction.
///
/// Updates come in two flavours and never upsert: `set_*` updates an existing
/// row and reports `None` when it is absent, `insert_*` creates and reports
/// `Duplicate` when the key is taken.
///
/// **Send + Sync + async_trait** keep `Arc<dyn Repository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_users_by_role(&self, role: Role) -> RepoResult<Vec<User>>;
    async fn insert_user(&self, user: User) -> RepoResult<User>;
    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>>;
    /// Returns true when a row was removed.
    async fn delete_user(&self, id: Uuid) -> RepoResult<bool>;

    // --- Listings ---
    async fn find_listing(&self, id: Uuid) -> RepoResult<Option<CarListing>>;
    async fn find_listings(&self, filter: &ListingFilter) -> RepoResult<Vec<CarListing>>;
    async fn insert_listing(&self, listing: CarListing) -> RepoResult<CarListing>;
    /// Sets `advertised = true` on an existing listing.
    async fn set_advertised(&self, id: Uuid) -> RepoResult<Option<CarListing>>;
    /// Moves an `available` listing to `booked`. `None` when the listing is
    /// absent or was already booked.
    async fn mark_booked(&self, id: Uuid) -> RepoResult<Option<CarListing>>;
    async fn delete_listing(&self, id: Uuid) -> RepoResult<bool>;

    // --- Bookings ---
    /// Rejects a second booking for the same listing with `Duplicate`.
    async fn insert_booking(&self, booking: Booking) -> RepoResult<Booking>;
    async fn find_bookings_by_buyer(&self, buyer_email: &str) -> RepoResult<Vec<Booking>>;
    /// Bookings referencing one listing. Nothing in the request path needs
    /// this; it exists so the one-booking-per-listing invariant can be checked
    /// from outside the lifecycle.
    async fn find_bookings_by_product(&self, product_id: Uuid) -> RepoResult<Vec<Booking>>;
    async fn delete_booking(&self, id: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The one repository handle built at startup and shared by every request.
pub type RepositoryState = Arc<dyn Repository>;
