use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RepoResult, Repository, RepositoryError};
use crate::models::{Booking, CarListing, ListingFilter, ListingStatus, Role, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    listings: Vec<CarListing>,
    bookings: Vec<Booking>,
}

/// InMemoryRepository
///
/// A process-local store with the same constraints as the Postgres schema
/// (unique user email, one booking per listing). Backs local runs without
/// `DATABASE_URL` and the test suite. Rows are kept in insertion order and
/// listing queries return newest first, as the SQL does.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_users_by_role(&self, role: Role) -> RepoResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| u.role == role)
            .cloned()
            .collect())
    }

    async fn insert_user(&self, user: User) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Duplicate(format!("user email {}", user.email)));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        Ok(tables.users.len() < before)
    }

    async fn find_listing(&self, id: Uuid) -> RepoResult<Option<CarListing>> {
        let tables = self.tables.read().await;
        Ok(tables.listings.iter().find(|l| l.id == id).cloned())
    }

    async fn find_listings(&self, filter: &ListingFilter) -> RepoResult<Vec<CarListing>> {
        let tables = self.tables.read().await;
        Ok(tables
            .listings
            .iter()
            .rev()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }

    async fn insert_listing(&self, listing: CarListing) -> RepoResult<CarListing> {
        let mut tables = self.tables.write().await;
        if tables.listings.iter().any(|l| l.id == listing.id) {
            return Err(RepositoryError::Duplicate(format!("listing {}", listing.id)));
        }
        tables.listings.push(listing.clone());
        Ok(listing)
    }

    async fn set_advertised(&self, id: Uuid) -> RepoResult<Option<CarListing>> {
        let mut tables = self.tables.write().await;
        Ok(tables.listings.iter_mut().find(|l| l.id == id).map(|listing| {
            listing.advertised = true;
            listing.clone()
        }))
    }

    async fn mark_booked(&self, id: Uuid) -> RepoResult<Option<CarListing>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .listings
            .iter_mut()
            .find(|l| l.id == id && l.status == ListingStatus::Available)
            .map(|listing| {
                listing.status = ListingStatus::Booked;
                listing.clone()
            }))
    }

    async fn delete_listing(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.listings.len();
        tables.listings.retain(|l| l.id != id);
        Ok(tables.listings.len() < before)
    }

    async fn insert_booking(&self, booking: Booking) -> RepoResult<Booking> {
        let mut tables = self.tables.write().await;
        if tables
            .bookings
            .iter()
            .any(|b| b.product_id == booking.product_id)
        {
            return Err(RepositoryError::Duplicate(format!(
                "booking for listing {}",
                booking.product_id
            )));
        }
        tables.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn find_bookings_by_buyer(&self, buyer_email: &str) -> RepoResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .rev()
            .filter(|b| b.buyer_email == buyer_email)
            .cloned()
            .collect())
    }

    async fn find_bookings_by_product(&self, product_id: Uuid) -> RepoResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|b| b.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn delete_booking(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.bookings.len();
        tables.bookings.retain(|b| b.id != id);
        Ok(tables.bookings.len() < before)
    }
}
