use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Booking, CarListing, CreateCarRequest, ListingFilter, ListingStatus},
    repository::{RepositoryError, RepositoryState},
};

/// ListingLifecycle
///
/// Drives a car listing through `available -> booked` and the independent
/// `advertised` promotion. No operation moves a listing backwards.
///
/// `book` issues two writes (insert booking, flip status) without a
/// transaction. A crash between them leaves a booking on an `available`
/// listing; nothing reconciles that today.
#[derive(Clone)]
pub struct ListingLifecycle {
    repo: RepositoryState,
}

impl ListingLifecycle {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        advertiser_email: &str,
        req: CreateCarRequest,
    ) -> Result<CarListing, AppError> {
        let category = req.category.trim();
        let title = req.title.trim();
        if category.is_empty() {
            return Err(AppError::validation("category is required"));
        }
        if title.is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if req.price < 0 {
            return Err(AppError::validation("price cannot be negative"));
        }

        let listing = CarListing {
            id: Uuid::new_v4(),
            advertiser_email: advertiser_email.to_string(),
            category: category.to_string(),
            status: ListingStatus::Available,
            advertised: false,
            title: title.to_string(),
            price: req.price,
            location: req.location,
            description: req.description,
            image_url: req.image_url,
            created_at: Utc::now(),
        };

        let created = self.repo.insert_listing(listing).await?;
        tracing::info!(listing_id = %created.id, advertiser = %created.advertiser_email, "listing created");
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<CarListing, AppError> {
        self.repo
            .find_listing(id)
            .await?
            .ok_or_else(|| AppError::not_found("listing"))
    }

    /// Sets the advertise flag on an existing listing. Repeating it is a no-op
    /// success; a missing listing is `NotFound`, never created.
    pub async fn promote_to_advertised(&self, id: Uuid) -> Result<CarListing, AppError> {
        let listing = self
            .repo
            .set_advertised(id)
            .await?
            .ok_or_else(|| AppError::not_found("listing"))?;
        tracing::info!(listing_id = %id, "listing advertised");
        Ok(listing)
    }

    /// book
    ///
    /// Records a booking and moves the listing to `booked`. Fails with
    /// `Conflict` when the listing is already booked, leaving no second booking.
    pub async fn book(
        &self,
        id: Uuid,
        buyer_email: &str,
        phone: Option<String>,
        meeting_location: Option<String>,
    ) -> Result<Booking, AppError> {
        let listing = self.get(id).await?;
        if listing.status == ListingStatus::Booked {
            return Err(AppError::conflict("listing is already booked"));
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            product_id: id,
            buyer_email: buyer_email.to_string(),
            phone,
            meeting_location,
            created_at: Utc::now(),
        };

        // Step 1: the booking record. The store allows one per listing.
        let booking = match self.repo.insert_booking(booking).await {
            Ok(b) => b,
            Err(RepositoryError::Duplicate(_)) => {
                return Err(AppError::conflict("listing is already booked"));
            }
            Err(e) => return Err(e.into()),
        };

        // Step 2: the status transition, conditional on `available`.
        match self.repo.mark_booked(id).await {
            Ok(Some(_)) => {
                tracing::info!(listing_id = %id, buyer = %buyer_email, booking_id = %booking.id, "listing booked");
                Ok(booking)
            }
            Ok(None) => {
                // Listing was booked or deleted between the read and the write.
                self.discard_booking(&booking).await;
                Err(AppError::conflict("listing is no longer available"))
            }
            Err(e) => {
                tracing::error!(
                    listing_id = %id,
                    booking_id = %booking.id,
                    "status update failed after the booking was stored; discarding the booking"
                );
                // Otherwise the unique booking blocks every later buyer.
                self.discard_booking(&booking).await;
                Err(e.into())
            }
        }
    }

    async fn discard_booking(&self, booking: &Booking) {
        if let Err(e) = self.repo.delete_booking(booking.id).await {
            tracing::error!(booking_id = %booking.id, "failed to discard orphaned booking: {:?}", e);
        }
    }

    /// Available listings in one category; booked cars drop out of browsing.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<CarListing>, AppError> {
        let filter = ListingFilter {
            category: Some(category.to_string()),
            status: Some(ListingStatus::Available),
            ..ListingFilter::default()
        };
        Ok(self.repo.find_listings(&filter).await?)
    }

    pub async fn list_advertised(&self) -> Result<Vec<CarListing>, AppError> {
        let filter = ListingFilter {
            status: Some(ListingStatus::Available),
            advertised: Some(true),
            ..ListingFilter::default()
        };
        Ok(self.repo.find_listings(&filter).await?)
    }

    /// Every listing of one advertiser, whatever its state.
    pub async fn list_by_advertiser(&self, email: &str) -> Result<Vec<CarListing>, AppError> {
        let filter = ListingFilter {
            advertiser_email: Some(email.to_string()),
            ..ListingFilter::default()
        };
        Ok(self.repo.find_listings(&filter).await?)
    }

    pub async fn orders_of(&self, buyer_email: &str) -> Result<Vec<Booking>, AppError> {
        Ok(self.repo.find_bookings_by_buyer(buyer_email).await?)
    }

    /// Hard delete. Bookings that reference the listing are kept.
    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        if self.repo.delete_listing(id).await? {
            tracing::info!(listing_id = %id, "listing removed");
            Ok(())
        } else {
            Err(AppError::not_found("listing"))
        }
    }
}
