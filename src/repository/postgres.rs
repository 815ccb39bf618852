use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, query_builder::QueryBuilder};
use uuid::Uuid;

use super::{RepoResult, Repository, RepositoryError};
use crate::models::{Booking, CarListing, ListingFilter, Role, User};

const USER_COLUMNS: &str = "id, email, role, created_at";
const LISTING_COLUMNS: &str = "id, advertiser_email, category, status, advertised, title, price, location, description, image_url, created_at";
const BOOKING_COLUMNS: &str = "id, product_id, buyer_email, phone, meeting_location, created_at";

// --- Row Mappings ---
// Enum columns are stored as TEXT and converted at the boundary.

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            role: Role::from(row.role.as_str()),
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ListingRow {
    id: Uuid,
    advertiser_email: String,
    category: String,
    status: String,
    advertised: bool,
    title: String,
    price: i64,
    location: String,
    description: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ListingRow> for CarListing {
    type Error = RepositoryError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(CarListing {
            id: row.id,
            advertiser_email: row.advertiser_email,
            category: row.category,
            status: row.status.parse().map_err(RepositoryError::Decode)?,
            advertised: row.advertised,
            title: row.title,
            price: row.price,
            location: row.location,
            description: row.description,
            image_url: row.image_url,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct BookingRow {
    id: Uuid,
    product_id: Uuid,
    buyer_email: String,
    phone: Option<String>,
    meeting_location: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            product_id: row.product_id,
            buyer_email: row.buyer_email,
            phone: row.phone,
            meeting_location: row.meeting_location,
            created_at: row.created_at,
        }
    }
}

/// Maps a unique-constraint violation onto `Duplicate`, anything else onto `Database`.
fn classify(err: sqlx::Error, what: impl FnOnce() -> String) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Duplicate(what()),
        _ => RepositoryError::Database(err),
    }
}

/// PostgresRepository
///
/// The production `Repository`, backed by a shared `PgPool`. Queries are
/// checked at runtime so the crate builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_users_by_role(&self, role: Role) -> RepoResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY created_at ASC"
        ))
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn insert_user(&self, user: User) -> RepoResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, email, role, created_at) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("user email {}", user.email)))?;
        Ok(row.into())
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn find_listing(&self, id: Uuid) -> RepoResult<Option<CarListing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM cars WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CarListing::try_from).transpose()
    }

    /// find_listings
    ///
    /// Builds the WHERE clause from whichever predicates are set, binding every
    /// value through `QueryBuilder`.
    async fn find_listings(&self, filter: &ListingFilter) -> RepoResult<Vec<CarListing>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {LISTING_COLUMNS} FROM cars WHERE true"));

        if let Some(email) = &filter.advertiser_email {
            builder.push(" AND advertiser_email = ");
            builder.push_bind(email.clone());
        }
        if let Some(category) = &filter.category {
            builder.push(" AND category = ");
            builder.push_bind(category.clone());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }
        if let Some(advertised) = filter.advertised {
            builder.push(" AND advertised = ");
            builder.push_bind(advertised);
        }

        builder.push(" ORDER BY created_at DESC");

        let rows = builder
            .build_query_as::<ListingRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(CarListing::try_from).collect()
    }

    async fn insert_listing(&self, listing: CarListing) -> RepoResult<CarListing> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "INSERT INTO cars ({LISTING_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {LISTING_COLUMNS}"
        ))
        .bind(listing.id)
        .bind(&listing.advertiser_email)
        .bind(&listing.category)
        .bind(listing.status.as_str())
        .bind(listing.advertised)
        .bind(&listing.title)
        .bind(listing.price)
        .bind(&listing.location)
        .bind(&listing.description)
        .bind(&listing.image_url)
        .bind(listing.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("listing {}", listing.id)))?;
        row.try_into()
    }

    async fn set_advertised(&self, id: Uuid) -> RepoResult<Option<CarListing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "UPDATE cars SET advertised = true WHERE id = $1 RETURNING {LISTING_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CarListing::try_from).transpose()
    }

    /// mark_booked
    ///
    /// Conditional on the current status, so concurrent bookers cannot both win
    /// and a booked listing never returns to `available`.
    async fn mark_booked(&self, id: Uuid) -> RepoResult<Option<CarListing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "UPDATE cars SET status = 'booked' WHERE id = $1 AND status = 'available' RETURNING {LISTING_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CarListing::try_from).transpose()
    }

    async fn delete_listing(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_booking(&self, booking: Booking) -> RepoResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking.id)
        .bind(booking.product_id)
        .bind(&booking.buyer_email)
        .bind(&booking.phone)
        .bind(&booking.meeting_location)
        .bind(booking.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("booking for listing {}", booking.product_id)))?;
        Ok(row.into())
    }

    async fn find_bookings_by_buyer(&self, buyer_email: &str) -> RepoResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE buyer_email = $1 ORDER BY created_at DESC"
        ))
        .bind(buyer_email)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn find_bookings_by_product(&self, product_id: Uuid) -> RepoResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE product_id = $1"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn delete_booking(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
