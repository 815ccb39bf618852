use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Marketplace Schemas ---

/// Role
///
/// The RBAC attribute stored on every user. `Unset` covers accounts that
/// registered without choosing a side of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Buyer,
    Seller,
    Admin,
    #[default]
    Unset,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
            Role::Admin => "admin",
            Role::Unset => "unset",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown stored values decode as `Unset` so a bad row never grants a role.
impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value {
            "buyer" => Role::Buyer,
            "seller" => Role::Seller,
            "admin" => Role::Admin,
            _ => Role::Unset,
        }
    }
}

/// User
///
/// A marketplace account. The email is the identity key carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ListingStatus
///
/// `Available` is the initial state, `Booked` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ListingStatus {
    #[default]
    Available,
    Booked,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Booked => "booked",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ListingStatus::Available),
            "booked" => Ok(ListingStatus::Booked),
            other => Err(format!("unknown listing status '{}'", other)),
        }
    }
}

/// CarListing
///
/// A car advertised by a seller. `advertiser_email` is fixed at creation;
/// `status` and `advertised` only ever move forward.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CarListing {
    pub id: Uuid,
    pub advertiser_email: String,
    pub category: String,
    pub status: ListingStatus,
    pub advertised: bool,
    pub title: String,
    /// Asking price in whole currency units.
    pub price: i64,
    pub location: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Booking
///
/// Created when a buyer books an available listing; immutable afterwards.
/// `product_id` is a plain reference, deleting the listing leaves it in place.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Booking {
    pub id: Uuid,
    pub product_id: Uuid,
    pub buyer_email: String,
    pub phone: Option<String>,
    pub meeting_location: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ListingFilter
///
/// Conjunction of optional predicates understood by every repository backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub advertiser_email: Option<String>,
    pub category: Option<String>,
    pub status: Option<ListingStatus>,
    pub advertised: Option<bool>,
}

impl ListingFilter {
    pub fn matches(&self, listing: &CarListing) -> bool {
        self.advertiser_email
            .as_ref()
            .is_none_or(|email| &listing.advertiser_email == email)
            && self
                .category
                .as_ref()
                .is_none_or(|category| &listing.category == category)
            && self.status.is_none_or(|status| listing.status == status)
            && self
                .advertised
                .is_none_or(|advertised| listing.advertised == advertised)
    }
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Payload for POST /users. Self-registration can never claim `admin`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// CreateCarRequest
///
/// Payload for POST /cars. The advertiser is always the verified caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCarRequest {
    pub category: String,
    pub title: String,
    pub price: i64,
    #[serde(default)]
    pub location: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// CreateBookingRequest
///
/// Payload for POST /bookings. The buyer is the verified caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateBookingRequest {
    pub product_id: Uuid,
    pub phone: Option<String>,
    pub meeting_location: Option<String>,
}

/// UpdateRoleRequest
///
/// Payload for the administrative PATCH /users/{id}/role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

// --- Response Schemas ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SellerCheck {
    pub is_seller: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminCheck {
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BuyerCheck {
    pub is_buyer: bool,
}
