use crate::{
    auth::AuthUser,
    error::AppError,
    extract::{ApiJson, ApiQuery},
    listings::ListingLifecycle,
    models::{
        AdminCheck, Booking, BuyerCheck, CarListing, CreateBookingRequest, CreateCarRequest,
        RegisterUserRequest, Role, SellerCheck, TokenResponse, UpdateRoleRequest, User,
    },
    policy::AccessPolicy,
    repository::RepositoryState,
    roles::RoleDirectory,
    token::TokenService,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Query Structs ---

/// EmailQuery
///
/// The `?email=` parameter shared by token issuance and the self-scoped listing view.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct EmailQuery {
    pub email: String,
}

// --- Public Handlers ---

/// issue_token
///
/// [Public Route] Issues a 24-hour access token for an existing user.
/// Unknown emails get 404 and no token.
#[utoipa::path(
    get,
    path = "/jwt",
    params(EmailQuery),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 404, description = "No such user")
    )
)]
pub async fn issue_token(
    State(tokens): State<TokenService>,
    State(repo): State<RepositoryState>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<TokenResponse>, AppError> {
    let issued = tokens.issue_for_user(repo.as_ref(), &query.email).await?;
    Ok(Json(TokenResponse {
        access_token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// register_user
///
/// [Public Route] Creates the account on first sign-in. Idempotent per email.
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered (or already registered)", body = User),
        (status = 422, description = "Invalid email or admin role requested")
    )
)]
pub async fn register_user(
    State(roles): State<RoleDirectory>,
    ApiJson(payload): ApiJson<RegisterUserRequest>,
) -> Result<Json<User>, AppError> {
    let user = roles.register(&payload.email, payload.role).await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/users/seller/{email}",
    params(("email" = String, Path, description = "User email")),
    responses((status = 200, description = "Seller check", body = SellerCheck))
)]
pub async fn seller_check(
    State(roles): State<RoleDirectory>,
    Path(email): Path<String>,
) -> Result<Json<SellerCheck>, AppError> {
    Ok(Json(SellerCheck {
        is_seller: roles.is_seller(&email).await?,
    }))
}

#[utoipa::path(
    get,
    path = "/users/admin/{email}",
    params(("email" = String, Path, description = "User email")),
    responses((status = 200, description = "Admin check", body = AdminCheck))
)]
pub async fn admin_check(
    State(roles): State<RoleDirectory>,
    Path(email): Path<String>,
) -> Result<Json<AdminCheck>, AppError> {
    Ok(Json(AdminCheck {
        is_admin: roles.is_admin(&email).await?,
    }))
}

#[utoipa::path(
    get,
    path = "/users/buyer/{email}",
    params(("email" = String, Path, description = "User email")),
    responses((status = 200, description = "Buyer check", body = BuyerCheck))
)]
pub async fn buyer_check(
    State(roles): State<RoleDirectory>,
    Path(email): Path<String>,
) -> Result<Json<BuyerCheck>, AppError> {
    Ok(Json(BuyerCheck {
        is_buyer: roles.is_buyer(&email).await?,
    }))
}

/// advertised_products
///
/// [Public Route] Featured listings: advertised and still available.
#[utoipa::path(
    get,
    path = "/advertised-products",
    responses((status = 200, description = "Advertised listings", body = [CarListing]))
)]
pub async fn advertised_products(
    State(listings): State<ListingLifecycle>,
) -> Result<Json<Vec<CarListing>>, AppError> {
    Ok(Json(listings.list_advertised().await?))
}

// --- Authenticated Handlers ---

/// my_advertisements
///
/// [Authenticated Route] A seller's own listings in every state.
/// The queried email must be the caller's own.
#[utoipa::path(
    get,
    path = "/my-advertisements",
    params(EmailQuery),
    responses(
        (status = 200, description = "My listings", body = [CarListing]),
        (status = 403, description = "Email does not match the token")
    )
)]
pub async fn my_advertisements(
    auth: AuthUser,
    State(listings): State<ListingLifecycle>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<Vec<CarListing>>, AppError> {
    AccessPolicy::require_self(&auth, &query.email)?;
    Ok(Json(listings.list_by_advertiser(&auth.email).await?))
}

/// my_orders
///
/// [Authenticated Route] The caller's bookings. Identity comes from the token only.
#[utoipa::path(
    get,
    path = "/my-orders",
    responses((status = 200, description = "My bookings", body = [Booking]))
)]
pub async fn my_orders(
    auth: AuthUser,
    State(listings): State<ListingLifecycle>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(listings.orders_of(&auth.email).await?))
}

/// category_listings
///
/// [Authenticated Route] Available listings in a category, for registered users.
#[utoipa::path(
    get,
    path = "/category/{id}",
    params(("id" = String, Path, description = "Category name")),
    responses((status = 200, description = "Listings in category", body = [CarListing]))
)]
pub async fn category_listings(
    auth: AuthUser,
    State(policy): State<AccessPolicy>,
    State(listings): State<ListingLifecycle>,
    Path(category): Path<String>,
) -> Result<Json<Vec<CarListing>>, AppError> {
    policy.require_registered(&auth).await?;
    Ok(Json(listings.list_by_category(&category).await?))
}

/// create_car
///
/// [Authenticated Route] Sellers (and admins) list a car. The advertiser is the
/// verified caller regardless of the payload.
#[utoipa::path(
    post,
    path = "/cars",
    request_body = CreateCarRequest,
    responses(
        (status = 201, description = "Listing created", body = CarListing),
        (status = 403, description = "Caller is not a seller")
    )
)]
pub async fn create_car(
    auth: AuthUser,
    State(policy): State<AccessPolicy>,
    State(listings): State<ListingLifecycle>,
    ApiJson(payload): ApiJson<CreateCarRequest>,
) -> Result<(StatusCode, Json<CarListing>), AppError> {
    policy.require_role(&auth, &[Role::Seller, Role::Admin]).await?;
    let listing = listings.create(&auth.email, payload).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// create_booking
///
/// [Authenticated Route] A buyer books an available listing.
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booked", body = Booking),
        (status = 404, description = "No such listing"),
        (status = 409, description = "Already booked")
    )
)]
pub async fn create_booking(
    auth: AuthUser,
    State(policy): State<AccessPolicy>,
    State(listings): State<ListingLifecycle>,
    ApiJson(payload): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    policy.require_role(&auth, &[Role::Buyer]).await?;
    let booking = listings
        .book(
            payload.product_id,
            &auth.email,
            payload.phone,
            payload.meeting_location,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// advertise_listing
///
/// [Authenticated Route] Promotes a listing to the featured set. Owner or admin.
#[utoipa::path(
    patch,
    path = "/advertisements/{id}",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Advertised", body = CarListing),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such listing")
    )
)]
pub async fn advertise_listing(
    auth: AuthUser,
    State(policy): State<AccessPolicy>,
    State(listings): State<ListingLifecycle>,
    Path(id): Path<Uuid>,
) -> Result<Json<CarListing>, AppError> {
    let listing = listings.get(id).await?;
    policy.require_owner_or_admin(&auth, &listing).await?;
    Ok(Json(listings.promote_to_advertised(id).await?))
}

/// delete_listing
///
/// [Authenticated Route] Removes a listing. Owner or admin.
#[utoipa::path(
    delete,
    path = "/advertisements/{id}",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such listing")
    )
)]
pub async fn delete_listing(
    auth: AuthUser,
    State(policy): State<AccessPolicy>,
    State(listings): State<ListingLifecycle>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let listing = listings.get(id).await?;
    policy.require_owner_or_admin(&auth, &listing).await?;
    listings.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Admin Handlers ---
// Every handler below starts with `require_admin`.

#[utoipa::path(
    get,
    path = "/all-sellers",
    responses(
        (status = 200, description = "All sellers", body = [User]),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn all_sellers(
    auth: AuthUser,
    State(policy): State<AccessPolicy>,
    State(roles): State<RoleDirectory>,
) -> Result<Json<Vec<User>>, AppError> {
    policy.require_admin(&auth).await?;
    Ok(Json(roles.list_by_role(Role::Seller).await?))
}

#[utoipa::path(
    get,
    path = "/all-buyers",
    responses(
        (status = 200, description = "All buyers", body = [User]),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn all_buyers(
    auth: AuthUser,
    State(policy): State<AccessPolicy>,
    State(roles): State<RoleDirectory>,
) -> Result<Json<Vec<User>>, AppError> {
    policy.require_admin(&auth).await?;
    Ok(Json(roles.list_by_role(Role::Buyer).await?))
}

/// remove_seller
///
/// [Admin Route] Deletes a seller account. Ids of other roles answer 404.
#[utoipa::path(
    delete,
    path = "/all-sellers/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No seller with that ID")
    )
)]
pub async fn remove_seller(
    auth: AuthUser,
    State(policy): State<AccessPolicy>,
    State(roles): State<RoleDirectory>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    policy.require_admin(&auth).await?;
    roles.remove_user(id, Role::Seller).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// remove_buyer
///
/// [Admin Route] Deletes a buyer account. Ids of other roles answer 404.
#[utoipa::path(
    delete,
    path = "/all-buyers/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No buyer with that ID")
    )
)]
pub async fn remove_buyer(
    auth: AuthUser,
    State(policy): State<AccessPolicy>,
    State(roles): State<RoleDirectory>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    policy.require_admin(&auth).await?;
    roles.remove_user(id, Role::Buyer).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No such user")
    )
)]
pub async fn update_user_role(
    auth: AuthUser,
    State(policy): State<AccessPolicy>,
    State(roles): State<RoleDirectory>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateRoleRequest>,
) -> Result<Json<User>, AppError> {
    policy.require_admin(&auth).await?;
    Ok(Json(roles.set_role(id, payload.role).await?))
}
