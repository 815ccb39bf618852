use async_trait::async_trait;
use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use car_bazaar::{
    AccessPolicy, AppError, AppState, InMemoryRepository, ListingLifecycle, RoleDirectory,
    auth::AuthUser,
    config::AppConfig,
    extract::{ApiJson, ApiQuery},
    handlers::{self, EmailQuery},
    models::{
        Booking, CarListing, CreateBookingRequest, CreateCarRequest, ListingFilter,
        RegisterUserRequest, Role, UpdateRoleRequest, User,
    },
    repository::{RepoResult, Repository, RepositoryError},
};
use std::sync::Arc;
use uuid::Uuid;

// --- TEST UTILITIES ---

fn create_test_state() -> AppState {
    AppState::new(Arc::new(InMemoryRepository::new()), AppConfig::default())
}

async fn seed_user(state: &AppState, email: &str, role: Role) -> User {
    let roles = RoleDirectory::from_ref(state);
    let user = roles
        .register(email, if role == Role::Admin { Role::Unset } else { role })
        .await
        .unwrap();
    if role == Role::Admin {
        roles.set_role(user.id, Role::Admin).await.unwrap()
    } else {
        user
    }
}

fn caller(email: &str) -> AuthUser {
    AuthUser {
        email: email.to_string(),
    }
}

fn car_request() -> CreateCarRequest {
    CreateCarRequest {
        category: "suv".to_string(),
        title: "Mitsubishi Pajero".to_string(),
        price: 25_000,
        ..CreateCarRequest::default()
    }
}

async fn seeded_listing(state: &AppState, advertiser: &str) -> CarListing {
    ListingLifecycle::from_ref(state)
        .create(advertiser, car_request())
        .await
        .unwrap()
}

// --- SELF-MATCH ---

#[tokio::test]
async fn test_my_advertisements_rejects_other_email() {
    let state = create_test_state();
    seeded_listing(&state, "b@x.com").await;

    let result = handlers::my_advertisements(
        caller("a@x.com"),
        State(ListingLifecycle::from_ref(&state)),
        ApiQuery(EmailQuery {
            email: "b@x.com".to_string(),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_my_advertisements_returns_own_listings() {
    let state = create_test_state();
    let mine = seeded_listing(&state, "a@x.com").await;
    seeded_listing(&state, "b@x.com").await;

    let Json(listings) = handlers::my_advertisements(
        caller("a@x.com"),
        State(ListingLifecycle::from_ref(&state)),
        ApiQuery(EmailQuery {
            email: "a@x.com".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].id, mine.id);
}

#[test]
fn test_self_match_rule_for_any_pair() {
    let pairs = [
        ("a@x.com", "b@x.com"),
        ("a@x.com", "A@x.com"),
        ("a@x.com", ""),
        ("", "a@x.com"),
    ];
    for (identity, requested) in pairs {
        assert!(matches!(
            AccessPolicy::require_self(&caller(identity), requested),
            Err(AppError::Forbidden(_))
        ));
    }
    assert!(AccessPolicy::require_self(&caller("a@x.com"), "a@x.com").is_ok());
}

// --- ROLE RULES ---

#[tokio::test]
async fn test_create_car_requires_seller_role() {
    let state = create_test_state();
    seed_user(&state, "buyer@x.com", Role::Buyer).await;

    let result = handlers::create_car(
        caller("buyer@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(ListingLifecycle::from_ref(&state)),
        ApiJson(car_request()),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_create_car_binds_advertiser_to_caller() {
    let state = create_test_state();
    seed_user(&state, "seller@x.com", Role::Seller).await;

    let (status, Json(listing)) = handlers::create_car(
        caller("seller@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(ListingLifecycle::from_ref(&state)),
        ApiJson(car_request()),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(listing.advertiser_email, "seller@x.com");
}

#[tokio::test]
async fn test_create_booking_requires_buyer_role() {
    let state = create_test_state();
    seed_user(&state, "seller@x.com", Role::Seller).await;
    let listing = seeded_listing(&state, "other@x.com").await;

    let result = handlers::create_booking(
        caller("seller@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(ListingLifecycle::from_ref(&state)),
        ApiJson(CreateBookingRequest {
            product_id: listing.id,
            phone: None,
            meeting_location: None,
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_unregistered_caller_cannot_browse_category() {
    let state = create_test_state();

    let result = handlers::category_listings(
        caller("stranger@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(ListingLifecycle::from_ref(&state)),
        Path("suv".to_string()),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_all_sellers_requires_admin() {
    let state = create_test_state();
    seed_user(&state, "seller@x.com", Role::Seller).await;
    seed_user(&state, "admin@x.com", Role::Admin).await;

    let denied = handlers::all_sellers(
        caller("seller@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(RoleDirectory::from_ref(&state)),
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let Json(sellers) = handlers::all_sellers(
        caller("admin@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(RoleDirectory::from_ref(&state)),
    )
    .await
    .unwrap();
    assert_eq!(sellers.len(), 1);
    assert_eq!(sellers[0].email, "seller@x.com");
}

#[tokio::test]
async fn test_admin_removes_user_once() {
    let state = create_test_state();
    let buyer = seed_user(&state, "buyer@x.com", Role::Buyer).await;
    seed_user(&state, "admin@x.com", Role::Admin).await;

    let status = handlers::remove_buyer(
        caller("admin@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(RoleDirectory::from_ref(&state)),
        Path(buyer.id),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let again = handlers::remove_buyer(
        caller("admin@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(RoleDirectory::from_ref(&state)),
        Path(buyer.id),
    )
    .await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_removal_path_must_match_stored_role() {
    let state = create_test_state();
    let buyer = seed_user(&state, "buyer@x.com", Role::Buyer).await;
    let other_admin = seed_user(&state, "second-admin@x.com", Role::Admin).await;
    seed_user(&state, "admin@x.com", Role::Admin).await;
    let roles = RoleDirectory::from_ref(&state);

    // A buyer is not reachable through the seller path.
    let wrong_path = handlers::remove_seller(
        caller("admin@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(roles.clone()),
        Path(buyer.id),
    )
    .await;
    assert!(matches!(wrong_path, Err(AppError::NotFound(_))));
    assert!(roles.is_buyer("buyer@x.com").await.unwrap());

    // Admins are reachable through neither path.
    for result in [
        handlers::remove_seller(
            caller("admin@x.com"),
            State(AccessPolicy::from_ref(&state)),
            State(roles.clone()),
            Path(other_admin.id),
        )
        .await,
        handlers::remove_buyer(
            caller("admin@x.com"),
            State(AccessPolicy::from_ref(&state)),
            State(roles.clone()),
            Path(other_admin.id),
        )
        .await,
    ] {
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
    assert!(roles.is_admin("second-admin@x.com").await.unwrap());
}

#[tokio::test]
async fn test_role_change_is_admin_only() {
    let state = create_test_state();
    let buyer = seed_user(&state, "buyer@x.com", Role::Buyer).await;
    seed_user(&state, "admin@x.com", Role::Admin).await;

    let denied = handlers::update_user_role(
        caller("buyer@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(RoleDirectory::from_ref(&state)),
        Path(buyer.id),
        ApiJson(UpdateRoleRequest { role: Role::Admin }),
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let Json(updated) = handlers::update_user_role(
        caller("admin@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(RoleDirectory::from_ref(&state)),
        Path(buyer.id),
        ApiJson(UpdateRoleRequest { role: Role::Seller }),
    )
    .await
    .unwrap();
    assert_eq!(updated.role, Role::Seller);
}

// --- OWNERSHIP ---

#[tokio::test]
async fn test_advertise_requires_owner_or_admin() {
    let state = create_test_state();
    seed_user(&state, "owner@x.com", Role::Seller).await;
    seed_user(&state, "rival@x.com", Role::Seller).await;
    seed_user(&state, "admin@x.com", Role::Admin).await;
    let listing = seeded_listing(&state, "owner@x.com").await;

    let denied = handlers::advertise_listing(
        caller("rival@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(ListingLifecycle::from_ref(&state)),
        Path(listing.id),
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    for who in ["owner@x.com", "admin@x.com"] {
        let Json(promoted) = handlers::advertise_listing(
            caller(who),
            State(AccessPolicy::from_ref(&state)),
            State(ListingLifecycle::from_ref(&state)),
            Path(listing.id),
        )
        .await
        .unwrap();
        assert!(promoted.advertised);
    }
}

#[tokio::test]
async fn test_delete_listing_by_non_owner_is_forbidden() {
    let state = create_test_state();
    seed_user(&state, "rival@x.com", Role::Seller).await;
    let listing = seeded_listing(&state, "owner@x.com").await;

    let denied = handlers::delete_listing(
        caller("rival@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(ListingLifecycle::from_ref(&state)),
        Path(listing.id),
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let status = handlers::delete_listing(
        caller("owner@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(ListingLifecycle::from_ref(&state)),
        Path(listing.id),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_advertise_missing_listing_is_not_found() {
    let state = create_test_state();

    let result = handlers::advertise_listing(
        caller("owner@x.com"),
        State(AccessPolicy::from_ref(&state)),
        State(ListingLifecycle::from_ref(&state)),
        Path(Uuid::new_v4()),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

// --- REGISTRATION & PUBLIC CHECKS ---

#[tokio::test]
async fn test_register_rejects_admin_self_assignment() {
    let state = create_test_state();

    let result = handlers::register_user(
        State(RoleDirectory::from_ref(&state)),
        ApiJson(RegisterUserRequest {
            email: "sneaky@x.com".to_string(),
            role: Role::Admin,
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_register_twice_keeps_first_record() {
    let state = create_test_state();
    let first = seed_user(&state, "seller@x.com", Role::Seller).await;

    let Json(second) = handlers::register_user(
        State(RoleDirectory::from_ref(&state)),
        ApiJson(RegisterUserRequest {
            email: "seller@x.com".to_string(),
            role: Role::Buyer,
        }),
    )
    .await
    .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.role, Role::Seller);
}

#[tokio::test]
async fn test_role_checks_for_unknown_email_are_false() {
    let state = create_test_state();
    let roles = RoleDirectory::from_ref(&state);

    let Json(seller) = handlers::seller_check(State(roles.clone()), Path("ghost@x.com".to_string()))
        .await
        .unwrap();
    let Json(admin) = handlers::admin_check(State(roles), Path("ghost@x.com".to_string()))
        .await
        .unwrap();

    assert!(!seller.is_seller);
    assert!(!admin.is_admin);
}

// --- REPOSITORY FAILURE ---

/// Every call fails, as if the database were unreachable.
struct UnavailableRepo;

fn down<T>() -> RepoResult<T> {
    Err(RepositoryError::Decode("database unavailable".to_string()))
}

#[async_trait]
impl Repository for UnavailableRepo {
    async fn find_user_by_email(&self, _email: &str) -> RepoResult<Option<User>> {
        down()
    }
    async fn find_user(&self, _id: Uuid) -> RepoResult<Option<User>> {
        down()
    }
    async fn find_users_by_role(&self, _role: Role) -> RepoResult<Vec<User>> {
        down()
    }
    async fn insert_user(&self, _user: User) -> RepoResult<User> {
        down()
    }
    async fn set_user_role(&self, _id: Uuid, _role: Role) -> RepoResult<Option<User>> {
        down()
    }
    async fn delete_user(&self, _id: Uuid) -> RepoResult<bool> {
        down()
    }
    async fn find_listing(&self, _id: Uuid) -> RepoResult<Option<CarListing>> {
        down()
    }
    async fn find_listings(&self, _filter: &ListingFilter) -> RepoResult<Vec<CarListing>> {
        down()
    }
    async fn insert_listing(&self, _listing: CarListing) -> RepoResult<CarListing> {
        down()
    }
    async fn set_advertised(&self, _id: Uuid) -> RepoResult<Option<CarListing>> {
        down()
    }
    async fn mark_booked(&self, _id: Uuid) -> RepoResult<Option<CarListing>> {
        down()
    }
    async fn delete_listing(&self, _id: Uuid) -> RepoResult<bool> {
        down()
    }
    async fn insert_booking(&self, _booking: Booking) -> RepoResult<Booking> {
        down()
    }
    async fn find_bookings_by_buyer(&self, _buyer_email: &str) -> RepoResult<Vec<Booking>> {
        down()
    }
    async fn find_bookings_by_product(&self, _product_id: Uuid) -> RepoResult<Vec<Booking>> {
        down()
    }
    async fn delete_booking(&self, _id: Uuid) -> RepoResult<bool> {
        down()
    }
}

#[tokio::test]
async fn test_repository_failure_is_internal_error() {
    let state = AppState::new(Arc::new(UnavailableRepo), AppConfig::default());

    let result = handlers::advertised_products(State(ListingLifecycle::from_ref(&state))).await;

    let err = result.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "internal error");
}
