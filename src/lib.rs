use axum::{
    Json, Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
    routing::get,
};
use utoipa::OpenApi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Marketplace core.
pub mod auth;
pub mod listings;
pub mod policy;
pub mod roles;
pub mod token;

// Plumbing around the core.
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;

// Routing segregated by access level (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use listings::ListingLifecycle;
pub use policy::AccessPolicy;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use roles::RoleDirectory;
pub use token::TokenService;

/// ApiDoc
///
/// OpenAPI document for every `#[utoipa::path]` handler, served as JSON at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::issue_token, handlers::register_user, handlers::seller_check,
        handlers::admin_check, handlers::buyer_check, handlers::advertised_products,
        handlers::my_advertisements, handlers::my_orders, handlers::category_listings,
        handlers::create_car, handlers::create_booking, handlers::advertise_listing,
        handlers::delete_listing, handlers::all_sellers, handlers::all_buyers,
        handlers::remove_seller, handlers::remove_buyer, handlers::update_user_role
    ),
    components(
        schemas(
            models::User, models::Role, models::CarListing, models::ListingStatus,
            models::Booking, models::RegisterUserRequest, models::CreateCarRequest,
            models::CreateBookingRequest, models::UpdateRoleRequest, models::TokenResponse,
            models::SellerCheck, models::AdminCheck, models::BuyerCheck,
        )
    ),
    tags(
        (name = "car-bazaar", description = "Car Bazaar marketplace API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single shared container for everything a request may touch. The
/// repository is built once in `main` and every component below borrows it.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub tokens: TokenService,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            tokens: TokenService::new(&config.jwt_secret),
            repo,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// Handlers pull exactly the component they need out of AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for RoleDirectory {
    fn from_ref(app_state: &AppState) -> RoleDirectory {
        RoleDirectory::new(app_state.repo.clone())
    }
}

impl FromRef<AppState> for AccessPolicy {
    fn from_ref(app_state: &AppState) -> AccessPolicy {
        AccessPolicy::new(RoleDirectory::from_ref(app_state))
    }
}

impl FromRef<AppState> for ListingLifecycle {
    fn from_ref(app_state: &AppState) -> ListingLifecycle {
        ListingLifecycle::new(app_state.repo.clone())
    }
}

/// create_router
///
/// Assembles public, authenticated and admin routes, applies the identity
/// guard to the latter two, and wraps everything in request-id, tracing and
/// CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let guarded = authenticated::authenticated_routes()
        .merge(admin::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_identity,
        ));

    let base_router = Router::new()
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(public::public_routes())
        .merge(guarded)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens one span per request carrying method, URI and the `x-request-id`
/// so every log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
