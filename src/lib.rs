use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod relay;
pub mod repository;
pub mod storage;

// Module for routing segregation (Public, Auth, Admin).
pub mod routes;
use auth::AdminSession; // The resolved authenticated admin session.
use routes::{admin, auth as auth_routes, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry
// point (main.rs) and the integration tests.
pub use auth::{BcryptHasher, HasherState, MockPasswordHasher};
pub use config::AppConfig;
pub use relay::{GmailRelay, MockNotificationRelay, RelayState};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{BlobStoreState, MockBlobStore, S3BlobStore};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the
/// application by aggregating every `#[utoipa::path]`-decorated handler and
/// every schema used in request/response bodies. Served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_projects, handlers::get_profile, handlers::submit_contact,
        handlers::login, handlers::logout, handlers::get_me,
        handlers::get_setup_status, handlers::setup_admin,
        handlers::create_project, handlers::update_project, handlers::delete_project,
        handlers::update_profile, handlers::change_password,
        handlers::update_profile_image, handlers::get_image_upload_url
    ),
    components(
        schemas(
            models::Project, models::Profile,
            models::CreateProjectRequest, models::UpdateProjectRequest,
            models::UpdateProfileRequest, models::LoginRequest, models::SetupRequest,
            models::ChangePasswordRequest, models::ProfileImageRequest,
            models::ContactRequest, models::ContactResponse,
            models::ImageUploadRequest, models::ImageUploadResponse,
            models::MeResponse, models::SetupStatusResponse,
        )
    ),
    tags(
        (name = "portfolio", description = "Personal portfolio site API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding every application
/// service: the storage backend selected at startup, the opaque credential
/// check, the notification relay, the blob store, and the configuration.
/// Shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Storage facade: the one backend (Postgres or in-memory) chosen at
    /// process start.
    pub repo: RepositoryState,
    /// Opaque one-way credential check.
    pub hasher: HasherState,
    /// Contact-to-inbox delivery collaborator.
    pub relay: RelayState,
    /// Presigned image-upload collaborator.
    pub blobs: BlobStoreState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These let handlers and extractors pull individual services out of the
// shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for HasherState {
    fn from_ref(app_state: &AppState) -> HasherState {
        app_state.hasher.clone()
    }
}

impl FromRef<AppState> for RelayState {
    fn from_ref(app_state: &AppState) -> RelayState {
        app_state.relay.clone()
    }
}

impl FromRef<AppState> for BlobStoreState {
    fn from_ref(app_state: &AppState) -> BlobStoreState {
        app_state.blobs.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// require_session
///
/// Middleware enforcing the session gate on the admin router. It resolves
/// `AdminSession` from the request; the extractor rejects with 401 when the
/// cookie is missing, the session row is unknown or expired, or the admin
/// account no longer exists. All of this happens before the wrapped handler runs, so no
/// mutation can precede authentication.
async fn require_session(_session: AdminSession, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware applied; reads bypass the session
        // gate entirely.
        .merge(public::public_routes())
        // Session lifecycle routes: anonymous by design.
        .merge(auth_routes::auth_routes())
        // Admin routes: every mutating endpoint behind the session gate.
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_session)),
        )
        // Apply the unified state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: a unique UUID per request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: wraps the request/response lifecycle
                // in a span correlated by that ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer (applied last).
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes TraceLayer's span creation to include the `x-request-id`
/// header alongside the HTTP method and URI, so every log line for one
/// request shares a correlation ID.
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
