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
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod workflow;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser; // The resolved authenticated user identity.
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point
// and the integration tests.
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the
/// application by aggregating all API paths and data schemas decorated with
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]`.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login_user, handlers::get_me, handlers::set_role,
        handlers::list_libraries, handlers::create_library, handlers::update_library,
        handlers::list_labs, handlers::create_lab, handlers::update_lab,
        handlers::list_classrooms, handlers::create_classroom, handlers::update_classroom,
        handlers::list_pending_updates, handlers::approve_update, handlers::reject_update,
        handlers::list_faults, handlers::create_fault, handlers::get_fault,
        handlers::update_fault, handlers::create_room_request, handlers::list_room_requests,
        handlers::approve_room_request, handlers::reject_room_request, handlers::admin_users,
        handlers::admin_role_requests, handlers::admin_approve_role, handlers::admin_reject_role,
        handlers::admin_stats
    ),
    components(
        schemas(
            models::Role, models::RequestStatus, models::FaultStatus, models::Severity,
            models::FaultCategory, models::LocationType, models::RoomType, models::ResourceKind,
            models::UpdateStatus, models::Library, models::Lab, models::Classroom,
            models::RoleRequest, models::ResourceUpdateRequest, models::FaultReport,
            models::RoomRequest, models::RegisterRequest, models::LoginRequest,
            models::RoleChangeRequest, models::CreateLibraryRequest, models::CreateLabRequest,
            models::CreateClassroomRequest, models::LibraryUpdatePayload,
            models::RoomUpdatePayload, models::CreateFaultRequest, models::FaultUpdatePayload,
            models::CreateRoomRequestPayload, models::ApproveRoomRequestPayload,
            models::RejectPayload, models::UserAccount, models::UserEnvelope,
            models::AuthResponse, models::RoleChangeResponse, models::LibraryView,
            models::LabView, models::ClassroomView, models::LibraryList, models::LabList,
            models::ClassroomList, models::LibraryUpdateOutcome, models::LabUpdateOutcome,
            models::ClassroomUpdateOutcome, models::UpdateRequestView,
            models::PendingUpdatesResponse, models::FaultView, models::FaultList,
            models::RoleRequestView, models::RoleRequestList, models::UserList,
            models::AssignedRoom, models::RoomRequestView, models::RoomRequestList,
            models::UserRoleCounts, models::FaultCounts, models::AdminDashboardStats,
        )
    ),
    tags(
        (name = "campus-facilities", description = "Campus Facility Management API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all essential
/// application services and configuration, shared across all incoming
/// requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts store access behind `Arc<dyn Repository>`.
    pub repo: RepositoryState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These allow extractors (notably AuthUser) to selectively pull components
// from the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the `authenticated_routes`.
///
/// *Mechanism*: it attempts to extract `AuthUser` from the request. Since
/// `AuthUser` implements `FromRequestParts`, failed authentication rejects
/// the request with 401 before the handler runs; on success the request
/// simply proceeds (handlers re-extract the identity they need).
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
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
        // Public routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated routes: protected by the auth middleware.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes: nested under '/admin'. The admin role check is
        // performed inside the handlers after authentication.
        .nest("/admin", admin::admin_routes())
        // Apply the unified state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: unique UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: wraps the request/response lifecycle in
                // a span carrying the generated request id.
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
        // 4. CORS layer.
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the `TraceLayer` span: extracts the `x-request-id` header (if
/// present) and includes it alongside the HTTP method and URI, so every log
/// line for a single request is correlated by a unique id.
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
