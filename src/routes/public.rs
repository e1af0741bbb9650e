use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client: the identity gateway (register/login), a liveness probe, and the
/// read-only resource listings. Listing occupancy data is deliberately open;
/// every mutation lives behind the authenticated router.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Simple, unauthenticated endpoint used for monitoring and load
        // balancer checks. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // New account creation: hashes the password, provisions the default
        // profile, and returns a bearer token.
        .route("/register", post(handlers::register_user))
        // POST /login
        // Credential verification returning a fresh bearer token.
        .route("/login", post(handlers::login_user))
        // GET /libraries, /labs, /classrooms
        // Read-only occupancy/availability listings with derived percentages.
        .route("/libraries", get(handlers::list_libraries))
        .route("/labs", get(handlers::list_labs))
        .route("/classrooms", get(handlers::list_classrooms))
}
