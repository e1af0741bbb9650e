use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the 'admin' role:
/// account oversight, role-request administration, and dashboard statistics.
///
/// Access Control:
/// Each handler authenticates via the `AuthUser` extractor and then checks
/// for the admin role before touching the store, so a missing token yields
/// 401 and a non-admin token yields 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/users
        // Every account with its profile fields, newest first.
        .route("/users", get(handlers::admin_users))
        // GET /admin/role-requests
        // The full role-request history (all statuses), newest first.
        .route("/role-requests", get(handlers::admin_role_requests))
        // POST /admin/role-requests/{id}/approve | /reject
        // Compare-and-swap resolution of a pending role request. Approval
        // applies the requested role to the target profile.
        .route(
            "/role-requests/{id}/approve",
            post(handlers::admin_approve_role),
        )
        .route(
            "/role-requests/{id}/reject",
            post(handlers::admin_reject_role),
        )
        // GET /admin/stats
        // Core dashboard metrics: accounts by role, pending role requests,
        // fault totals.
        .route("/stats", get(handlers::admin_stats))
}
