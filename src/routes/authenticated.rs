use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any caller who has passed the
/// authentication layer. Role-specific gating (manager/admin for resource
/// administration and approvals, lecturer for room requests) happens inside
/// the handlers via the capability-set check, so the allow-list sits next to
/// the logic it protects.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The caller's account and profile fields.
        .route("/me", get(handlers::get_me))
        // POST /role
        // Role self-service: immediate for student, pending request for
        // lecturer/manager elevation.
        .route("/role", post(handlers::set_role))
        // --- Resource Administration (manager/admin inside handlers) ---
        // POST /libraries | /labs | /classrooms
        // Validated creates with uniqueness checks.
        .route("/libraries", post(handlers::create_library))
        .route("/labs", post(handlers::create_lab))
        .route("/classrooms", post(handlers::create_classroom))
        // POST /{resource}/{id}/update
        // The two-tier update path: direct for privileged roles, pending
        // update request for everyone else.
        .route("/libraries/{id}/update", post(handlers::update_library))
        .route("/labs/{id}/update", post(handlers::update_lab))
        .route("/classrooms/{id}/update", post(handlers::update_classroom))
        // --- Update Review Queue (manager/admin) ---
        // GET /updates/pending
        // All pending update requests grouped by resource kind.
        .route("/updates/pending", get(handlers::list_pending_updates))
        // POST /updates/{kind}/{id}/approve | /reject
        // Compare-and-swap resolution of a pending update request.
        .route(
            "/updates/{kind}/{id}/approve",
            post(handlers::approve_update),
        )
        .route("/updates/{kind}/{id}/reject", post(handlers::reject_update))
        // --- Fault Reports ---
        // GET /faults lists (own vs all by role); POST files a new report.
        .route(
            "/faults",
            get(handlers::list_faults).post(handlers::create_fault),
        )
        // GET /faults/{id} detail; PATCH|PUT partial lifecycle update
        // (manager/admin only).
        .route(
            "/faults/{id}",
            get(handlers::get_fault)
                .patch(handlers::update_fault)
                .put(handlers::update_fault),
        )
        // --- Room Booking ---
        // GET lists (own vs all by role); POST creates (lecturer only).
        .route(
            "/room-requests",
            get(handlers::list_room_requests).post(handlers::create_room_request),
        )
        // POST /room-requests/{id}/approve | /reject (manager/admin).
        .route(
            "/room-requests/{id}/approve",
            post(handlers::approve_room_request),
        )
        .route(
            "/room-requests/{id}/reject",
            post(handlers::reject_room_request),
        )
}
