/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules, so access control is applied explicitly at the module level (via
/// Axum layers) instead of being scattered across individual registrations.
///
/// The three modules map directly to the defined access tiers.

/// Routes accessible to all clients (anonymous, read-only, plus the
/// register/login gateway).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated bearer token (or the local dev bypass).
pub mod authenticated;

/// Routes restricted to users with the 'admin' role. The role check runs
/// inside each handler after authentication.
pub mod admin;
