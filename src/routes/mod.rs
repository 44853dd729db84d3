/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules. Access control is applied explicitly at the module level (via
/// Axum layers in `create_router`), so a protected endpoint can never be
/// exposed by accident.
///
/// Routes accessible to any client (anonymous, read-only content plus the
/// contact form).
pub mod public;

/// Session lifecycle routes: login, logout, the session probe, and the
/// self-disabling first-run setup endpoint.
pub mod auth;

/// Mutating content and account routes. The whole module sits behind the
/// require-session middleware; every request is authenticated before any
/// handler (and therefore any store mutation) runs.
pub mod admin;
