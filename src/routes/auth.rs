use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Auth Router Module
///
/// Session lifecycle endpoints. Login, logout, and the setup pair are
/// reachable anonymously by design: login *creates* the authenticated
/// state, and setup is self-disabling via the single-admin invariant. The
/// session probe (`/me`) authenticates through the `AdminSession` extractor
/// inside its handler rather than a router layer, because a 401 there is an
/// expected answer, not an access violation.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // POST /api/auth/login
        // Credential check with a uniform failure response (no account
        // enumeration), issuing the HTTP-only session cookie on success.
        .route("/api/auth/login", post(handlers::login))
        // POST /api/auth/logout
        // Destroys the server-side session row and expires the cookie.
        .route("/api/auth/logout", post(handlers::logout))
        // GET /api/auth/me
        // Session validity probe used by the admin UI to gate the dashboard.
        .route("/api/auth/me", get(handlers::get_me))
        // GET /api/auth/setup-status
        // Whether the single admin account has been created yet.
        .route("/api/auth/setup-status", get(handlers::get_setup_status))
        // POST /api/auth/setup
        // First-run bootstrap of the single admin account; permanently
        // rejects once an admin exists.
        .route("/api/auth/setup", post(handlers::setup_admin))
}
