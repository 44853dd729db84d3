use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines the endpoints that are **unauthenticated** and accessible to any
/// client. These are the read-only content routes backing the public site
/// plus the contact form. Public reads bypass the session gate entirely and
/// hit the content store directly.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
        // GET /api/projects
        // The ordered portfolio gallery: ascending numeric orderIndex,
        // insertion-order ties, identical on either storage backend.
        .route("/api/projects", get(handlers::get_projects))
        // GET /api/profile
        // The singleton about/bio record. 404 until first write on the
        // durable backend; the in-memory backend is pre-seeded.
        .route("/api/profile", get(handlers::get_profile))
        // POST /api/contact
        // Relays a visitor submission to the admin's inbox. Delivery
        // failures surface as 502; nothing is persisted either way.
        .route("/api/contact", post(handlers::submit_contact))
}
