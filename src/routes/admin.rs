use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Admin Router Module
///
/// Every mutating content and account route. The entire router is wrapped
/// (in `create_router`) in a middleware layer that resolves `AdminSession`
/// first, so an unauthenticated request is rejected with 401 before any
/// handler (and therefore any content-store mutation) can execute.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /api/projects
        // Adds a portfolio entry with the documented defaults for omitted
        // optional fields.
        .route("/api/projects", post(handlers::create_project))
        // PUT/DELETE /api/projects/{id}
        // Partial-merge update and irreversible delete. Unknown ids map to
        // 404 rather than an error.
        .route(
            "/api/projects/{id}",
            put(handlers::update_project).delete(handlers::delete_project),
        )
        // PUT /api/profile
        // Create-or-merge write to the singleton Profile.
        .route("/api/profile", put(handlers::update_profile))
        // POST /api/auth/change-password
        // Re-verifies the current password before storing the new hash.
        .route(
            "/api/auth/change-password",
            post(handlers::change_password),
        )
        // PUT /api/auth/profile-image
        // Sets or clears the admin's profile image reference.
        .route(
            "/api/auth/profile-image",
            put(handlers::update_profile_image),
        )
        // POST /api/uploads/presigned
        // Short-lived signed URL for a direct image upload to the blob
        // store.
        .route("/api/uploads/presigned", post(handlers::get_image_upload_url))
}
