use crate::{
    AppState,
    auth::{AdminSession, clear_session_cookie, session_cookie, session_token_from_headers},
    error::{ApiError, ApiResult},
    models::{
        self, ChangePasswordRequest, ContactRequest, ContactResponse, CreateProjectRequest,
        ImageUploadRequest, ImageUploadResponse, LoginRequest, MeResponse, ProfileImageRequest,
        Profile, Project, SetupRequest, SetupStatusResponse, UpdateProfileRequest,
        UpdateProjectRequest,
    },
    relay::sanitize_address,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

fn me_response(admin: &models::AdminUser) -> MeResponse {
    MeResponse {
        id: admin.id,
        username: admin.username.clone(),
        profile_image_url: admin.profile_image_url.clone(),
    }
}

// --- Public Content Handlers ---

/// get_projects
///
/// [Public Route] Lists every portfolio project, sorted ascending by the
/// numeric value of `orderIndex` with insertion-order ties. The ordering is
/// guaranteed by the repository regardless of which backend is active.
#[utoipa::path(
    get,
    path = "/api/projects",
    responses((status = 200, description = "Ordered projects", body = [Project]))
)]
pub async fn get_projects(State(state): State<AppState>) -> Json<Vec<models::Project>> {
    Json(state.repo.get_all_projects().await)
}

/// get_profile
///
/// [Public Route] Retrieves the singleton Profile. On the durable backend
/// this may legitimately be empty until the first admin write, which maps to
/// a 404 the front end treats as "render defaults".
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 404, description = "No profile written yet")
    )
)]
pub async fn get_profile(State(state): State<AppState>) -> ApiResult<Json<models::Profile>> {
    match state.repo.get_profile().await {
        Some(profile) => Ok(Json(profile)),
        None => Err(ApiError::NotFound),
    }
}

/// submit_contact
///
/// [Public Route] Validates a visitor's contact submission and hands it to
/// the Notification Relay for delivery to the admin's inbox.
///
/// The submission is deliberately never persisted: a relay failure surfaces
/// to the caller as a delivery error (502) and leaves no partial state
/// behind anywhere in the content store.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Delivered", body = ContactResponse),
        (status = 400, description = "Invalid submission"),
        (status = 502, description = "Relay delivery failed")
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> ApiResult<Json<ContactResponse>> {
    if payload.name.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Name and message are required".to_string(),
        ));
    }
    // Reject malformed reply addresses here so the relay never sees them.
    sanitize_address(&payload.email).map_err(ApiError::BadRequest)?;

    state
        .relay
        .send_contact_message(&payload)
        .await
        .map_err(ApiError::RelayDeliveryFailed)?;

    Ok(Json(ContactResponse { success: true }))
}

// --- Session Handlers ---

/// login
///
/// [Public Route] Validates credentials and opens an authenticated session.
///
/// *Security*: an unknown username and a wrong password both fail with the
/// identical `InvalidCredentials` response, so login responses cannot be
/// used to probe whether an account name exists. On success a server-side
/// session row is created and its token set as an HTTP-only cookie with a
/// fixed seven-day lifetime.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = MeResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Response> {
    let admin = state
        .repo
        .get_admin_user_by_username(&payload.username)
        .await
        .ok_or(ApiError::InvalidCredentials)?;

    if !state.hasher.verify(&payload.password, &admin.password) {
        return Err(ApiError::InvalidCredentials);
    }

    let session = state.repo.create_session(admin.id).await?;

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(&session.token, &state.config.env),
        )],
        Json(me_response(&admin)),
    )
        .into_response())
}

/// logout
///
/// [Public Route] Destroys the session server-side (the row is deleted
/// immediately, not merely the cookie) and expires the browser cookie.
/// Idempotent: calling it without a live session still clears the cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Session destroyed"))
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token_from_headers(&headers) {
        state.repo.delete_session(token).await;
    }

    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie(&state.config.env))],
    )
        .into_response()
}

/// get_me
///
/// [Admin Route] Session validity probe. The admin UI calls this on load to
/// decide between the dashboard and the login form; the `AdminSession`
/// extractor does all the work and a 401 simply means "not logged in".
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Session is valid", body = MeResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_me(session: AdminSession) -> Json<MeResponse> {
    Json(MeResponse {
        id: session.admin_id,
        username: session.username,
        profile_image_url: session.profile_image_url,
    })
}

/// get_setup_status
///
/// [Public Route] Reports whether first-run setup has completed. The setup
/// form is only reachable while this is false.
#[utoipa::path(
    get,
    path = "/api/auth/setup-status",
    responses((status = 200, description = "Setup status", body = SetupStatusResponse))
)]
pub async fn get_setup_status(State(state): State<AppState>) -> Json<SetupStatusResponse> {
    Json(SetupStatusResponse {
        setup_complete: state.repo.admin_exists().await,
    })
}

/// setup_admin
///
/// [Public Route, self-disabling] First-run bootstrap of the single admin
/// account. Once any admin exists this permanently fails with a
/// setup-already-complete response, both through the fast pre-check and
/// atomically inside the repository, so concurrent first-time callers
/// cannot both win. The new admin is logged in immediately.
#[utoipa::path(
    post,
    path = "/api/auth/setup",
    request_body = SetupRequest,
    responses(
        (status = 201, description = "Admin created and logged in", body = MeResponse),
        (status = 400, description = "Missing username or password"),
        (status = 403, description = "Setup already complete")
    )
)]
pub async fn setup_admin(
    State(state): State<AppState>,
    Json(payload): Json<SetupRequest>,
) -> ApiResult<Response> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    if state.repo.admin_exists().await {
        return Err(ApiError::AdminAlreadyExists);
    }

    // The store receives only the opaque hash, never the plaintext.
    let password_hash = state.hasher.hash(&payload.password)?;
    let admin = state
        .repo
        .create_admin_user(payload.username, password_hash)
        .await?;

    let session = state.repo.create_session(admin.id).await?;

    Ok((
        StatusCode::CREATED,
        [(
            header::SET_COOKIE,
            session_cookie(&session.token, &state.config.env),
        )],
        Json(me_response(&admin)),
    )
        .into_response())
}

// --- Admin Content Handlers ---

/// create_project
///
/// [Admin Route] Adds a portfolio entry. Omitted optional fields get the
/// documented defaults (deviceType "monitor", no tags, orderIndex "0").
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 200, description = "Created", body = Project),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_project(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<Json<models::Project>> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let project = state.repo.create_project(payload).await?;
    Ok(Json(project))
}

/// update_project
///
/// [Admin Route] Merges the supplied fields over an existing project.
/// Unknown ids map to 404; `createdAt` is never modified.
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Updated", body = Project),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_project(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> ApiResult<Json<models::Project>> {
    match state.repo.update_project(id, payload).await {
        Some(project) => Ok(Json(project)),
        None => Err(ApiError::NotFound),
    }
}

/// delete_project
///
/// [Admin Route] Irreversibly removes a project.
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_project(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.repo.delete_project(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// update_profile
///
/// [Admin Route] Create-or-merge write to the singleton Profile. Always
/// returns the resulting full record; `updatedAt` is refreshed on every
/// call.
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated", body = Profile))
)]
pub async fn update_profile(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<models::Profile>> {
    let profile = state.repo.update_profile(payload).await?;
    Ok(Json(profile))
}

// --- Admin Account Handlers ---

/// change_password
///
/// [Admin Route] Replaces the admin's credential hash after re-verifying
/// the current password through the opaque check.
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MeResponse),
        (status = 401, description = "Current password wrong")
    )
)]
pub async fn change_password(
    session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MeResponse>> {
    if payload.new_password.is_empty() {
        return Err(ApiError::BadRequest(
            "New password is required".to_string(),
        ));
    }

    let admin = state
        .repo
        .get_admin_user(session.admin_id)
        .await
        .ok_or(ApiError::Unauthorized)?;

    if !state.hasher.verify(&payload.current_password, &admin.password) {
        return Err(ApiError::InvalidCredentials);
    }

    let password_hash = state.hasher.hash(&payload.new_password)?;
    let updated = state
        .repo
        .update_admin_password(admin.id, password_hash)
        .await
        .ok_or(ApiError::NotFound)?;

    Ok(Json(me_response(&updated)))
}

/// update_profile_image
///
/// [Admin Route] Sets or clears (explicit null) the admin's profile image
/// reference. Mutates only that one field.
#[utoipa::path(
    put,
    path = "/api/auth/profile-image",
    request_body = ProfileImageRequest,
    responses(
        (status = 200, description = "Updated", body = MeResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_profile_image(
    session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<ProfileImageRequest>,
) -> ApiResult<Json<MeResponse>> {
    let updated = state
        .repo
        .update_admin_profile_image(session.admin_id, payload.image_url)
        .await
        .ok_or(ApiError::NotFound)?;

    Ok(Json(me_response(&updated)))
}

/// get_image_upload_url
///
/// [Admin Route] Generates a temporary, signed URL for uploading a project
/// or profile image directly to the blob store, bypassing this server.
///
/// *Security*: the URL is short-lived, constrained to the declared content
/// type, and keyed by a fresh UUID so uploads can never collide or
/// overwrite each other.
#[utoipa::path(
    post,
    path = "/api/uploads/presigned",
    request_body = ImageUploadRequest,
    responses(
        (status = 200, description = "Upload URL", body = ImageUploadResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_image_upload_url(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<ImageUploadRequest>,
) -> ApiResult<Json<ImageUploadResponse>> {
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let object_key = format!("images/{}.{}", Uuid::new_v4(), extension);

    match state
        .blobs
        .presigned_image_upload_url(&object_key, &payload.file_type)
        .await
    {
        Ok(url) => Ok(Json(ImageUploadResponse {
            upload_url: url,
            resource_key: object_key,
        })),
        Err(e) => Err(ApiError::Internal(format!("blob store: {e}"))),
    }
}
