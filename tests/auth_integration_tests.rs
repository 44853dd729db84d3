use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{Request, header};
use chrono::{Duration, Utc};
use portfolio_api::{
    AppConfig, AppState,
    auth::{AdminSession, MockPasswordHasher, SESSION_COOKIE},
    error::{ApiError, ApiResult},
    models::{
        AdminUser, CreateProjectRequest, Profile, Project, Session, UpdateProfileRequest,
        UpdateProjectRequest,
    },
    relay::MockNotificationRelay,
    repository::{MemoryRepository, Repository, RepositoryState},
    storage::MockBlobStore,
};
use std::sync::Arc;
use uuid::Uuid;

fn state_with(repo: RepositoryState) -> AppState {
    AppState {
        repo,
        hasher: Arc::new(MockPasswordHasher),
        relay: Arc::new(MockNotificationRelay::new()),
        blobs: Arc::new(MockBlobStore::new()),
        config: AppConfig::default(),
    }
}

/// Runs the session-gate extractor against a request carrying the given
/// Cookie header, exactly as the admin middleware would.
async fn extract(state: &AppState, cookie: Option<String>) -> Result<AdminSession, ApiError> {
    let mut builder = Request::builder().uri("/api/projects");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let (mut parts, _) = builder.body(()).expect("valid request").into_parts();

    AdminSession::from_request_parts(&mut parts, state).await
}

#[tokio::test]
async fn missing_cookie_is_rejected() {
    let state = state_with(Arc::new(MemoryRepository::new()));
    let result = extract(&state, None).await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let state = state_with(Arc::new(MemoryRepository::new()));
    let result = extract(&state, Some(format!("{SESSION_COOKIE}=bogus-token"))).await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn live_session_resolves_the_admin_identity() {
    let repo = Arc::new(MemoryRepository::new());
    let admin = repo
        .create_admin_user("rod".to_string(), "hashed:pw1".to_string())
        .await
        .unwrap();
    let session = repo.create_session(admin.id).await.unwrap();

    let state = state_with(repo);
    let resolved = extract(&state, Some(format!("{SESSION_COOKIE}={}", session.token)))
        .await
        .expect("live session accepted");

    assert_eq!(resolved.admin_id, admin.id);
    assert_eq!(resolved.username, "rod");
    assert_eq!(resolved.token, session.token);
}

#[tokio::test]
async fn session_is_found_among_other_cookies() {
    let repo = Arc::new(MemoryRepository::new());
    let admin = repo
        .create_admin_user("rod".to_string(), "hashed:pw1".to_string())
        .await
        .unwrap();
    let session = repo.create_session(admin.id).await.unwrap();

    let state = state_with(repo);
    let cookie = format!("theme=dark; {SESSION_COOKIE}={}; lang=en", session.token);
    assert!(extract(&state, Some(cookie)).await.is_ok());
}

#[tokio::test]
async fn destroyed_session_is_rejected() {
    let repo = Arc::new(MemoryRepository::new());
    let admin = repo
        .create_admin_user("rod".to_string(), "hashed:pw1".to_string())
        .await
        .unwrap();
    let session = repo.create_session(admin.id).await.unwrap();
    repo.delete_session(&session.token).await;

    let state = state_with(repo);
    let result = extract(&state, Some(format!("{SESSION_COOKIE}={}", session.token))).await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

// --- Stubs for states the real backends cannot reach through their API ---

/// A repository whose sessions all point at an admin account that no longer
/// exists. The gate must treat such a session as invalid, not merely stale.
struct DanglingSessionRepo;

/// A repository that still holds an expired session row. The gate must
/// reject it even though the row exists.
struct ExpiredSessionRepo;

fn stub_session(expires_at: chrono::DateTime<Utc>) -> Session {
    Session {
        token: "stub-token".to_string(),
        admin_id: Uuid::new_v4(),
        expires_at,
    }
}

#[async_trait]
impl Repository for DanglingSessionRepo {
    async fn get_admin_user(&self, _id: Uuid) -> Option<AdminUser> {
        // The account the session points at is gone.
        None
    }
    async fn get_session(&self, _token: &str) -> Option<Session> {
        Some(stub_session(Utc::now() + Duration::days(1)))
    }

    // Unused trait methods, stubbed so the impl compiles.
    async fn get_admin_user_by_username(&self, _username: &str) -> Option<AdminUser> {
        None
    }
    async fn create_admin_user(&self, _username: String, _password: String) -> ApiResult<AdminUser> {
        panic!("Stub called")
    }
    async fn admin_exists(&self) -> bool {
        false
    }
    async fn update_admin_password(&self, _id: Uuid, _password: String) -> Option<AdminUser> {
        None
    }
    async fn update_admin_profile_image(
        &self,
        _id: Uuid,
        _image_url: Option<String>,
    ) -> Option<AdminUser> {
        None
    }
    async fn get_all_projects(&self) -> Vec<Project> {
        vec![]
    }
    async fn get_project(&self, _id: Uuid) -> Option<Project> {
        None
    }
    async fn create_project(&self, _req: CreateProjectRequest) -> ApiResult<Project> {
        panic!("Stub called")
    }
    async fn update_project(&self, _id: Uuid, _req: UpdateProjectRequest) -> Option<Project> {
        None
    }
    async fn delete_project(&self, _id: Uuid) -> bool {
        false
    }
    async fn get_profile(&self) -> Option<Profile> {
        None
    }
    async fn update_profile(&self, _req: UpdateProfileRequest) -> ApiResult<Profile> {
        panic!("Stub called")
    }
    async fn create_session(&self, _admin_id: Uuid) -> ApiResult<Session> {
        panic!("Stub called")
    }
    async fn delete_session(&self, _token: &str) -> bool {
        false
    }
}

#[async_trait]
impl Repository for ExpiredSessionRepo {
    async fn get_admin_user(&self, id: Uuid) -> Option<AdminUser> {
        Some(AdminUser {
            id,
            username: "rod".to_string(),
            password: "hashed:pw1".to_string(),
            profile_image_url: None,
            created_at: Utc::now(),
        })
    }
    async fn get_session(&self, _token: &str) -> Option<Session> {
        // Faithful to the contract: an expired row is never returned.
        let session = stub_session(Utc::now() - Duration::seconds(1));
        (session.expires_at > Utc::now()).then_some(session)
    }

    // Unused trait methods, stubbed so the impl compiles.
    async fn get_admin_user_by_username(&self, _username: &str) -> Option<AdminUser> {
        None
    }
    async fn create_admin_user(&self, _username: String, _password: String) -> ApiResult<AdminUser> {
        panic!("Stub called")
    }
    async fn admin_exists(&self) -> bool {
        false
    }
    async fn update_admin_password(&self, _id: Uuid, _password: String) -> Option<AdminUser> {
        None
    }
    async fn update_admin_profile_image(
        &self,
        _id: Uuid,
        _image_url: Option<String>,
    ) -> Option<AdminUser> {
        None
    }
    async fn get_all_projects(&self) -> Vec<Project> {
        vec![]
    }
    async fn get_project(&self, _id: Uuid) -> Option<Project> {
        None
    }
    async fn create_project(&self, _req: CreateProjectRequest) -> ApiResult<Project> {
        panic!("Stub called")
    }
    async fn update_project(&self, _id: Uuid, _req: UpdateProjectRequest) -> Option<Project> {
        None
    }
    async fn delete_project(&self, _id: Uuid) -> bool {
        false
    }
    async fn get_profile(&self) -> Option<Profile> {
        None
    }
    async fn update_profile(&self, _req: UpdateProfileRequest) -> ApiResult<Profile> {
        panic!("Stub called")
    }
    async fn create_session(&self, _admin_id: Uuid) -> ApiResult<Session> {
        panic!("Stub called")
    }
    async fn delete_session(&self, _token: &str) -> bool {
        false
    }
}

#[tokio::test]
async fn session_referencing_deleted_admin_is_rejected() {
    let state = state_with(Arc::new(DanglingSessionRepo));
    let result = extract(&state, Some(format!("{SESSION_COOKIE}=stub-token"))).await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let state = state_with(Arc::new(ExpiredSessionRepo));
    let result = extract(&state, Some(format!("{SESSION_COOKIE}=stub-token"))).await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}
