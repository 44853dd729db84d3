use portfolio_api::{
    AppConfig, AppState, create_router,
    auth::MockPasswordHasher,
    models::{MeResponse, Profile, Project},
    relay::MockNotificationRelay,
    repository::{MemoryRepository, RepositoryState},
    storage::MockBlobStore,
};
use serial_test::serial;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
}

/// Boots the full application on an ephemeral port, backed by the in-memory
/// repository and mock collaborators, so the suite runs without any
/// external services.
async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new()) as RepositoryState;

    let state = AppState {
        repo,
        hasher: Arc::new(MockPasswordHasher),
        relay: Arc::new(MockNotificationRelay::new()),
        blobs: Arc::new(MockBlobStore::new()),
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

fn client() -> reqwest::Client {
    // The cookie store stands in for the browser holding the session cookie.
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("client")
}

#[tokio::test]
#[serial]
async fn full_admin_session_scenario() {
    let app = spawn_app().await;
    let client = client();

    // First-run bootstrap creates the admin and logs the browser in.
    let setup = client
        .post(format!("{}/api/auth/setup", app.address))
        .json(&serde_json::json!({"username": "rod", "password": "pw1"}))
        .send()
        .await
        .expect("setup");
    assert_eq!(setup.status(), 201);

    // Drop the bootstrap session so the explicit login path is exercised.
    let logout = client
        .post(format!("{}/api/auth/logout", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), 204);

    // Wrong password fails; correct credentials open a session.
    let bad_login = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({"username": "rod", "password": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_login.status(), 401);

    let login = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({"username": "rod", "password": "pw1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), 200);

    // The probe confirms the authenticated state.
    let me = client
        .get(format!("{}/api/auth/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), 200);
    let me: MeResponse = me.json().await.unwrap();
    assert_eq!(me.username, "rod");

    // Create a project and observe the documented defaults.
    let created = client
        .post(format!("{}/api/projects", app.address))
        .json(&serde_json::json!({"title": "Site A", "description": "Landing page", "imageUrl": "u1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 200);
    let created: Project = created.json().await.unwrap();
    assert_eq!(created.device_type, "monitor");
    assert!(created.tags.is_empty());
    assert_eq!(created.order_index, "0");

    let listed: Vec<Project> = client
        .get(format!("{}/api/projects", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Site A");

    // After logout the same browser is anonymous again: the session row is
    // gone server-side, so replaying the old cookie cannot help.
    let logout = client
        .post(format!("{}/api/auth/logout", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), 204);

    let rejected = client
        .post(format!("{}/api/projects", app.address))
        .json(&serde_json::json!({"title": "Site B", "description": "", "imageUrl": "u2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 401);

    let me_after = client
        .get(format!("{}/api/auth/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(me_after.status(), 401);
}

#[tokio::test]
#[serial]
async fn gallery_ordering_survives_the_http_round_trip() {
    let app = spawn_app().await;
    let client = client();

    client
        .post(format!("{}/api/auth/setup", app.address))
        .json(&serde_json::json!({"username": "rod", "password": "pw1"}))
        .send()
        .await
        .unwrap();

    for (title, order_index) in [("late", "10"), ("tie-one", "2"), ("tie-two", "2"), ("lead", "1")]
    {
        let response = client
            .post(format!("{}/api/projects", app.address))
            .json(&serde_json::json!({
                "title": title,
                "description": "",
                "imageUrl": "u",
                "orderIndex": order_index
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let listed: Vec<Project> = client
        .get(format!("{}/api/projects", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles: Vec<&str> = listed.iter().map(|p| p.title.as_str()).collect();
    // Numeric ascending, with the tie kept in creation order.
    assert_eq!(titles, vec!["lead", "tie-one", "tie-two", "late"]);
}

#[tokio::test]
#[serial]
async fn profile_editing_flow() {
    let app = spawn_app().await;
    let client = client();

    // The placeholder profile is publicly visible before any setup.
    let seeded: Profile = client
        .get(format!("{}/api/profile", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!seeded.bio1.is_empty());

    client
        .post(format!("{}/api/auth/setup", app.address))
        .json(&serde_json::json!({"username": "rod", "password": "pw1"}))
        .send()
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let updated = client
        .put(format!("{}/api/profile", app.address))
        .json(&serde_json::json!({"bio1": "Fresh intro", "skills": ["Rust", "Axum"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), 200);
    let updated: Profile = updated.json().await.unwrap();

    assert_eq!(updated.bio1, "Fresh intro");
    assert_eq!(updated.skills, vec!["Rust", "Axum"]);
    // Unsupplied fields kept their placeholder values.
    assert_eq!(updated.bio2, seeded.bio2);
    assert_eq!(updated.contact_email, seeded.contact_email);
    assert!(updated.updated_at > seeded.updated_at);

    // The public read reflects the merge immediately.
    let public: Profile = client
        .get(format!("{}/api/profile", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(public.bio1, "Fresh intro");
}

#[tokio::test]
#[serial]
async fn password_change_flow() {
    let app = spawn_app().await;
    let client = client();

    client
        .post(format!("{}/api/auth/setup", app.address))
        .json(&serde_json::json!({"username": "rod", "password": "pw1"}))
        .send()
        .await
        .unwrap();

    // The wrong current password is refused before anything is written.
    let refused = client
        .post(format!("{}/api/auth/change-password", app.address))
        .json(&serde_json::json!({"currentPassword": "wrong", "newPassword": "pw2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(refused.status(), 401);

    let changed = client
        .post(format!("{}/api/auth/change-password", app.address))
        .json(&serde_json::json!({"currentPassword": "pw1", "newPassword": "pw2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(changed.status(), 200);

    client
        .post(format!("{}/api/auth/logout", app.address))
        .send()
        .await
        .unwrap();

    // Old credentials are dead; the new ones work.
    let old = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({"username": "rod", "password": "pw1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(old.status(), 401);

    let fresh = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({"username": "rod", "password": "pw2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(fresh.status(), 200);
}

#[tokio::test]
#[serial]
async fn project_update_and_delete_flow() {
    let app = spawn_app().await;
    let client = client();

    client
        .post(format!("{}/api/auth/setup", app.address))
        .json(&serde_json::json!({"username": "rod", "password": "pw1"}))
        .send()
        .await
        .unwrap();

    let created: Project = client
        .post(format!("{}/api/projects", app.address))
        .json(&serde_json::json!({
            "title": "Original",
            "description": "First cut",
            "imageUrl": "u1",
            "deviceType": "phone",
            "tags": ["mobile"]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Partial update: only the title changes.
    let updated: Project = client
        .put(format!("{}/api/projects/{}", app.address, created.id))
        .json(&serde_json::json!({"title": "Renamed"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.description, "First cut");
    assert_eq!(updated.device_type, "phone");
    assert_eq!(updated.tags, vec!["mobile"]);
    assert_eq!(updated.created_at, created.created_at);

    let deleted = client
        .delete(format!("{}/api/projects/{}", app.address, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 204);

    // Deleting again maps the miss to 404.
    let missing = client
        .delete(format!("{}/api/projects/{}", app.address, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}
