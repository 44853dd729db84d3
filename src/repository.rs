use crate::auth::{SESSION_TTL_DAYS, generate_session_token};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    AdminUser, CreateProjectRequest, Profile, Project, Session, UpdateProfileRequest,
    UpdateProjectRequest,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository Trait
///
/// The storage facade: one abstract contract covering the credential store
/// (admin account), the content store (projects + singleton profile), and
/// the server-side session relation. Exactly one concrete backend is chosen
/// at process start (`PostgresRepository` when a database connection is
/// configured, `MemoryRepository` otherwise) and the choice is immutable
/// for the process lifetime. Callers are backend-agnostic.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task
/// boundaries.
///
/// Error policy: expected misses return `None`/`false`; writes propagate
/// backend failures as `ApiError::Database`; the single-admin invariant
/// violation is the one domain error raised here (`AdminAlreadyExists`).
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Admin account (credential store) ---
    async fn get_admin_user(&self, id: Uuid) -> Option<AdminUser>;
    // Case-sensitive exact match; at most one hit given the single-admin rule.
    async fn get_admin_user_by_username(&self, username: &str) -> Option<AdminUser>;
    /// Fails with `AdminAlreadyExists` if any admin is already present. The
    /// password is stored verbatim; hashing happens before this call.
    async fn create_admin_user(&self, username: String, password: String) -> ApiResult<AdminUser>;
    /// True iff an admin account exists. Gates the first-run setup route.
    async fn admin_exists(&self) -> bool;
    async fn update_admin_password(&self, id: Uuid, password: String) -> Option<AdminUser>;
    async fn update_admin_profile_image(
        &self,
        id: Uuid,
        image_url: Option<String>,
    ) -> Option<AdminUser>;

    // --- Projects (content store) ---
    /// Sorted ascending by the numeric value of `order_index`; equal keys
    /// keep insertion order. Stable and deterministic for a fixed store state.
    async fn get_all_projects(&self) -> Vec<Project>;
    async fn get_project(&self, id: Uuid) -> Option<Project>;
    async fn create_project(&self, req: CreateProjectRequest) -> ApiResult<Project>;
    // Merges only the supplied fields; never touches created_at.
    async fn update_project(&self, id: Uuid, req: UpdateProjectRequest) -> Option<Project>;
    async fn delete_project(&self, id: Uuid) -> bool;

    // --- Profile (content store, singleton) ---
    async fn get_profile(&self) -> Option<Profile>;
    /// Create-or-merge: builds the record from placeholder defaults on an
    /// empty store, merges partial fields otherwise, and always refreshes
    /// `updated_at`. Never returns an empty result.
    async fn update_profile(&self, req: UpdateProfileRequest) -> ApiResult<Profile>;

    // --- Sessions ---
    /// Issues a fresh random token bound to the admin id, valid for a fixed
    /// seven-day window.
    async fn create_session(&self, admin_id: Uuid) -> ApiResult<Session>;
    /// Returns the session only while unexpired.
    async fn get_session(&self, token: &str) -> Option<Session>;
    /// Server-side destruction; true iff a session row was removed.
    async fn delete_session(&self, token: &str) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the selected backend across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Applies the defaults documented for project creation: deviceType
/// "monitor", no tags, orderIndex "0". Shared by both backends so their
/// create semantics cannot drift.
fn project_from_request(req: CreateProjectRequest) -> Project {
    Project {
        id: Uuid::new_v4(),
        title: req.title,
        description: req.description,
        image_url: req.image_url,
        device_type: req.device_type.unwrap_or_else(|| "monitor".to_string()),
        tags: req.tags.unwrap_or_default(),
        order_index: req.order_index.unwrap_or_else(|| "0".to_string()),
        created_at: Utc::now(),
    }
}

/// Numeric interpretation of the string-encoded sort key. Malformed values
/// coerce to 0 rather than failing the whole listing.
fn order_key(project: &Project) -> i64 {
    project.order_index.parse::<i64>().unwrap_or(0)
}

/// Stable sort shared by both backends: ascending by numeric `order_index`,
/// ties keep the input (insertion) order. The durable backend fetches rows
/// in creation order and runs them through this same function, so tie
/// behavior is identical no matter which backend is active.
pub(crate) fn sort_projects(mut projects: Vec<Project>) -> Vec<Project> {
    projects.sort_by_key(order_key);
    projects
}

fn session_for(admin_id: Uuid) -> Session {
    Session {
        token: generate_session_token(),
        admin_id,
        expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
    }
}

// --- Durable Backend (PostgreSQL) ---

/// PostgresRepository
///
/// The durable backend. Every operation is a single statement; the
/// single-admin invariant is enforced atomically with an
/// `INSERT ... WHERE NOT EXISTS` so concurrent first-time creators cannot
/// race past the check. Reads that fail are logged and degrade to empty
/// results; writes propagate the failure.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ADMIN_COLUMNS: &str = "id, username, password, profile_image_url, created_at";
const PROJECT_COLUMNS: &str =
    "id, title, description, image_url, device_type, tags, order_index, created_at";
const PROFILE_COLUMNS: &str =
    "id, profile_image_url, bio1, bio2, bio3, skills, contact_email, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_admin_user(&self, id: Uuid) -> Option<AdminUser> {
        sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_admin_user error: {:?}", e);
            None
        })
    }

    async fn get_admin_user_by_username(&self, username: &str) -> Option<AdminUser> {
        sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_admin_user_by_username error: {:?}", e);
            None
        })
    }

    /// create_admin_user
    ///
    /// The `WHERE NOT EXISTS` guard makes check-and-insert one atomic
    /// statement: when an admin row is already present the insert matches
    /// nothing, `RETURNING` yields no row, and the caller gets
    /// `AdminAlreadyExists`.
    async fn create_admin_user(&self, username: String, password: String) -> ApiResult<AdminUser> {
        let inserted = sqlx::query_as::<_, AdminUser>(&format!(
            "INSERT INTO admin_users (id, username, password, profile_image_url, created_at) \
             SELECT $1, $2, $3, NULL, NOW() \
             WHERE NOT EXISTS (SELECT 1 FROM admin_users) \
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password)
        .fetch_optional(&self.pool)
        .await?;

        inserted.ok_or(ApiError::AdminAlreadyExists)
    }

    async fn admin_exists(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await
            .map(|count| count > 0)
            .unwrap_or_else(|e| {
                tracing::error!("admin_exists error: {:?}", e);
                false
            })
    }

    async fn update_admin_password(&self, id: Uuid, password: String) -> Option<AdminUser> {
        sqlx::query_as::<_, AdminUser>(&format!(
            "UPDATE admin_users SET password = $2 WHERE id = $1 RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(id)
        .bind(password)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_admin_password error: {:?}", e);
            None
        })
    }

    async fn update_admin_profile_image(
        &self,
        id: Uuid,
        image_url: Option<String>,
    ) -> Option<AdminUser> {
        sqlx::query_as::<_, AdminUser>(&format!(
            "UPDATE admin_users SET profile_image_url = $2 WHERE id = $1 RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(id)
        .bind(image_url)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_admin_profile_image error: {:?}", e);
            None
        })
    }

    /// get_all_projects
    ///
    /// Rows are fetched in creation order and stable-sorted in process by
    /// the shared helper, so the numeric-key/insertion-order-tie semantics
    /// match the in-memory backend exactly.
    async fn get_all_projects(&self) -> Vec<Project> {
        let rows = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_all_projects error: {:?}", e);
            vec![]
        });

        sort_projects(rows)
    }

    async fn get_project(&self, id: Uuid) -> Option<Project> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_project error: {:?}", e);
            None
        })
    }

    async fn create_project(&self, req: CreateProjectRequest) -> ApiResult<Project> {
        let project = project_from_request(req);
        let created = sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects \
             (id, title, description, image_url, device_type, tags, order_index, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(project.id)
        .bind(project.title)
        .bind(project.description)
        .bind(project.image_url)
        .bind(project.device_type)
        .bind(project.tags)
        .bind(project.order_index)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// update_project
    ///
    /// Uses `COALESCE` to merge only the supplied fields, leaving everything
    /// else (including `created_at`) untouched in one statement.
    async fn update_project(&self, id: Uuid, req: UpdateProjectRequest) -> Option<Project> {
        sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                image_url = COALESCE($4, image_url), \
                device_type = COALESCE($5, device_type), \
                tags = COALESCE($6, tags), \
                order_index = COALESCE($7, order_index) \
             WHERE id = $1 \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.image_url)
        .bind(req.device_type)
        .bind(req.tags)
        .bind(req.order_index)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_project error: {:?}", e);
            None
        })
    }

    async fn delete_project(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_project error: {:?}", e);
                false
            }
        }
    }

    async fn get_profile(&self) -> Option<Profile> {
        sqlx::query_as::<_, Profile>(&format!("SELECT {PROFILE_COLUMNS} FROM profile LIMIT 1"))
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_profile error: {:?}", e);
                None
            })
    }

    /// update_profile
    ///
    /// The durable backend carries no seeded row, so the first write builds
    /// the record from the placeholder defaults merged with the supplied
    /// fields. Later writes merge via `COALESCE` and refresh `updated_at`.
    /// The zero-or-one cardinality is application-enforced; the admin-only
    /// write path is effectively single-writer.
    async fn update_profile(&self, req: UpdateProfileRequest) -> ApiResult<Profile> {
        let existing = self.get_profile().await;

        let Some(current) = existing else {
            let defaults = Profile::placeholder();
            let created = sqlx::query_as::<_, Profile>(&format!(
                "INSERT INTO profile \
                 (id, profile_image_url, bio1, bio2, bio3, skills, contact_email, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) \
                 RETURNING {PROFILE_COLUMNS}"
            ))
            .bind(defaults.id)
            .bind(req.profile_image_url.or(defaults.profile_image_url))
            .bind(req.bio1.unwrap_or(defaults.bio1))
            .bind(req.bio2.unwrap_or(defaults.bio2))
            .bind(req.bio3.unwrap_or(defaults.bio3))
            .bind(req.skills.unwrap_or(defaults.skills))
            .bind(req.contact_email.unwrap_or(defaults.contact_email))
            .fetch_one(&self.pool)
            .await?;

            return Ok(created);
        };

        let updated = sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profile SET \
                profile_image_url = COALESCE($2, profile_image_url), \
                bio1 = COALESCE($3, bio1), \
                bio2 = COALESCE($4, bio2), \
                bio3 = COALESCE($5, bio3), \
                skills = COALESCE($6, skills), \
                contact_email = COALESCE($7, contact_email), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(current.id)
        .bind(req.profile_image_url)
        .bind(req.bio1)
        .bind(req.bio2)
        .bind(req.bio3)
        .bind(req.skills)
        .bind(req.contact_email)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn create_session(&self, admin_id: Uuid) -> ApiResult<Session> {
        let session = session_for(admin_id);
        let created = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (token, admin_id, expires_at) VALUES ($1, $2, $3) \
             RETURNING token, admin_id, expires_at",
        )
        .bind(session.token)
        .bind(session.admin_id)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_session(&self, token: &str) -> Option<Session> {
        sqlx::query_as::<_, Session>(
            "SELECT token, admin_id, expires_at FROM sessions \
             WHERE token = $1 AND expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_session error: {:?}", e);
            None
        })
    }

    async fn delete_session(&self, token: &str) -> bool {
        match sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_session error: {:?}", e);
                false
            }
        }
    }
}

// --- Process-Local Backend (In-Memory) ---

/// The mutable state behind `MemoryRepository`'s lock. Projects live in a
/// `Vec` so insertion order, the documented tie-break for equal sort keys,
/// is preserved without any extra bookkeeping.
struct MemoryInner {
    admin_users: HashMap<Uuid, AdminUser>,
    projects: Vec<Project>,
    profile: Option<Profile>,
    sessions: HashMap<String, Session>,
}

/// MemoryRepository
///
/// The process-local backend, selected when no database connection is
/// configured. Nothing survives a restart. A placeholder Profile is seeded
/// at construction so the public site renders sensible content with zero
/// admin setup. All operations serialize on one `RwLock`; none hold the
/// lock across an await point.
pub struct MemoryRepository {
    inner: RwLock<MemoryInner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                admin_users: HashMap::new(),
                projects: Vec::new(),
                profile: Some(Profile::placeholder()),
                sessions: HashMap::new(),
            }),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_admin_user(&self, id: Uuid) -> Option<AdminUser> {
        self.inner.read().await.admin_users.get(&id).cloned()
    }

    async fn get_admin_user_by_username(&self, username: &str) -> Option<AdminUser> {
        self.inner
            .read()
            .await
            .admin_users
            .values()
            .find(|user| user.username == username)
            .cloned()
    }

    async fn create_admin_user(&self, username: String, password: String) -> ApiResult<AdminUser> {
        let mut inner = self.inner.write().await;
        // Holding the write lock makes check-then-insert atomic here.
        if !inner.admin_users.is_empty() {
            return Err(ApiError::AdminAlreadyExists);
        }

        let user = AdminUser {
            id: Uuid::new_v4(),
            username,
            password,
            profile_image_url: None,
            created_at: Utc::now(),
        };
        inner.admin_users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn admin_exists(&self) -> bool {
        !self.inner.read().await.admin_users.is_empty()
    }

    async fn update_admin_password(&self, id: Uuid, password: String) -> Option<AdminUser> {
        let mut inner = self.inner.write().await;
        let user = inner.admin_users.get_mut(&id)?;
        user.password = password;
        Some(user.clone())
    }

    async fn update_admin_profile_image(
        &self,
        id: Uuid,
        image_url: Option<String>,
    ) -> Option<AdminUser> {
        let mut inner = self.inner.write().await;
        let user = inner.admin_users.get_mut(&id)?;
        user.profile_image_url = image_url;
        Some(user.clone())
    }

    async fn get_all_projects(&self) -> Vec<Project> {
        sort_projects(self.inner.read().await.projects.clone())
    }

    async fn get_project(&self, id: Uuid) -> Option<Project> {
        self.inner
            .read()
            .await
            .projects
            .iter()
            .find(|project| project.id == id)
            .cloned()
    }

    async fn create_project(&self, req: CreateProjectRequest) -> ApiResult<Project> {
        let project = project_from_request(req);
        self.inner.write().await.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: Uuid, req: UpdateProjectRequest) -> Option<Project> {
        let mut inner = self.inner.write().await;
        let project = inner.projects.iter_mut().find(|project| project.id == id)?;

        if let Some(title) = req.title {
            project.title = title;
        }
        if let Some(description) = req.description {
            project.description = description;
        }
        if let Some(image_url) = req.image_url {
            project.image_url = image_url;
        }
        if let Some(device_type) = req.device_type {
            project.device_type = device_type;
        }
        if let Some(tags) = req.tags {
            project.tags = tags;
        }
        if let Some(order_index) = req.order_index {
            project.order_index = order_index;
        }

        Some(project.clone())
    }

    async fn delete_project(&self, id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.projects.len();
        inner.projects.retain(|project| project.id != id);
        inner.projects.len() < before
    }

    async fn get_profile(&self) -> Option<Profile> {
        self.inner.read().await.profile.clone()
    }

    async fn update_profile(&self, req: UpdateProfileRequest) -> ApiResult<Profile> {
        let mut inner = self.inner.write().await;
        let mut profile = inner.profile.take().unwrap_or_else(Profile::placeholder);

        if let Some(profile_image_url) = req.profile_image_url {
            profile.profile_image_url = Some(profile_image_url);
        }
        if let Some(bio1) = req.bio1 {
            profile.bio1 = bio1;
        }
        if let Some(bio2) = req.bio2 {
            profile.bio2 = bio2;
        }
        if let Some(bio3) = req.bio3 {
            profile.bio3 = bio3;
        }
        if let Some(skills) = req.skills {
            profile.skills = skills;
        }
        if let Some(contact_email) = req.contact_email {
            profile.contact_email = contact_email;
        }
        profile.updated_at = Utc::now();

        inner.profile = Some(profile.clone());
        Ok(profile)
    }

    async fn create_session(&self, admin_id: Uuid) -> ApiResult<Session> {
        let session = session_for(admin_id);
        self.inner
            .write()
            .await
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> Option<Session> {
        self.inner
            .read()
            .await
            .sessions
            .get(token)
            .filter(|session| session.expires_at > Utc::now())
            .cloned()
    }

    async fn delete_session(&self, token: &str) -> bool {
        self.inner.write().await.sessions.remove(token).is_some()
    }
}
