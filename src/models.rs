use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// AdminUser
///
/// The site's single administrator account, stored in `admin_users`.
/// At most one row may ever exist per deployment; creation is gated both in
/// the handlers (setup route) and in the repository itself.
///
/// The `password` field holds the opaque credential hash exactly as supplied
/// by the caller. The repository never hashes; hashing belongs to the
/// `PasswordHasher` collaborator. The field is never serialized into API
/// responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminUser {
    pub id: Uuid,
    // Unique, case-sensitive login name.
    pub username: String,
    /// Opaque one-way credential hash. Write-only at the API boundary and
    /// absent from the generated client bindings.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password: String,
    pub profile_image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Project
///
/// A single portfolio entry from the `projects` table. Projects are the main
/// public content of the site; the gallery renders them in `order_index`
/// order inside a decorative device frame chosen by `device_type`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,

    /// One of "monitor" | "phone" | "tablet". Purely presentational: it picks
    /// the device chrome the front end draws around the screenshot and has no
    /// behavioral meaning server-side.
    pub device_type: String,
    pub tags: Vec<String>,

    /// Sort key, stored as a string-encoded integer. Listing sorts by its
    /// numeric value ascending; values need not be unique or contiguous, and
    /// equal values keep insertion order.
    pub order_index: String,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Profile
///
/// The singleton about/bio record backing the public site. Zero or one row
/// exists; the repository creates it on first write, merging the supplied
/// fields over [`Profile::placeholder`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Profile {
    pub id: Uuid,
    pub profile_image_url: Option<String>,
    // Three biography paragraphs rendered by the About section.
    pub bio1: String,
    pub bio2: String,
    pub bio3: String,
    pub skills: Vec<String>,
    /// Display-only contact address shown on the public site.
    pub contact_email: String,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// placeholder
    ///
    /// The documented default Profile. The in-memory backend seeds this at
    /// startup so the public site renders sensible content with zero admin
    /// setup; the durable backend uses it as the merge base when the first
    /// `update_profile` call arrives on an empty store.
    pub fn placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            profile_image_url: None,
            bio1: "Hi, I'm a web developer and designer who loves building \
                   fast, beautiful sites that make a real impact for the \
                   people who use them."
                .to_string(),
            bio2: "My approach pairs clean code with careful design. Every \
                   project gets taken from first sketch to launch with the \
                   same attention to detail."
                .to_string(),
            bio3: "Away from the keyboard you'll find me studying new design \
                   trends, contributing to open source, or sketching the \
                   next idea over a good cup of coffee."
                .to_string(),
            skills: vec![
                "React".to_string(),
                "TypeScript".to_string(),
                "Rust".to_string(),
                "Tailwind CSS".to_string(),
                "UI/UX Design".to_string(),
                "Responsive Design".to_string(),
                "API Development".to_string(),
                "Database Design".to_string(),
            ],
            contact_email: "hello@example.com".to_string(),
            updated_at: Utc::now(),
        }
    }
}

/// Session
///
/// A server-side session row binding a browser cookie to the admin account.
/// Internal transport state: it is persisted in the `sessions` relation but
/// never exposed through the API (the client only ever sees the cookie).
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    /// Opaque random token; also the cookie value and the primary key.
    pub token: String,
    pub admin_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CreateProjectRequest
///
/// Input payload for adding a portfolio entry (POST /api/projects). Optional
/// fields fall back to the documented defaults: deviceType "monitor", empty
/// tags, orderIndex "0".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub device_type: Option<String>,
    pub tags: Option<Vec<String>>,
    pub order_index: Option<String>,
}

/// UpdateProjectRequest
///
/// Partial update payload for PUT /api/projects/{id}. Every field is
/// `Option<T>`: only supplied fields are merged over the stored record, and
/// `createdAt` is never touched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<String>,
}

/// UpdateProfileRequest
///
/// Partial update payload for PUT /api/profile. On an empty store the
/// repository creates the Profile by merging these fields over the
/// placeholder defaults; otherwise it merges over the existing record and
/// refreshes `updatedAt`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio1: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio2: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio3: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

/// LoginRequest
///
/// Credentials for POST /api/auth/login. The password travels as plaintext
/// over the transport and is only ever compared through the opaque hash
/// check; it is never persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// SetupRequest
///
/// First-run admin bootstrap payload (POST /api/auth/setup). Only accepted
/// while no admin account exists.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SetupRequest {
    pub username: String,
    pub password: String,
}

/// ChangePasswordRequest
///
/// Payload for POST /api/auth/change-password. The current password must
/// re-verify before the new hash is written.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// ProfileImageRequest
///
/// Payload for PUT /api/auth/profile-image. An explicit `null` clears the
/// admin's profile image.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProfileImageRequest {
    pub image_url: Option<String>,
}

/// ContactRequest
///
/// A visitor's contact-form submission (POST /api/contact). Relayed to the
/// admin's inbox by the NotificationRelay; deliberately never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// ImageUploadRequest
///
/// Input payload for requesting a short-lived upload URL for a project or
/// profile image (POST /api/uploads/presigned).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImageUploadRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "screenshot.png")]
    pub filename: String,
    /// The MIME type the upload will be constrained to.
    #[schema(example = "image/png")]
    pub file_type: String,
}

// --- Response Schemas (Output) ---

/// ImageUploadResponse
///
/// The secure, temporary URL for a direct client-to-blob-store upload, plus
/// the object key to reference the image with afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ImageUploadResponse {
    pub upload_url: String,
    pub resource_key: String,
}

/// MeResponse
///
/// The session probe / login response (GET /api/auth/me). Everything the
/// admin UI needs to render the dashboard header; never the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MeResponse {
    pub id: Uuid,
    pub username: String,
    pub profile_image_url: Option<String>,
}

/// SetupStatusResponse
///
/// Tells the admin UI whether first-run setup has already been completed
/// (GET /api/auth/setup-status). The setup form is only shown when false.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SetupStatusResponse {
    pub setup_complete: bool,
}

/// ContactResponse
///
/// Acknowledgement that the contact submission was handed to the relay.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContactResponse {
    pub success: bool,
}
