use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::Env,
    error::{ApiError, ApiResult},
    repository::RepositoryState,
};

/// Session cookie name presented to the browser.
pub const SESSION_COOKIE: &str = "portfolio_session";

/// Fixed session lifetime. Expiry is a hard window, not sliding: a session
/// issued at login stays valid for exactly this long, then dies regardless
/// of activity.
pub const SESSION_TTL_DAYS: i64 = 7;

/// generate_session_token
///
/// Cryptographically random 32-byte hex token. This is the full credential
/// for an authenticated browser: there is no signature layer on top; the
/// server-side session row is the source of truth.
pub fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.r#gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// session_cookie
///
/// Builds the Set-Cookie value for a fresh login: HTTP-only so scripts can
/// never read the token, SameSite=Lax, and `Secure` whenever the deployment
/// serves over an encrypted transport (Production).
pub fn session_cookie(token: &str, env: &Env) -> String {
    let max_age_secs = SESSION_TTL_DAYS * 24 * 60 * 60;
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if *env == Env::Production {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Expires the session cookie client-side. The server-side row is deleted
/// separately; this only cleans up the browser.
pub fn clear_session_cookie(env: &Env) -> String {
    let mut cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    if *env == Env::Production {
        cookie.push_str("; Secure");
    }
    cookie
}

/// session_token_from_headers
///
/// Pulls the session token out of the Cookie header(s), tolerating multiple
/// cookies per header and surrounding whitespace.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == SESSION_COOKIE { Some(val) } else { None }
        })
}

/// AdminSession
///
/// The resolved identity of an authenticated request, i.e. the session gate's
/// Authenticated state. Handlers take this as an argument to require a live
/// admin session; the extractor rejects with `Unauthorized` otherwise.
#[derive(Debug, Clone)]
pub struct AdminSession {
    /// The admin account this session is bound to (a back-reference by id;
    /// the session never owns the account).
    pub admin_id: Uuid,
    pub username: String,
    pub profile_image_url: Option<String>,
    /// The raw session token, kept so logout can destroy the row.
    pub token: String,
}

/// AdminSession Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AdminSession usable as a
/// function argument in any admin handler and as the guard inside the admin
/// route middleware. Resolution is three steps, each of which rejects with
/// 401 on failure:
///
/// 1. Cookie extraction: the session token must be present.
/// 2. Session lookup: the token must reference an unexpired server-side
///    session row (a stolen cookie dies with the row; logout deletes it).
/// 3. Account lookup: the referenced AdminUser must still exist; a session
///    pointing at a deleted account is invalid, not merely stale.
///
/// Because mutating routes are layered behind this extractor, every
/// rejection happens before any content-store mutation executes.
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);

        let token = session_token_from_headers(&parts.headers)
            .ok_or(ApiError::Unauthorized)?
            .to_string();

        let session = repo
            .get_session(&token)
            .await
            .ok_or(ApiError::Unauthorized)?;

        let admin = repo
            .get_admin_user(session.admin_id)
            .await
            .ok_or(ApiError::Unauthorized)?;

        Ok(AdminSession {
            admin_id: admin.id,
            username: admin.username,
            profile_image_url: admin.profile_image_url,
            token,
        })
    }
}

// --- Credential Check Collaborator ---

/// PasswordHasher
///
/// The opaque one-way credential check. The repository stores whatever hash
/// it is given; this trait is the only place plaintext and hash ever meet.
/// Swappable so tests run without paying bcrypt's deliberate slowness.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> ApiResult<String>;
    /// Constant-time comparison of a plaintext candidate against a stored
    /// hash. Malformed hashes verify as false, never as an error.
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

/// The concrete type used to share the credential check across the
/// application state.
pub type HasherState = Arc<dyn PasswordHasher>;

/// BcryptHasher
///
/// Production implementation backed by bcrypt with its default cost.
pub struct BcryptHasher;

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> ApiResult<String> {
        bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }
}

/// MockPasswordHasher
///
/// Deterministic stand-in for tests: "hashes" by prefixing, verifies by
/// string equality. Keeps the full login path testable in microseconds.
pub struct MockPasswordHasher;

impl PasswordHasher for MockPasswordHasher {
    fn hash(&self, plaintext: &str) -> ApiResult<String> {
        Ok(format!("hashed:{plaintext}"))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        hash == format!("hashed:{plaintext}")
    }
}
