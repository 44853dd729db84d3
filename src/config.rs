use std::env;

/// AppConfig
///
/// The application's entire configuration, loaded once at startup and
/// immutable afterwards. It is pulled into the application state via FromRef
/// so every service (Repository, BlobStore, Relay) reads the same values.
///
/// `database_url` doubles as the storage-backend selector: when present the
/// process runs against PostgreSQL, when absent it runs on the process-local
/// in-memory backend. The choice is made exactly once in `main` and never
/// revisited.
#[derive(Clone)]
pub struct AppConfig {
    // Postgres connection string; absence selects the in-memory backend.
    pub database_url: Option<String>,
    // S3-compatible storage endpoint URL (MinIO in local).
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    // Bucket for uploaded project/profile images.
    pub s3_bucket: String,
    /// OAuth access token for the Gmail relay. Optional in Local (the mock
    /// relay is substituted); mandatory in Production.
    pub gmail_access_token: Option<String>,
    // Runtime environment marker. Controls logging format, cookie Secure
    // flag, and local conveniences.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context, switching between development conveniences
/// (MinIO defaults, mock relay, pretty logs) and hardened production
/// behavior (required secrets, Secure cookies, JSON logs).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Provides a safe, non-panicking AppConfig primarily used for test
    /// setup, without requiring any environment variables.
    fn default() -> Self {
        Self {
            database_url: None,
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "portfolio-test".to_string(),
            gmail_access_token: None,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical startup initializer. Reads everything from environment
    /// variables and fails fast on missing Production secrets so the process
    /// never starts half-configured. `DATABASE_URL` is deliberately optional
    /// in both environments; running without it is the supported
    /// in-memory/demo mode.
    ///
    /// # Panics
    /// Panics in Production when the S3 credentials or the Gmail relay token
    /// are absent.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let database_url = env::var("DATABASE_URL").ok();

        match env {
            Env::Local => Self {
                env: Env::Local,
                database_url,
                // Local storage (MinIO) uses known default credentials.
                s3_endpoint: env::var("S3_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost:9000".to_string()),
                s3_region: "us-east-1".to_string(),
                s3_key: "admin".to_string(),
                s3_secret: "password".to_string(),
                s3_bucket: env::var("S3_BUCKET_NAME")
                    .unwrap_or_else(|_| "portfolio-uploads".to_string()),
                gmail_access_token: env::var("GMAIL_ACCESS_TOKEN").ok(),
            },
            Env::Production => Self {
                env: Env::Production,
                database_url,
                s3_endpoint: env::var("S3_ENDPOINT").expect("FATAL: S3_ENDPOINT required in prod"),
                s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                s3_key: env::var("S3_ACCESS_KEY").expect("FATAL: S3_ACCESS_KEY required in prod"),
                s3_secret: env::var("S3_SECRET_KEY")
                    .expect("FATAL: S3_SECRET_KEY required in prod"),
                s3_bucket: env::var("S3_BUCKET_NAME")
                    .unwrap_or_else(|_| "portfolio-uploads".to_string()),
                gmail_access_token: Some(
                    env::var("GMAIL_ACCESS_TOKEN")
                        .expect("FATAL: GMAIL_ACCESS_TOKEN required in prod"),
                ),
            },
        }
    }
}
