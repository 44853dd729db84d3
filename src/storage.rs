use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;

// 1. BlobStore Contract
/// BlobStore
///
/// The opaque image-upload collaborator: given an object key and content
/// type it hands back a URL the admin's browser can PUT the image bytes to
/// directly, bypassing this server. The resulting public URL/key is what
/// gets stored on Project.imageUrl and the profile image fields.
///
/// The trait exists so the real S3 client (S3BlobStore) can be swapped for
/// the in-memory Mock (MockBlobStore) in tests.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Ensures the configured bucket exists. Used in the `Env::Local` setup
    /// to provision the bucket in MinIO automatically. No-op in production.
    async fn ensure_bucket_exists(&self);

    /// Generates a temporary, cryptographically signed URL allowing the
    /// admin client to upload one image directly to the bucket, constrained
    /// to the given content type and a short expiry.
    async fn presigned_image_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String>;
}

/// The concrete type used to share the blob store across the application
/// state.
pub type BlobStoreState = Arc<dyn BlobStore>;

/// Image uploads are small; ten minutes is plenty to finish one.
const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

// 2. The Real Implementation (S3/MinIO)
/// S3BlobStore
///
/// Concrete implementation over the AWS SDK. S3 compatibility means the
/// same client talks to a local MinIO container and to hosted S3-compatible
/// storage in production; `force_path_style(true)` is required for the
/// MinIO-style gateways.
#[derive(Clone)]
pub struct S3BlobStore {
    client: s3::Client,
    bucket_name: String,
}

impl S3BlobStore {
    /// Constructs the client from the credentials resolved by AppConfig.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            // Path-style addressing (http://endpoint/bucket/key) is required
            // by MinIO and similar S3 API gateways.
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    /// CreateBucket is idempotent, so this is safe to call at every startup.
    async fn ensure_bucket_exists(&self) {
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn presigned_image_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL)
            .map_err(|e| format!("presigning config: {e}"))?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            // The signed URL only accepts uploads carrying this Content-Type.
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }
}

/// sanitize_key
///
/// Removes directory-navigation segments (`..`, `.`) and empty segments
/// from a user-influenced object key.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 3. The Mock Implementation (For Unit Tests)
/// MockBlobStore
///
/// In-memory stand-in for tests: returns a deterministic local-style URL so
/// handler assertions need no network.
#[derive(Clone)]
pub struct MockBlobStore {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn ensure_bucket_exists(&self) {
        // No-op in mock environment.
    }

    async fn presigned_image_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Blob Store Error: Simulation requested".to_string());
        }

        let sanitized_key = sanitize_key(key);

        Ok(format!(
            "http://localhost:9000/mock-portfolio/{}?signature=fake",
            sanitized_key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_signed_url_with_key() {
        let store = MockBlobStore::new();
        let url = store
            .presigned_image_upload_url("images/shot.png", "image/png")
            .await
            .unwrap();
        assert!(url.contains("images/shot.png"));
        assert!(url.contains("signature=fake"));
    }

    #[tokio::test]
    async fn mock_sanitizes_traversal_segments() {
        let store = MockBlobStore::new();
        let url = store
            .presigned_image_upload_url("../../etc/passwd", "text/plain")
            .await
            .unwrap();
        assert!(!url.contains(".."));
    }

    #[tokio::test]
    async fn failing_mock_reports_error() {
        let store = MockBlobStore::new_failing();
        assert!(
            store
                .presigned_image_upload_url("images/a.png", "image/png")
                .await
                .is_err()
        );
    }
}
