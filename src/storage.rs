use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;

/// StorageService
///
/// Contract for the object-storage layer holding avatars, company logos,
/// project images, and resumes. The S3 client serves production while the
/// mock keeps handler tests off the network.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Provisions the configured bucket if missing. Called at startup in
    /// local mode where MinIO starts empty; a no-op against a bucket that
    /// already exists.
    async fn ensure_bucket_exists(&self);

    /// Returns a short-lived signed URL a client can PUT a file to,
    /// constrained to the given object key and content type.
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String>;
}

/// Upload URLs die after ten minutes.
const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// S3StorageClient
///
/// AWS SDK client speaking to any S3-compatible endpoint. Path-style
/// addressing is required for MinIO and the storage gateways used in
/// deployment.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
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
            .force_path_style(true)
            .build();

        let client = s3::Client::from_conf(config);

        Self {
            client,
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket is idempotent; an existing bucket is not an error.
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            // The signature covers the content type, so the uploader
            // cannot swap a resume slot for an arbitrary payload.
            .content_type(content_type)
            .presigned(
                PresigningConfig::expires_in(UPLOAD_URL_TTL)
                    .map_err(|e| e.to_string())?,
            )
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }
}

/// Strips path-traversal components from a user-influenced key segment.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// Deterministic stand-in for tests: hands back local-style URLs, or
/// simulated failures when constructed with `new_failing`.
#[derive(Clone)]
pub struct MockStorageService {
    pub should_fail: bool,
}

impl Default for MockStorageService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("mock storage failure".to_string());
        }

        let sanitized_key = sanitize_key(key);

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitized_key
        ))
    }
}

/// The shared handle handlers receive through the application state.
pub type StorageState = Arc<dyn StorageService>;
