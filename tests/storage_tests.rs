use std::sync::Arc;

use serde_json::json;
use talenthub::{
    AppConfig, AppState, MemoryRepository, MockStorageService, create_router,
    models::{AuthResponse, PresignedUrlResponse},
    repository::RepositoryState,
    storage::{StorageService, StorageState, sanitize_key},
};
use tokio::net::TcpListener;

async fn spawn_app(storage: MockStorageService) -> String {
    let repo = Arc::new(MemoryRepository::new()) as RepositoryState;
    let storage = Arc::new(storage) as StorageState;
    let config = AppConfig::default();

    let state = AppState {
        repo,
        storage,
        config,
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

async fn register(address: &str) -> AuthResponse {
    let response = reqwest::Client::new()
        .post(format!("{}/auth/register", address))
        .json(&json!({
            "name": "Uma", "email": "uma@example.com", "password": "secret99"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

#[test]
fn sanitize_key_strips_traversal_segments() {
    assert_eq!(sanitize_key("avatars/../../etc/passwd"), "avatars/etc/passwd");
    assert_eq!(sanitize_key("a//b/./c"), "a/b/c");
    assert_eq!(sanitize_key("plain.png"), "plain.png");
}

#[tokio::test]
async fn mock_storage_returns_deterministic_urls() {
    let mock = MockStorageService::new();
    let url = mock
        .get_presigned_upload_url("avatars/abc.png", "image/png")
        .await
        .unwrap();
    assert_eq!(
        url,
        "http://localhost:9000/mock-bucket/avatars/abc.png?signature=fake"
    );

    let failing = MockStorageService::new_failing();
    assert!(
        failing
            .get_presigned_upload_url("avatars/abc.png", "image/png")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn presigned_flow_issues_prefixed_keys() {
    let address = spawn_app(MockStorageService::new()).await;
    let auth = register(&address).await;

    let response = reqwest::Client::new()
        .post(format!("{}/uploads/presigned", address))
        .bearer_auth(&auth.token)
        .json(&json!({
            "filename": "portrait.png", "file_type": "image/png", "kind": "avatar"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: PresignedUrlResponse = response.json().await.unwrap();
    assert!(body.resource_key.starts_with("avatars/"));
    assert!(body.resource_key.ends_with(".png"));
    assert!(body.upload_url.contains(&body.resource_key));
}

#[tokio::test]
async fn presigned_flow_requires_a_token() {
    let address = spawn_app(MockStorageService::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/uploads/presigned", address))
        .json(&json!({
            "filename": "portrait.png", "file_type": "image/png", "kind": "avatar"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn resume_uploads_are_pdf_only() {
    let address = spawn_app(MockStorageService::new()).await;
    let auth = register(&address).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/uploads/presigned", address))
        .bearer_auth(&auth.token)
        .json(&json!({
            "filename": "resume.docx",
            "file_type": "application/msword",
            "kind": "resume"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    let response = client
        .post(format!("{}/uploads/presigned", address))
        .bearer_auth(&auth.token)
        .json(&json!({
            "filename": "resume.pdf", "file_type": "application/pdf", "kind": "resume"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: PresignedUrlResponse = response.json().await.unwrap();
    assert!(body.resource_key.starts_with("resumes/"));
}

#[tokio::test]
async fn storage_failure_surfaces_as_internal_error() {
    let address = spawn_app(MockStorageService::new_failing()).await;
    let auth = register(&address).await;

    let response = reqwest::Client::new()
        .post(format!("{}/uploads/presigned", address))
        .bearer_auth(&auth.token)
        .json(&json!({
            "filename": "portrait.png", "file_type": "image/png", "kind": "avatar"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    // The response body never echoes the storage error text.
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "internal server error");
}
