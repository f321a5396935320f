use std::sync::Arc;

use serde_json::json;
use talenthub::{
    AppConfig, AppState, MemoryRepository, MockStorageService, create_router,
    models::{AuthResponse, JobResponse, UserResponse},
    repository::RepositoryState,
    storage::StorageState,
};
use tokio::net::TcpListener;

struct TestApp {
    address: String,
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new()) as RepositoryState;
    let storage = Arc::new(MockStorageService::new()) as StorageState;
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

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
    }
}

async fn register(app: &TestApp, name: &str, email: &str, role: &str) -> AuthResponse {
    let response = reqwest::Client::new()
        .post(format!("{}/auth/register", app.address))
        .json(&json!({
            "name": name, "email": email, "password": "secret99", "role": role
        }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/health", app.address)).await.unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let registered = register(&app, "Iris", "iris@example.com", "creative").await;
    assert!(!registered.token.is_empty());
    assert_eq!(registered.user.email, "iris@example.com");

    let response = client
        .post(format!("{}/auth/login", app.address))
        .json(&json!({"email": "iris@example.com", "password": "secret99"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let logged_in: AuthResponse = response.json().await.unwrap();
    assert_eq!(logged_in.user.id, registered.user.id);

    // Wrong password and unknown email are the same 401.
    let bad_password = client
        .post(format!("{}/auth/login", app.address))
        .json(&json!({"email": "iris@example.com", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    let bad_email = client
        .post(format!("{}/auth/login", app.address))
        .json(&json!({"email": "nobody@example.com", "password": "secret99"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_password.status(), 401);
    assert_eq!(bad_email.status(), 401);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = spawn_app().await;
    register(&app, "First", "dup@example.com", "creative").await;

    let response = reqwest::Client::new()
        .post(format!("{}/auth/register", app.address))
        .json(&json!({
            "name": "Second", "email": "dup@example.com", "password": "secret99"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn unauthenticated_beats_forbidden() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let creative = register(&app, "Cleo", "cleo@example.com", "creative").await;

    // No token at all: 401, even on role-gated routes.
    let response = client
        .get(format!("{}/company", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let response = client
        .get(format!("{}/admin/stats", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Valid token, wrong role: 403.
    let response = client
        .post(format!("{}/jobs", app.address))
        .bearer_auth(&creative.token)
        .json(&json!({"title": "T", "description": "D"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let response = client
        .get(format!("{}/admin/stats", app.address))
        .bearer_auth(&creative.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let auth = register(&app, "Tia", "tia@example.com", "creative").await;

    let mut tampered = auth.token.clone();
    tampered.pop();
    tampered.push('A');

    let response = client
        .get(format!("{}/me", app.address))
        .bearer_auth(&tampered)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .get(format!("{}/me", app.address))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn job_ownership_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Owner A sets up a company and posts a job.
    let a = register(&app, "Acme Anna", "anna@acme.example", "company").await;
    let response = client
        .post(format!("{}/company", app.address))
        .bearer_auth(&a.token)
        .json(&json!({"name": "Acme"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/jobs", app.address))
        .bearer_auth(&a.token)
        .json(&json!({
            "title": "Rust Engineer",
            "description": "Build the backend",
            "location": "Remote",
            "salary": "$90k"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let job: JobResponse = response.json().await.unwrap();

    // B (same role) cannot touch A's job, and the outcome matches a
    // nonexistent id exactly.
    let b = register(&app, "Bolt Bea", "bea@bolt.example", "company").await;
    let foreign = client
        .put(format!("{}/jobs/{}", app.address, job.id))
        .bearer_auth(&b.token)
        .json(&json!({"title": "Hijacked"}))
        .send()
        .await
        .unwrap();
    let missing = client
        .put(format!("{}/jobs/999999", app.address))
        .bearer_auth(&b.token)
        .json(&json!({"title": "Hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status(), 404);
    assert_eq!(missing.status(), 404);

    // Partial update by the owner: only the submitted field moves.
    let response = client
        .put(format!("{}/jobs/{}", app.address, job.id))
        .bearer_auth(&a.token)
        .json(&json!({"salary": "$120k"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let updated: JobResponse = response.json().await.unwrap();
    assert_eq!(updated.salary, "$120k");
    assert_eq!(updated.title, "Rust Engineer");
    assert_eq!(updated.location, "Remote");

    // Owner soft-deletes; the job is gone for everyone, owner included.
    let response = client
        .delete(format!("{}/jobs/{}", app.address, job.id))
        .bearer_auth(&a.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/jobs/{}", app.address, job.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let response = client
        .get(format!("{}/jobs/{}", app.address, job.id))
        .bearer_auth(&a.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn profile_update_distinguishes_clear_from_omit() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let auth = register(&app, "Pat", "pat@example.com", "creative").await;

    let response = client
        .put(format!("{}/me", app.address))
        .bearer_auth(&auth.token)
        .json(&json!({"bio": "painter", "location": "Lisbon"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Clearing bio must not disturb location.
    let response = client
        .put(format!("{}/me", app.address))
        .bearer_auth(&auth.token)
        .json(&json!({"bio": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let profile: UserResponse = response.json().await.unwrap();
    assert_eq!(profile.bio, "");
    assert_eq!(profile.location, "Lisbon");
    assert_eq!(profile.name, "Pat");
}

#[tokio::test]
async fn job_listing_filters_and_paginates() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let a = register(&app, "Acme Anna", "anna2@acme.example", "company").await;
    client
        .post(format!("{}/company", app.address))
        .bearer_auth(&a.token)
        .json(&json!({"name": "Acme"}))
        .send()
        .await
        .unwrap();

    for (title, job_type, location) in [
        ("Rust Engineer", "full-time", "Berlin"),
        ("Go Engineer", "full-time", "Lisbon"),
        ("Rust Contractor", "contract", "Berlin"),
    ] {
        let response = client
            .post(format!("{}/jobs", app.address))
            .bearer_auth(&a.token)
            .json(&json!({
                "title": title, "description": "desc", "job_type": job_type,
                "location": location
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let body: serde_json::Value = client
        .get(format!("{}/jobs?search=rust", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalCount"], 2);

    let body: serde_json::Value = client
        .get(format!("{}/jobs?job_type=contract", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["items"][0]["title"], "Rust Contractor");

    let body: serde_json::Value = client
        .get(format!("{}/jobs?page=2&limit=2", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalCount"], 3);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["page"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn application_flow_enforces_resume_and_uniqueness() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let employer = register(&app, "Acme Anna", "anna3@acme.example", "company").await;
    client
        .post(format!("{}/company", app.address))
        .bearer_auth(&employer.token)
        .json(&json!({"name": "Acme"}))
        .send()
        .await
        .unwrap();
    let job: JobResponse = client
        .post(format!("{}/jobs", app.address))
        .bearer_auth(&employer.token)
        .json(&json!({"title": "Designer", "description": "d"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let seeker = register(&app, "Sam", "sam@example.com", "creative").await;

    // No resume on file yet.
    let response = client
        .post(format!("{}/jobs/{}/apply", app.address, job.id))
        .bearer_auth(&seeker.token)
        .json(&json!({"cover_letter": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    client
        .put(format!("{}/me", app.address))
        .bearer_auth(&seeker.token)
        .json(&json!({"resume_url": "resumes/sam.pdf"}))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/jobs/{}/apply", app.address, job.id))
        .bearer_auth(&seeker.token)
        .json(&json!({"cover_letter": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // Second application to the same job conflicts.
    let response = client
        .post(format!("{}/jobs/{}/apply", app.address, job.id))
        .bearer_auth(&seeker.token)
        .json(&json!({"cover_letter": "hi again"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // The poster sees the application; a stranger's job listing is 404.
    let response = client
        .get(format!("{}/jobs/{}/applications", app.address, job.id))
        .bearer_auth(&employer.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let apps: serde_json::Value = response.json().await.unwrap();
    assert_eq!(apps.as_array().unwrap().len(), 1);

    let other = register(&app, "Rival", "rival@example.com", "company").await;
    let response = client
        .get(format!("{}/jobs/{}/applications", app.address, job.id))
        .bearer_auth(&other.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
