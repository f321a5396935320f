use std::sync::Arc;

use serde_json::json;
use talenthub::{
    AppConfig, AppState, MemoryRepository, MockStorageService,
    auth::issue_token,
    create_router,
    models::{AuthResponse, NewUser, ProjectResponse, Role},
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use tokio::net::TcpListener;

struct TestApp {
    address: String,
    state: AppState,
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
    let router = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        state,
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

/// Publishes a project as the given creative and returns it.
async fn publish_project(app: &TestApp, token: &str) -> ProjectResponse {
    let categories: Vec<talenthub::models::Category> =
        reqwest::get(format!("{}/categories", app.address))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    let response = reqwest::Client::new()
        .post(format!("{}/projects", app.address))
        .bearer_auth(token)
        .json(&json!({
            "title": "Poster Series",
            "description": "Three posters",
            "category_id": categories[0].id,
            "tags": "print,typography",
            "image_urls": ["projects/a.png", "projects/b.png"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

async fn fetch_project(app: &TestApp, id: i64, token: Option<&str>) -> ProjectResponse {
    let client = reqwest::Client::new();
    let mut request = client.get(format!("{}/projects/{}", app.address, id));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = request.send().await.unwrap();
    assert_eq!(response.status(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn like_unlike_round_trip_keeps_counter_consistent() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let owner = register(&app, "Maya", "maya@example.com", "creative").await;
    let project = publish_project(&app, &owner.token).await;
    assert_eq!(project.likes_count, 0);

    let fan = register(&app, "Finn", "finn@example.com", "creative").await;

    // Like: counter goes to exactly 1 and is_liked flips for the fan.
    let response = client
        .post(format!("{}/projects/{}/like", app.address, project.id))
        .bearer_auth(&fan.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let seen = fetch_project(&app, project.id, Some(&fan.token)).await;
    assert_eq!(seen.likes_count, 1);
    assert!(seen.is_liked);

    // A second like is a conflict and must not double-count.
    let response = client
        .post(format!("{}/projects/{}/like", app.address, project.id))
        .bearer_auth(&fan.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    let seen = fetch_project(&app, project.id, Some(&fan.token)).await;
    assert_eq!(seen.likes_count, 1);

    let likes: serde_json::Value =
        reqwest::get(format!("{}/projects/{}/likes", app.address, project.id))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert_eq!(likes.as_array().unwrap().len(), 1);

    // Unlike drops to 0; a second unlike is not found and stays at 0.
    let response = client
        .delete(format!("{}/projects/{}/like", app.address, project.id))
        .bearer_auth(&fan.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);
    let seen = fetch_project(&app, project.id, Some(&fan.token)).await;
    assert_eq!(seen.likes_count, 0);
    assert!(!seen.is_liked);

    let response = client
        .delete(format!("{}/projects/{}/like", app.address, project.id))
        .bearer_auth(&fan.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let seen = fetch_project(&app, project.id, Some(&fan.token)).await;
    assert_eq!(seen.likes_count, 0);
}

#[tokio::test]
async fn liking_a_missing_project_is_not_found() {
    let app = spawn_app().await;
    let fan = register(&app, "Finn", "finn2@example.com", "creative").await;

    let response = reqwest::Client::new()
        .post(format!("{}/projects/424242/like", app.address))
        .bearer_auth(&fan.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn project_views_count_reads() {
    let app = spawn_app().await;
    let owner = register(&app, "Maya", "maya2@example.com", "creative").await;
    let project = publish_project(&app, &owner.token).await;

    let first = fetch_project(&app, project.id, None).await;
    let second = fetch_project(&app, project.id, None).await;
    assert_eq!(second.views, first.views + 1);
}

#[tokio::test]
async fn comments_author_and_admin_deletion() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let owner = register(&app, "Maya", "maya3@example.com", "creative").await;
    let project = publish_project(&app, &owner.token).await;
    let commenter = register(&app, "Cass", "cass@example.com", "creative").await;

    let response = client
        .post(format!("{}/projects/{}/comments", app.address, project.id))
        .bearer_auth(&commenter.token)
        .json(&json!({"content": "love the palette"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let comment: serde_json::Value = response.json().await.unwrap();
    let comment_id = comment["id"].as_i64().unwrap();

    // The project owner is not the comment's owner.
    let response = client
        .delete(format!("{}/comments/{}", app.address, comment_id))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // An admin overrides ownership. Admins are seeded, never registered,
    // so build one directly against the repository.
    let admin = app
        .state
        .repo
        .create_user(NewUser {
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            password_hash: "unused".to_string(),
            role: Role::Admin,
        })
        .await
        .unwrap();
    let admin_token = issue_token(&app.state.config, &admin).unwrap();

    let response = client
        .delete(format!("{}/comments/{}", app.address, comment_id))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let comments: serde_json::Value =
        reqwest::get(format!("{}/projects/{}/comments", app.address, project.id))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert!(comments.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn follow_graph_round_trip() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let a = register(&app, "Ana", "ana@example.com", "creative").await;
    let b = register(&app, "Ben", "ben@example.com", "creative").await;

    // Self-follow is rejected as invalid input.
    let response = client
        .post(format!("{}/users/{}/follow", app.address, a.user.id))
        .bearer_auth(&a.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    let response = client
        .post(format!("{}/users/{}/follow", app.address, b.user.id))
        .bearer_auth(&a.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // Exactly one live edge per pair.
    let response = client
        .post(format!("{}/users/{}/follow", app.address, b.user.id))
        .bearer_auth(&a.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    let followers: serde_json::Value =
        reqwest::get(format!("{}/users/{}/followers", app.address, b.user.id))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert_eq!(followers.as_array().unwrap().len(), 1);
    assert_eq!(followers[0]["id"].as_i64().unwrap(), a.user.id);

    let response = client
        .delete(format!("{}/users/{}/follow", app.address, b.user.id))
        .bearer_auth(&a.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .delete(format!("{}/users/{}/follow", app.address, b.user.id))
        .bearer_auth(&a.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Following a ghost is not found.
    let response = client
        .post(format!("{}/users/999999/follow", app.address))
        .bearer_auth(&a.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn project_ownership_mirrors_job_ownership() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let owner = register(&app, "Maya", "maya4@example.com", "creative").await;
    let project = publish_project(&app, &owner.token).await;
    let other = register(&app, "Eve", "eve@example.com", "creative").await;

    // Foreign update and missing id are the same 404.
    let foreign = client
        .put(format!("{}/projects/{}", app.address, project.id))
        .bearer_auth(&other.token)
        .json(&json!({"title": "Mine Now"}))
        .send()
        .await
        .unwrap();
    let missing = client
        .put(format!("{}/projects/999999", app.address))
        .bearer_auth(&other.token)
        .json(&json!({"title": "Mine Now"}))
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status(), 404);
    assert_eq!(missing.status(), 404);

    // Owner's partial update touches only the submitted field.
    let response = client
        .put(format!("{}/projects/{}", app.address, project.id))
        .bearer_auth(&owner.token)
        .json(&json!({"tags": "print"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let updated: ProjectResponse = response.json().await.unwrap();
    assert_eq!(updated.tags, "print");
    assert_eq!(updated.title, "Poster Series");

    // Soft delete hides the project from everyone, owner included.
    let response = client
        .delete(format!("{}/projects/{}", app.address, project.id))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/projects/{}", app.address, project.id))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let listing: serde_json::Value = reqwest::get(format!("{}/projects", app.address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["totalCount"], 0);
}
