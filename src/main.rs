use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use talenthub::{
    AppState,
    config::{AppConfig, Env},
    create_router, credentials,
    models::{NewUser, Role},
    repository::{PostgresRepository, RepositoryState},
    storage::{S3StorageClient, StorageState},
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Seeds the bootstrap admin account when configured and absent. Failure
/// is logged, not fatal: the platform runs without an admin.
async fn create_default_admin(repo: &RepositoryState, config: &AppConfig) {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return;
    };

    match repo.get_user_by_email(email).await {
        Ok(Some(_)) => {
            tracing::info!("admin account already exists");
            return;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("admin lookup failed: {}", e);
            return;
        }
    }

    let password_hash = match credentials::hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!("failed to hash admin password: {}", e);
            return;
        }
    };

    match repo
        .create_user(NewUser {
            name: "Admin".to_string(),
            email: email.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await
    {
        Ok(_) => tracing::info!("admin account created"),
        Err(e) => tracing::warn!("failed to create admin account: {}", e),
    }
}

#[tokio::main]
async fn main() {
    // Configuration first; missing production secrets abort startup.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "talenthub=debug,tower_http=info,axum=trace".into());

    // Pretty output locally, JSON in production for log aggregation.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("starting in {:?} mode", config.env);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: failed to connect to Postgres, check DATABASE_URL");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    create_default_admin(&repo, &config).await;

    let s3_client = S3StorageClient::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    )
    .await;

    // Local MinIO starts empty; provision the bucket up front.
    if config.env == Env::Local {
        use talenthub::storage::StorageService;
        s3_client.ensure_bucket_exists().await;
    }

    let storage = Arc::new(s3_client) as StorageState;

    let app_state = AppState {
        repo,
        storage,
        config,
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:8082")
        .await
        .expect("FATAL: failed to bind 0.0.0.0:8082");

    tracing::info!("listening on 0.0.0.0:8082");
    tracing::info!("API docs at http://localhost:8082/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: server error");
}
