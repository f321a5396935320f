use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

pub mod routes;
use auth::AuthUser;
use error::ApiError;
use models::Role;
use routes::{admin, authenticated, company, creative, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Aggregates every annotated handler and schema into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register, handlers::auth::login,
        handlers::profile::get_me, handlers::profile::update_me,
        handlers::uploads::get_presigned_url,
        handlers::jobs::list_jobs, handlers::jobs::get_job, handlers::jobs::create_job,
        handlers::jobs::my_jobs, handlers::jobs::update_job, handlers::jobs::delete_job,
        handlers::companies::create_company, handlers::companies::get_my_company,
        handlers::companies::update_company,
        handlers::applications::apply_for_job, handlers::applications::my_applications,
        handlers::applications::job_applications,
        handlers::applications::update_application_status,
        handlers::projects::list_projects, handlers::projects::get_project,
        handlers::projects::create_project, handlers::projects::my_projects,
        handlers::projects::update_project, handlers::projects::delete_project,
        handlers::projects::list_categories,
        handlers::social::like_project, handlers::social::unlike_project,
        handlers::social::project_likes, handlers::social::add_comment,
        handlers::social::project_comments, handlers::social::delete_comment,
        handlers::social::follow_user, handlers::social::unfollow_user,
        handlers::social::user_followers, handlers::social::user_following,
        handlers::admin::list_users, handlers::admin::delete_user,
        handlers::admin::all_jobs, handlers::admin::set_job_status,
        handlers::admin::all_applications, handlers::admin::stats
    ),
    components(
        schemas(
            models::Role, models::JobStatus, models::ApplicationStatus, models::RegisterRole,
            models::UploadKind, models::Category,
            models::RegisterRequest, models::LoginRequest, models::UpdateProfileRequest,
            models::CreateCompanyRequest, models::UpdateCompanyRequest,
            models::CreateJobRequest, models::UpdateJobRequest,
            models::CreateProjectRequest, models::UpdateProjectRequest,
            models::CreateCommentRequest, models::ApplyJobRequest,
            models::UpdateApplicationStatusRequest,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
            models::CompanyResponse, models::UserResponse, models::UserSummary,
            models::ApplicantProfile, models::AuthResponse, models::JobResponse,
            models::ProjectImageResponse, models::ProjectResponse, models::CommentResponse,
            models::LikeResponse, models::ApplicationResponse, models::AdminDashboardStats,
        )
    ),
    tags(
        (name = "talenthub", description = "TalentHub platform API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for everything a handler needs: the
/// repository, the storage service, and the immutable configuration.
/// Both services are trait objects so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub config: AppConfig,
}

// FromRef lets extractors pull individual services out of the state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

// --- Capability-Class Middleware ---
//
// The extractor rejects with 401 before any role comparison runs, so an
// anonymous caller learns nothing about a route's role requirement.

/// Gate: any valid token.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// Gate: `creative` role.
async fn creative_middleware(
    AuthUser { role, .. }: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match role {
        Role::Creative => Ok(next.run(request).await),
        Role::Company | Role::Admin => Err(ApiError::Forbidden),
    }
}

/// Gate: `company` role.
async fn company_middleware(
    AuthUser { role, .. }: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match role {
        Role::Company => Ok(next.run(request).await),
        Role::Creative | Role::Admin => Err(ApiError::Forbidden),
    }
}

/// Gate: `admin` role.
async fn admin_middleware(
    AuthUser { role, .. }: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match role {
        Role::Admin => Ok(next.run(request).await),
        Role::Creative | Role::Company => Err(ApiError::Forbidden),
    }
}

/// create_router
///
/// Assembles the capability-segregated routers, applies the role gates,
/// and wraps everything in the observability stack (request ids, traced
/// request spans, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .merge(
            creative::creative_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                creative_middleware,
            )),
        )
        .merge(
            company::company_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                company_middleware,
            )),
        )
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                admin_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// Span factory correlating every log line of a request by its id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
