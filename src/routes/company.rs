use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Company Router Module
///
/// Employer surface, restricted to `company` accounts by the role
/// middleware layered over this router: the company profile (one per
/// account), job postings, and the applications received on them.
pub fn company_routes() -> Router<AppState> {
    Router::new()
        // Company profile lifecycle. Creation links the company to the
        // account atomically; a second creation conflicts.
        .route(
            "/company",
            post(handlers::companies::create_company)
                .get(handlers::companies::get_my_company)
                .put(handlers::companies::update_company),
        )
        // Posting management, ownership-scoped per job.
        .route("/jobs", post(handlers::jobs::create_job))
        .route("/company/jobs", get(handlers::jobs::my_jobs))
        .route(
            "/jobs/{id}",
            put(handlers::jobs::update_job).delete(handlers::jobs::delete_job),
        )
        // Hiring pipeline.
        .route(
            "/jobs/{id}/applications",
            get(handlers::applications::job_applications),
        )
        .route(
            "/applications/{id}/status",
            put(handlers::applications::update_application_status),
        )
}
