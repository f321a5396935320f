use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{
    AdminDashboardStats, ApplicationResponse, ApplicationStatus, Category, Company,
    CommentResponse, CreateCompanyRequest, CreateJobRequest, CreateProjectRequest, JobFilter,
    JobResponse, JobStatus, LikeResponse, NewUser, Page, PageParams, ProjectFilter,
    ProjectResponse, UpdateCompanyRequest, UpdateJobRequest, UpdateProfileRequest,
    UpdateProjectRequest, User, UserResponse, UserSummary,
};

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// Repository
///
/// The persistence contract every handler talks to, injected as
/// `Arc<dyn Repository>` so the Postgres implementation and the in-memory
/// one used by the test suite are interchangeable.
///
/// Two rules hold across all implementations:
///
/// 1. Every mutation on an owned resource takes the owner id and applies
///    it inside the same lookup (`WHERE id = ? AND owner = ?`). A miss on
///    either condition is the same `None`/`false` outcome; callers cannot
///    learn whether the row exists under someone else.
/// 2. Interaction edges and their parent counters move together: the edge
///    write and the counter adjustment are one atomic unit, the counter
///    never drops below zero, and a duplicate edge is rejected rather
///    than upserted.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts ---
    /// Inserts a new account. `Conflict` when the email is taken.
    async fn create_user(&self, new: NewUser) -> Result<User, ApiError>;
    async fn get_user(&self, id: i64) -> Result<Option<User>, ApiError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn get_user_with_company(
        &self,
        id: i64,
    ) -> Result<Option<(User, Option<Company>)>, ApiError>;
    /// Partial update: only fields present in the request are written.
    async fn update_profile(
        &self,
        id: i64,
        req: UpdateProfileRequest,
    ) -> Result<Option<User>, ApiError>;
    async fn list_users(&self, params: PageParams) -> Result<Page<UserResponse>, ApiError>;
    /// Admin removal. Owned items are tombstoned and interaction edges
    /// cleaned up in the same transaction, so nothing is orphaned.
    async fn delete_user_cascading(&self, id: i64) -> Result<bool, ApiError>;

    // --- Companies ---
    /// Creates the company and links it to the owner atomically.
    /// `Conflict` when the owner already has one.
    async fn create_company_for(
        &self,
        owner_id: i64,
        req: CreateCompanyRequest,
    ) -> Result<Company, ApiError>;
    async fn company_for_user(&self, user_id: i64) -> Result<Option<Company>, ApiError>;
    async fn update_company_for(
        &self,
        user_id: i64,
        req: UpdateCompanyRequest,
    ) -> Result<Option<Company>, ApiError>;

    // --- Jobs ---
    /// Public listing: active, undeleted jobs only.
    async fn list_jobs(&self, filter: JobFilter) -> Result<Page<JobResponse>, ApiError>;
    async fn get_job(&self, id: i64) -> Result<Option<JobResponse>, ApiError>;
    async fn create_job(
        &self,
        owner_id: i64,
        company_id: i64,
        req: CreateJobRequest,
    ) -> Result<JobResponse, ApiError>;
    async fn jobs_for_owner(&self, owner_id: i64) -> Result<Vec<JobResponse>, ApiError>;
    async fn update_job_owned(
        &self,
        id: i64,
        owner_id: i64,
        req: UpdateJobRequest,
    ) -> Result<Option<JobResponse>, ApiError>;
    async fn soft_delete_job_owned(&self, id: i64, owner_id: i64) -> Result<bool, ApiError>;
    async fn list_all_jobs(&self, params: PageParams) -> Result<Page<JobResponse>, ApiError>;
    async fn set_job_status(
        &self,
        id: i64,
        status: JobStatus,
    ) -> Result<Option<JobResponse>, ApiError>;

    // --- Applications ---
    /// `NotFound` when the job is missing, closed, or deleted; `Conflict`
    /// on a second application to the same job.
    async fn create_application(
        &self,
        user_id: i64,
        resume_url: &str,
        job_id: i64,
        cover_letter: String,
    ) -> Result<ApplicationResponse, ApiError>;
    async fn applications_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<ApplicationResponse>, ApiError>;
    /// `None` when the job does not exist or is not posted by `owner_id`.
    async fn applications_for_job_owned(
        &self,
        job_id: i64,
        owner_id: i64,
    ) -> Result<Option<Vec<ApplicationResponse>>, ApiError>;
    async fn set_application_status_owned(
        &self,
        app_id: i64,
        owner_id: i64,
        status: ApplicationStatus,
    ) -> Result<Option<ApplicationResponse>, ApiError>;
    async fn list_all_applications(
        &self,
        params: PageParams,
    ) -> Result<Page<ApplicationResponse>, ApiError>;

    // --- Projects ---
    async fn list_projects(&self, filter: ProjectFilter)
    -> Result<Page<ProjectResponse>, ApiError>;
    /// Successful fetch counts as a view; `viewer` personalizes is_liked.
    async fn get_project(
        &self,
        id: i64,
        viewer: Option<i64>,
    ) -> Result<Option<ProjectResponse>, ApiError>;
    async fn create_project(
        &self,
        owner_id: i64,
        req: CreateProjectRequest,
    ) -> Result<ProjectResponse, ApiError>;
    async fn projects_for_owner(&self, owner_id: i64) -> Result<Vec<ProjectResponse>, ApiError>;
    async fn update_project_owned(
        &self,
        id: i64,
        owner_id: i64,
        req: UpdateProjectRequest,
    ) -> Result<Option<ProjectResponse>, ApiError>;
    async fn soft_delete_project_owned(&self, id: i64, owner_id: i64) -> Result<bool, ApiError>;
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    // --- Interaction edges & counters ---
    /// Creates the like edge and bumps the parent counter as one unit.
    /// `NotFound` when the project is missing, `Conflict` on a live edge.
    async fn like_project(&self, user_id: i64, project_id: i64) -> Result<(), ApiError>;
    /// Removes the edge and decrements the counter (floored at zero) as
    /// one unit. `NotFound` when no live edge exists.
    async fn unlike_project(&self, user_id: i64, project_id: i64) -> Result<(), ApiError>;
    async fn likes_for_project(&self, project_id: i64) -> Result<Vec<LikeResponse>, ApiError>;
    async fn add_comment(
        &self,
        user_id: i64,
        project_id: i64,
        content: String,
    ) -> Result<CommentResponse, ApiError>;
    async fn comments_for_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<CommentResponse>, ApiError>;
    async fn delete_comment_owned(&self, id: i64, user_id: i64) -> Result<bool, ApiError>;
    async fn delete_comment_admin(&self, id: i64) -> Result<bool, ApiError>;
    /// `NotFound` when the target account is missing, `Conflict` when the
    /// edge already exists.
    async fn follow_user(&self, follower_id: i64, following_id: i64) -> Result<(), ApiError>;
    async fn unfollow_user(&self, follower_id: i64, following_id: i64) -> Result<(), ApiError>;
    async fn followers_of(&self, user_id: i64) -> Result<Vec<UserSummary>, ApiError>;
    async fn following_of(&self, user_id: i64) -> Result<Vec<UserSummary>, ApiError>;

    // --- Admin ---
    async fn get_stats(&self) -> Result<AdminDashboardStats, ApiError>;
}

/// The shared handle handlers receive through the application state.
pub type RepositoryState = Arc<dyn Repository>;
