use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Closed Enumerations ---

/// Raised when a stored enum column carries a value outside the closed set.
/// Reaching this means the database was written by something other than
/// this application.
#[derive(Debug, Error)]
#[error("unrecognized value: {0}")]
pub struct ParseEnumError(String);

/// Role
///
/// The account role, fixed at registration. `Admin` is never
/// self-assignable; the bootstrap admin is seeded from configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Creative,
    Company,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Creative => "creative",
            Role::Company => "company",
            Role::Admin => "admin",
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "creative" => Ok(Role::Creative),
            "company" => Ok(Role::Company),
            "admin" => Ok(Role::Admin),
            _ => Err(ParseEnumError(value)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job posting lifecycle. Only `active` jobs are publicly listed or
/// accept applications.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum JobStatus {
    #[default]
    Active,
    Closed,
    Pending,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Closed => "closed",
            JobStatus::Pending => "pending",
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(JobStatus::Active),
            "closed" => Ok(JobStatus::Closed),
            "pending" => Ok(JobStatus::Pending),
            _ => Err(ParseEnumError(value)),
        }
    }
}

/// Application review pipeline, driven by the job's poster.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
        }
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" => Ok(ApplicationStatus::Reviewed),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "accepted" => Ok(ApplicationStatus::Accepted),
            _ => Err(ParseEnumError(value)),
        }
    }
}

// --- Database Rows ---

/// User
///
/// Canonical account record. The password hash never crosses the wire;
/// `UserResponse` is the serializable view.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub phone: String,
    pub location: String,
    pub bio: String,
    pub skills: String,
    pub website: String,
    pub avatar_url: String,
    pub resume_url: String,
    pub for_hire: bool,
    pub verified: bool,
    // Set at most once, when the account creates its company profile.
    pub company_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new account; everything else starts at defaults.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Company profile, owned through `users.company_id`.
#[derive(Debug, Clone, FromRow)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub website: String,
    pub location: String,
    pub logo_url: String,
    pub industry: String,
    pub size: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Job posting. `posted_by` is the owning account; `deleted_at` is the
/// soft-delete tombstone excluded from every default query.
#[derive(Debug, Clone, FromRow)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company_id: i64,
    pub location: String,
    pub job_type: String,
    pub salary: String,
    pub experience: String,
    pub skills: String,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub posted_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Portfolio project. `views` and `likes_count` are the denormalized
/// aggregates maintained alongside their edge tables.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub tags: String,
    pub cover_image: String,
    pub views: i64,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectImage {
    pub id: i64,
    pub project_id: i64,
    pub image_url: String,
    pub position: i32,
}

/// Read-only reference data seeded by migration.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub icon: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Like edge: at most one live row per (user, project) pair.
#[derive(Debug, Clone, FromRow)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub project_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Follow edge: at most one live row per (follower, following) pair.
#[derive(Debug, Clone, FromRow)]
pub struct Follow {
    pub id: i64,
    pub follower_id: i64,
    pub following_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Job application. Unique on (job_id, user_id).
#[derive(Debug, Clone, FromRow)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub user_id: i64,
    pub resume_url: String,
    pub cover_letter: String,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads ---

/// Registration role choice. Admin is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RegisterRole {
    Creative,
    Company,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `creative` when omitted.
    pub role: Option<RegisterRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// UpdateProfileRequest
///
/// Partial update: `None` means "leave the column untouched", while an
/// explicit value (including the empty string) overwrites. Absent and
/// empty are therefore distinguishable on every field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_hire: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateCompanyRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub size: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateCompanyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub skills: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    pub category_id: i64,
    /// Comma-separated.
    #[serde(default)]
    pub tags: String,
    /// Object keys from the presigned upload flow; the first becomes the
    /// cover image.
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApplyJobRequest {
    #[serde(default)]
    pub cover_letter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateApplicationStatusRequest {
    pub status: ApplicationStatus,
}

/// Upload destinations. Each kind maps to its own key prefix, and resumes
/// are constrained to PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UploadKind {
    Avatar,
    Logo,
    ProjectImage,
    Resume,
}

impl UploadKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            UploadKind::Avatar => "avatars",
            UploadKind::Logo => "logos",
            UploadKind::ProjectImage => "projects",
            UploadKind::Resume => "resumes",
        }
    }

    /// Content types this destination accepts.
    pub fn accepts(&self, content_type: &str) -> bool {
        match self {
            UploadKind::Resume => content_type == "application/pdf",
            UploadKind::Avatar | UploadKind::Logo | UploadKind::ProjectImage => {
                content_type.starts_with("image/")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PresignedUrlRequest {
    #[schema(example = "portrait.png")]
    pub filename: String,
    #[schema(example = "image/png")]
    pub file_type: String,
    pub kind: UploadKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    pub resource_key: String,
}

// --- Query Parameters ---

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Plain pagination, shared by admin listings.
#[derive(Debug, Clone, Copy, Default, Deserialize, utoipa::IntoParams)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Returns (page, limit, offset) with out-of-range input clamped.
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        (page, limit, (page - 1) * limit)
    }
}

/// Query parameters for the public job board listing.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct JobFilter {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Matches title and description, case-insensitively.
    pub search: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
}

impl JobFilter {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Query parameters for the public project gallery.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct ProjectFilter {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Matches title, description, and tags.
    pub search: Option<String>,
    /// Category slug.
    pub category: Option<String>,
}

impl ProjectFilter {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

// --- Response Schemas ---

/// Paginated listing envelope.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub total_pages: i64,
    pub total_count: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, limit: i64, total_count: i64) -> Self {
        Self {
            items,
            page,
            total_pages: (total_count + limit - 1) / limit,
            total_count,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CompanyResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub website: String,
    pub location: String,
    pub logo_url: String,
    pub industry: String,
    pub size: String,
}

impl From<Company> for CompanyResponse {
    fn from(c: Company) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            website: c.website,
            location: c.location,
            logo_url: c.logo_url,
            industry: c.industry,
            size: c.size,
        }
    }
}

/// Full profile view, returned by login, registration, /me, and the admin
/// user listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    pub location: String,
    pub bio: String,
    pub skills: String,
    pub website: String,
    pub avatar_url: String,
    pub resume_url: String,
    pub for_hire: bool,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyResponse>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_parts(user: User, company: Option<Company>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            location: user.location,
            bio: user.bio,
            skills: user.skills,
            website: user.website,
            avatar_url: user.avatar_url,
            resume_url: user.resume_url,
            for_hire: user.for_hire,
            verified: user.verified,
            company: company.map(CompanyResponse::from),
            created_at: user.created_at,
        }
    }
}

/// Compact public identity used in likes, comments, follow lists, and
/// project bylines.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub avatar_url: String,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            avatar_url: u.avatar_url.clone(),
        }
    }
}

/// What a job's poster sees about an applicant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApplicantProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub bio: String,
    pub resume_url: String,
}

impl From<&User> for ApplicantProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
            location: u.location.clone(),
            bio: u.bio.clone(),
            resume_url: u.resume_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct JobResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company: CompanyResponse,
    pub location: String,
    pub job_type: String,
    pub salary: String,
    pub experience: String,
    pub skills: String,
    pub status: JobStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl JobResponse {
    pub fn from_parts(job: Job, company: CompanyResponse) -> Self {
        Self {
            id: job.id,
            title: job.title,
            description: job.description,
            company,
            location: job.location,
            job_type: job.job_type,
            salary: job.salary,
            experience: job.experience,
            skills: job.skills,
            status: job.status,
            created_at: job.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProjectImageResponse {
    pub id: i64,
    pub image_url: String,
    pub position: i32,
}

impl From<&ProjectImage> for ProjectImageResponse {
    fn from(img: &ProjectImage) -> Self {
        Self {
            id: img.id,
            image_url: img.image_url.clone(),
            position: img.position,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProjectResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub cover_image: String,
    pub images: Vec<ProjectImageResponse>,
    pub user: UserSummary,
    pub category: Category,
    pub tags: String,
    pub views: i64,
    pub likes_count: i64,
    /// Whether the requesting account has a live like edge on this
    /// project. Always false for anonymous callers.
    pub is_liked: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CommentResponse {
    pub id: i64,
    pub user: UserSummary,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LikeResponse {
    pub id: i64,
    pub user: UserSummary,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Application view. `job` is populated for the applicant's own listing,
/// `applicant` for the poster's; the admin listing carries both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApplicationResponse {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant: Option<ApplicantProfile>,
    pub resume_url: String,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Counters for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_users: i64,
    pub total_companies: i64,
    pub total_jobs: i64,
    pub total_projects: i64,
    pub total_applications: i64,
    pub total_likes: i64,
}
