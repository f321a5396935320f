use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, query_builder::QueryBuilder};
use std::collections::{HashMap, HashSet};

use crate::error::{ApiError, is_unique_violation};
use crate::models::{
    AdminDashboardStats, Application, ApplicationResponse, ApplicationStatus, ApplicantProfile,
    Category, Company, CompanyResponse, CommentResponse, CreateCompanyRequest, CreateJobRequest,
    CreateProjectRequest, Job, JobFilter, JobResponse, JobStatus, LikeResponse, NewUser, Page,
    PageParams, ProjectFilter, ProjectImage, ProjectImageResponse, ProjectResponse,
    UpdateCompanyRequest, UpdateJobRequest, UpdateProfileRequest, UpdateProjectRequest, User,
    UserResponse, UserSummary,
};

use super::Repository;

const USER_COLS: &str = "id, name, email, password_hash, role, phone, location, bio, skills, \
     website, avatar_url, resume_url, for_hire, verified, company_id, created_at, updated_at";

const COMPANY_COLS: &str =
    "id, name, description, website, location, logo_url, industry, size, created_at, updated_at";

const JOB_COLS: &str = "id, title, description, company_id, location, job_type, salary, \
     experience, skills, status, posted_by, created_at, updated_at, deleted_at";

const APPLICATION_COLS: &str =
    "id, job_id, user_id, resume_url, cover_letter, status, created_at, updated_at";

/// Job joined with its company, aliased to avoid column collisions.
const JOB_SELECT: &str = "SELECT j.id, j.title, j.description, j.location, j.job_type, \
     j.salary, j.experience, j.skills, j.status, j.created_at, \
     c.id AS company_id, c.name AS company_name, c.description AS company_description, \
     c.website AS company_website, c.location AS company_location, c.logo_url AS company_logo, \
     c.industry AS company_industry, c.size AS company_size \
     FROM jobs j JOIN companies c ON j.company_id = c.id";

/// Project joined with owner and category.
const PROJECT_SELECT: &str = "SELECT p.id, p.user_id, p.title, p.description, p.tags, \
     p.cover_image, p.views, p.likes_count, p.created_at, \
     u.name AS user_name, u.avatar_url AS user_avatar, \
     cat.id AS category_id, cat.name AS category_name, cat.slug AS category_slug, \
     cat.icon AS category_icon \
     FROM projects p JOIN users u ON p.user_id = u.id \
     JOIN categories cat ON p.category_id = cat.id";

#[derive(FromRow)]
struct JobRow {
    id: i64,
    title: String,
    description: String,
    location: String,
    job_type: String,
    salary: String,
    experience: String,
    skills: String,
    #[sqlx(try_from = "String")]
    status: JobStatus,
    created_at: DateTime<Utc>,
    company_id: i64,
    company_name: String,
    company_description: String,
    company_website: String,
    company_location: String,
    company_logo: String,
    company_industry: String,
    company_size: String,
}

impl From<JobRow> for JobResponse {
    fn from(r: JobRow) -> Self {
        JobResponse {
            id: r.id,
            title: r.title,
            description: r.description,
            company: CompanyResponse {
                id: r.company_id,
                name: r.company_name,
                description: r.company_description,
                website: r.company_website,
                location: r.company_location,
                logo_url: r.company_logo,
                industry: r.company_industry,
                size: r.company_size,
            },
            location: r.location,
            job_type: r.job_type,
            salary: r.salary,
            experience: r.experience,
            skills: r.skills,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct ProjectRow {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    tags: String,
    cover_image: String,
    views: i64,
    likes_count: i64,
    created_at: DateTime<Utc>,
    user_name: String,
    user_avatar: String,
    category_id: i64,
    category_name: String,
    category_slug: String,
    category_icon: String,
}

#[derive(FromRow)]
struct LikeRow {
    id: i64,
    created_at: DateTime<Utc>,
    user_id: i64,
    user_name: String,
    user_avatar: String,
}

#[derive(FromRow)]
struct CommentRow {
    id: i64,
    content: String,
    created_at: DateTime<Utc>,
    user_id: i64,
    user_name: String,
    user_avatar: String,
}

/// Application joined with its job and company, for the applicant's view.
#[derive(FromRow)]
struct ApplicationJobRow {
    id: i64,
    resume_url: String,
    cover_letter: String,
    #[sqlx(try_from = "String")]
    status: ApplicationStatus,
    created_at: DateTime<Utc>,
    job_id: i64,
    job_title: String,
    job_description: String,
    job_location: String,
    job_type: String,
    job_salary: String,
    job_experience: String,
    job_skills: String,
    #[sqlx(try_from = "String")]
    job_status: JobStatus,
    job_created_at: DateTime<Utc>,
    company_id: i64,
    company_name: String,
    company_location: String,
    company_logo: String,
}

impl ApplicationJobRow {
    fn job_response(&self) -> JobResponse {
        JobResponse {
            id: self.job_id,
            title: self.job_title.clone(),
            description: self.job_description.clone(),
            company: CompanyResponse {
                id: self.company_id,
                name: self.company_name.clone(),
                location: self.company_location.clone(),
                logo_url: self.company_logo.clone(),
                ..CompanyResponse::default()
            },
            location: self.job_location.clone(),
            job_type: self.job_type.clone(),
            salary: self.job_salary.clone(),
            experience: self.job_experience.clone(),
            skills: self.job_skills.clone(),
            status: self.job_status,
            created_at: self.job_created_at,
        }
    }
}

impl From<ApplicationJobRow> for ApplicationResponse {
    fn from(r: ApplicationJobRow) -> Self {
        let job = r.job_response();
        ApplicationResponse {
            id: r.id,
            job: Some(job),
            applicant: None,
            resume_url: r.resume_url,
            cover_letter: r.cover_letter,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

/// Application joined with the applicant, for the poster's view.
#[derive(FromRow)]
struct ApplicationApplicantRow {
    id: i64,
    resume_url: String,
    cover_letter: String,
    #[sqlx(try_from = "String")]
    status: ApplicationStatus,
    created_at: DateTime<Utc>,
    applicant_id: i64,
    applicant_name: String,
    applicant_email: String,
    applicant_phone: String,
    applicant_location: String,
    applicant_bio: String,
    applicant_resume: String,
}

impl From<ApplicationApplicantRow> for ApplicationResponse {
    fn from(r: ApplicationApplicantRow) -> Self {
        ApplicationResponse {
            id: r.id,
            job: None,
            applicant: Some(ApplicantProfile {
                id: r.applicant_id,
                name: r.applicant_name,
                email: r.applicant_email,
                phone: r.applicant_phone,
                location: r.applicant_location,
                bio: r.applicant_bio,
                resume_url: r.applicant_resume,
            }),
            resume_url: r.resume_url,
            cover_letter: r.cover_letter,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

/// PostgresRepository
///
/// The production implementation, one `PgPool` shared across request
/// workers. All per-request coordination is left to the pool and to
/// Postgres transactions.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_company(&self, id: i64) -> Result<Company, ApiError> {
        let sql = format!("SELECT {COMPANY_COLS} FROM companies WHERE id = $1");
        Ok(sqlx::query_as::<_, Company>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn job_response_for(&self, job: Job) -> Result<JobResponse, ApiError> {
        let company = self.fetch_company(job.company_id).await?;
        Ok(JobResponse::from_parts(job, company.into()))
    }

    /// Resolves images (batched) and the viewer's like edges for a page
    /// of project rows.
    async fn project_responses(
        &self,
        rows: Vec<ProjectRow>,
        viewer: Option<i64>,
    ) -> Result<Vec<ProjectResponse>, ApiError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let mut images_by_project: HashMap<i64, Vec<ProjectImageResponse>> = HashMap::new();
        if !ids.is_empty() {
            let images = sqlx::query_as::<_, ProjectImage>(
                "SELECT id, project_id, image_url, position FROM project_images \
                 WHERE project_id = ANY($1) ORDER BY position ASC",
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
            for img in &images {
                images_by_project
                    .entry(img.project_id)
                    .or_default()
                    .push(img.into());
            }
        }

        let mut liked: HashSet<i64> = HashSet::new();
        if let Some(viewer_id) = viewer {
            if !ids.is_empty() {
                let rows: Vec<(i64,)> = sqlx::query_as(
                    "SELECT project_id FROM likes WHERE user_id = $1 AND project_id = ANY($2)",
                )
                .bind(viewer_id)
                .bind(&ids)
                .fetch_all(&self.pool)
                .await?;
                liked = rows.into_iter().map(|(id,)| id).collect();
            }
        }

        Ok(rows
            .into_iter()
            .map(|r| ProjectResponse {
                is_liked: liked.contains(&r.id),
                images: images_by_project.remove(&r.id).unwrap_or_default(),
                user: UserSummary {
                    id: r.user_id,
                    name: r.user_name,
                    avatar_url: r.user_avatar,
                },
                category: Category {
                    id: r.category_id,
                    name: r.category_name,
                    slug: r.category_slug,
                    icon: r.category_icon,
                },
                id: r.id,
                title: r.title,
                description: r.description,
                cover_image: r.cover_image,
                tags: r.tags,
                views: r.views,
                likes_count: r.likes_count,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn fetch_project_response(
        &self,
        id: i64,
        viewer: Option<i64>,
    ) -> Result<Option<ProjectResponse>, ApiError> {
        let sql = format!("{PROJECT_SELECT} WHERE p.id = $1 AND p.deleted_at IS NULL");
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.project_responses(vec![row], viewer).await?.pop()),
            None => Ok(None),
        }
    }
}

fn push_project_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    category_id: Option<i64>,
    search: Option<&str>,
) {
    if let Some(id) = category_id {
        builder.push(" AND p.category_id = ");
        builder.push_bind(id);
    }
    if let Some(search) = search.filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder.push(" AND (p.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR p.description ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR p.tags ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

fn push_job_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &JobFilter) {
    if let Some(search) = filter.search.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder.push(" AND (j.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR j.description ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(job_type) = filter.job_type.as_ref().filter(|s| !s.is_empty()) {
        builder.push(" AND j.job_type = ");
        builder.push_bind(job_type.clone());
    }
    if let Some(location) = filter.location.as_ref().filter(|s| !s.is_empty()) {
        builder.push(" AND j.location ILIKE ");
        builder.push_bind(format!("%{}%", location));
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- Accounts ---

    async fn create_user(&self, new: NewUser) -> Result<User, ApiError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, role, phone, location, bio, skills, \
             website, avatar_url, resume_url, for_hire, verified, company_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, '', '', '', '', '', '', '', false, true, NULL, NOW(), NOW()) \
             RETURNING {USER_COLS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(new.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::Conflict("email already registered".to_string())
                } else {
                    e.into()
                }
            })
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, ApiError> {
        let sql = format!("SELECT {USER_COLS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let sql = format!("SELECT {USER_COLS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_with_company(
        &self,
        id: i64,
    ) -> Result<Option<(User, Option<Company>)>, ApiError> {
        let Some(user) = self.get_user(id).await? else {
            return Ok(None);
        };
        let company = match user.company_id {
            Some(company_id) => Some(self.fetch_company(company_id).await?),
            None => None,
        };
        Ok(Some((user, company)))
    }

    async fn update_profile(
        &self,
        id: i64,
        req: UpdateProfileRequest,
    ) -> Result<Option<User>, ApiError> {
        let sql = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                phone = COALESCE($3, phone), \
                location = COALESCE($4, location), \
                bio = COALESCE($5, bio), \
                skills = COALESCE($6, skills), \
                website = COALESCE($7, website), \
                for_hire = COALESCE($8, for_hire), \
                avatar_url = COALESCE($9, avatar_url), \
                resume_url = COALESCE($10, resume_url), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(req.name)
            .bind(req.phone)
            .bind(req.location)
            .bind(req.bio)
            .bind(req.skills)
            .bind(req.website)
            .bind(req.for_hire)
            .bind(req.avatar_url)
            .bind(req.resume_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self, params: PageParams) -> Result<Page<UserResponse>, ApiError> {
        let (page, limit, offset) = params.normalize();
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {USER_COLS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let items = users
            .into_iter()
            .map(|u| UserResponse::from_parts(u, None))
            .collect();
        Ok(Page::new(items, page, limit, total_count))
    }

    async fn delete_user_cascading(&self, id: i64) -> Result<bool, ApiError> {
        let mut tx = self.pool.begin().await?;

        // Give back the likes this account handed out before dropping the
        // edges, keeping every counter equal to its edge count.
        sqlx::query(
            "UPDATE projects p SET likes_count = GREATEST(p.likes_count - 1, 0) \
             FROM likes l WHERE l.project_id = p.id AND l.user_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM likes WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM follows WHERE follower_id = $1 OR following_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comments WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM applications WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Owned items become tombstones rather than orphans.
        sqlx::query(
            "UPDATE jobs SET deleted_at = NOW(), updated_at = NOW() \
             WHERE posted_by = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE projects SET deleted_at = NOW(), updated_at = NOW() \
             WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(deleted.rows_affected() > 0)
    }

    // --- Companies ---

    async fn create_company_for(
        &self,
        owner_id: i64,
        req: CreateCompanyRequest,
    ) -> Result<Company, ApiError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "INSERT INTO companies (name, description, website, location, logo_url, industry, \
             size, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, '', $5, $6, NOW(), NOW()) \
             RETURNING {COMPANY_COLS}"
        );
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(&req.name)
            .bind(&req.description)
            .bind(&req.website)
            .bind(&req.location)
            .bind(&req.industry)
            .bind(&req.size)
            .fetch_one(&mut *tx)
            .await?;

        // The link is claimed in the same transaction; a second company
        // for the same account loses here and the insert rolls back.
        let linked = sqlx::query(
            "UPDATE users SET company_id = $1, updated_at = NOW() \
             WHERE id = $2 AND company_id IS NULL",
        )
        .bind(company.id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;
        if linked.rows_affected() == 0 {
            return Err(ApiError::Conflict(
                "company profile already exists".to_string(),
            ));
        }
        tx.commit().await?;
        Ok(company)
    }

    async fn company_for_user(&self, user_id: i64) -> Result<Option<Company>, ApiError> {
        let sql = format!(
            "SELECT c.id, c.name, c.description, c.website, c.location, c.logo_url, \
             c.industry, c.size, c.created_at, c.updated_at \
             FROM companies c JOIN users u ON u.company_id = c.id WHERE u.id = $1"
        );
        Ok(sqlx::query_as::<_, Company>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_company_for(
        &self,
        user_id: i64,
        req: UpdateCompanyRequest,
    ) -> Result<Option<Company>, ApiError> {
        let sql = "UPDATE companies c SET \
                name = COALESCE($2, c.name), \
                description = COALESCE($3, c.description), \
                website = COALESCE($4, c.website), \
                location = COALESCE($5, c.location), \
                logo_url = COALESCE($6, c.logo_url), \
                industry = COALESCE($7, c.industry), \
                size = COALESCE($8, c.size), \
                updated_at = NOW() \
             FROM users u \
             WHERE u.id = $1 AND u.company_id = c.id \
             RETURNING c.id, c.name, c.description, c.website, c.location, c.logo_url, \
                c.industry, c.size, c.created_at, c.updated_at";
        Ok(sqlx::query_as::<_, Company>(sql)
            .bind(user_id)
            .bind(req.name)
            .bind(req.description)
            .bind(req.website)
            .bind(req.location)
            .bind(req.logo_url)
            .bind(req.industry)
            .bind(req.size)
            .fetch_optional(&self.pool)
            .await?)
    }

    // --- Jobs ---

    async fn list_jobs(&self, filter: JobFilter) -> Result<Page<JobResponse>, ApiError> {
        let (page, limit, offset) = filter.page_params().normalize();

        let mut count_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM jobs j JOIN companies c ON j.company_id = c.id \
             WHERE j.status = 'active' AND j.deleted_at IS NULL",
        );
        push_job_filters(&mut count_builder, &filter);
        let total_count: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "{JOB_SELECT} WHERE j.status = 'active' AND j.deleted_at IS NULL"
        ));
        push_job_filters(&mut builder, &filter);
        builder.push(" ORDER BY j.created_at DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows: Vec<JobRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let items = rows.into_iter().map(JobResponse::from).collect();
        Ok(Page::new(items, page, limit, total_count))
    }

    async fn get_job(&self, id: i64) -> Result<Option<JobResponse>, ApiError> {
        let sql = format!("{JOB_SELECT} WHERE j.id = $1 AND j.deleted_at IS NULL");
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(JobResponse::from))
    }

    async fn create_job(
        &self,
        owner_id: i64,
        company_id: i64,
        req: CreateJobRequest,
    ) -> Result<JobResponse, ApiError> {
        let sql = format!(
            "INSERT INTO jobs (title, description, company_id, location, job_type, salary, \
             experience, skills, status, posted_by, created_at, updated_at, deleted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active', $9, NOW(), NOW(), NULL) \
             RETURNING {JOB_COLS}"
        );
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(&req.title)
            .bind(&req.description)
            .bind(company_id)
            .bind(&req.location)
            .bind(&req.job_type)
            .bind(&req.salary)
            .bind(&req.experience)
            .bind(&req.skills)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        self.job_response_for(job).await
    }

    async fn jobs_for_owner(&self, owner_id: i64) -> Result<Vec<JobResponse>, ApiError> {
        let sql = format!(
            "{JOB_SELECT} WHERE j.posted_by = $1 AND j.deleted_at IS NULL \
             ORDER BY j.created_at DESC"
        );
        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(JobResponse::from).collect())
    }

    async fn update_job_owned(
        &self,
        id: i64,
        owner_id: i64,
        req: UpdateJobRequest,
    ) -> Result<Option<JobResponse>, ApiError> {
        let sql = format!(
            "UPDATE jobs SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                location = COALESCE($5, location), \
                job_type = COALESCE($6, job_type), \
                salary = COALESCE($7, salary), \
                experience = COALESCE($8, experience), \
                skills = COALESCE($9, skills), \
                status = COALESCE($10, status), \
                updated_at = NOW() \
             WHERE id = $1 AND posted_by = $2 AND deleted_at IS NULL \
             RETURNING {JOB_COLS}"
        );
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(req.title)
            .bind(req.description)
            .bind(req.location)
            .bind(req.job_type)
            .bind(req.salary)
            .bind(req.experience)
            .bind(req.skills)
            .bind(req.status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await?;
        match job {
            Some(job) => Ok(Some(self.job_response_for(job).await?)),
            None => Ok(None),
        }
    }

    async fn soft_delete_job_owned(&self, id: i64, owner_id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE jobs SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND posted_by = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all_jobs(&self, params: PageParams) -> Result<Page<JobResponse>, ApiError> {
        let (page, limit, offset) = params.normalize();
        let total_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        let sql = format!(
            "{JOB_SELECT} WHERE j.deleted_at IS NULL ORDER BY j.created_at DESC \
             LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let items = rows.into_iter().map(JobResponse::from).collect();
        Ok(Page::new(items, page, limit, total_count))
    }

    async fn set_job_status(
        &self,
        id: i64,
        status: JobStatus,
    ) -> Result<Option<JobResponse>, ApiError> {
        let sql = format!(
            "UPDATE jobs SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {JOB_COLS}"
        );
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?;
        match job {
            Some(job) => Ok(Some(self.job_response_for(job).await?)),
            None => Ok(None),
        }
    }

    // --- Applications ---

    async fn create_application(
        &self,
        user_id: i64,
        resume_url: &str,
        job_id: i64,
        cover_letter: String,
    ) -> Result<ApplicationResponse, ApiError> {
        // Applications only land on live, active jobs.
        let open: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM jobs WHERE id = $1 AND status = 'active' AND deleted_at IS NULL",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        if open.is_none() {
            return Err(ApiError::NotFound);
        }

        let sql = format!(
            "INSERT INTO applications (job_id, user_id, resume_url, cover_letter, status, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 'pending', NOW(), NOW()) \
             RETURNING {APPLICATION_COLS}"
        );
        let app = sqlx::query_as::<_, Application>(&sql)
            .bind(job_id)
            .bind(user_id)
            .bind(resume_url)
            .bind(&cover_letter)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ApiError::Conflict("already applied for this job".to_string())
                } else {
                    e.into()
                }
            })?;
        Ok(plain_application_response(app))
    }

    async fn applications_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<ApplicationResponse>, ApiError> {
        let rows = sqlx::query_as::<_, ApplicationJobRow>(
            "SELECT a.id, a.resume_url, a.cover_letter, a.status, a.created_at, \
                j.id AS job_id, j.title AS job_title, j.description AS job_description, \
                j.location AS job_location, j.job_type AS job_type, j.salary AS job_salary, \
                j.experience AS job_experience, j.skills AS job_skills, \
                j.status AS job_status, j.created_at AS job_created_at, \
                c.id AS company_id, c.name AS company_name, \
                c.location AS company_location, c.logo_url AS company_logo \
             FROM applications a \
             JOIN jobs j ON a.job_id = j.id \
             JOIN companies c ON j.company_id = c.id \
             WHERE a.user_id = $1 ORDER BY a.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ApplicationResponse::from).collect())
    }

    async fn applications_for_job_owned(
        &self,
        job_id: i64,
        owner_id: i64,
    ) -> Result<Option<Vec<ApplicationResponse>>, ApiError> {
        // Ownership and existence collapse into one lookup.
        let owned: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM jobs WHERE id = $1 AND posted_by = $2 AND deleted_at IS NULL",
        )
        .bind(job_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        if owned.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, ApplicationApplicantRow>(
            "SELECT a.id, a.resume_url, a.cover_letter, a.status, a.created_at, \
                u.id AS applicant_id, u.name AS applicant_name, u.email AS applicant_email, \
                u.phone AS applicant_phone, u.location AS applicant_location, \
                u.bio AS applicant_bio, u.resume_url AS applicant_resume \
             FROM applications a JOIN users u ON a.user_id = u.id \
             WHERE a.job_id = $1 ORDER BY a.created_at DESC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Some(
            rows.into_iter().map(ApplicationResponse::from).collect(),
        ))
    }

    async fn set_application_status_owned(
        &self,
        app_id: i64,
        owner_id: i64,
        status: ApplicationStatus,
    ) -> Result<Option<ApplicationResponse>, ApiError> {
        // Single-statement ownership join: the update only lands when the
        // application's job belongs to the caller.
        let app = sqlx::query_as::<_, Application>(
            "UPDATE applications a SET status = $3, updated_at = NOW() \
             FROM jobs j \
             WHERE a.id = $1 AND a.job_id = j.id AND j.posted_by = $2 \
               AND j.deleted_at IS NULL \
             RETURNING a.id, a.job_id, a.user_id, a.resume_url, a.cover_letter, a.status, \
               a.created_at, a.updated_at",
        )
        .bind(app_id)
        .bind(owner_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(app.map(plain_application_response))
    }

    async fn list_all_applications(
        &self,
        params: PageParams,
    ) -> Result<Page<ApplicationResponse>, ApiError> {
        let (page, limit, offset) = params.normalize();
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, ApplicationJobRow>(
            "SELECT a.id, a.resume_url, a.cover_letter, a.status, a.created_at, \
                j.id AS job_id, j.title AS job_title, j.description AS job_description, \
                j.location AS job_location, j.job_type AS job_type, j.salary AS job_salary, \
                j.experience AS job_experience, j.skills AS job_skills, \
                j.status AS job_status, j.created_at AS job_created_at, \
                c.id AS company_id, c.name AS company_name, \
                c.location AS company_location, c.logo_url AS company_logo \
             FROM applications a \
             JOIN jobs j ON a.job_id = j.id \
             JOIN companies c ON j.company_id = c.id \
             ORDER BY a.created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let items = rows.into_iter().map(ApplicationResponse::from).collect();
        Ok(Page::new(items, page, limit, total_count))
    }

    // --- Projects ---

    async fn list_projects(
        &self,
        filter: ProjectFilter,
    ) -> Result<Page<ProjectResponse>, ApiError> {
        let (page, limit, offset) = filter.page_params().normalize();

        // Category filters go through the slug; an unknown slug simply
        // matches nothing rather than erroring.
        let category_id: Option<i64> = match filter.category.as_ref().filter(|s| !s.is_empty()) {
            Some(slug) => {
                let found: Option<(i64,)> =
                    sqlx::query_as("SELECT id FROM categories WHERE slug = $1")
                        .bind(slug)
                        .fetch_optional(&self.pool)
                        .await?;
                match found {
                    Some((id,)) => Some(id),
                    None => return Ok(Page::new(vec![], page, limit, 0)),
                }
            }
            None => None,
        };

        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM projects p WHERE p.deleted_at IS NULL");
        push_project_filters(&mut count_builder, category_id, filter.search.as_deref());
        let total_count: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("{PROJECT_SELECT} WHERE p.deleted_at IS NULL"));
        push_project_filters(&mut builder, category_id, filter.search.as_deref());
        builder.push(" ORDER BY p.created_at DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows: Vec<ProjectRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let items = self.project_responses(rows, None).await?;
        Ok(Page::new(items, page, limit, total_count))
    }

    async fn get_project(
        &self,
        id: i64,
        viewer: Option<i64>,
    ) -> Result<Option<ProjectResponse>, ApiError> {
        // A successful read is a view.
        let counted = sqlx::query(
            "UPDATE projects SET views = views + 1 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if counted.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_project_response(id, viewer).await
    }

    async fn create_project(
        &self,
        owner_id: i64,
        req: CreateProjectRequest,
    ) -> Result<ProjectResponse, ApiError> {
        let category: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
            .bind(req.category_id)
            .fetch_optional(&self.pool)
            .await?;
        if category.is_none() {
            return Err(ApiError::Validation("unknown category".to_string()));
        }

        let cover_image = req.image_urls.first().cloned().unwrap_or_default();

        let mut tx = self.pool.begin().await?;
        let project_id: i64 = sqlx::query_scalar(
            "INSERT INTO projects (user_id, title, description, category_id, tags, cover_image, \
             views, likes_count, created_at, updated_at, deleted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 0, 0, NOW(), NOW(), NULL) RETURNING id",
        )
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.category_id)
        .bind(&req.tags)
        .bind(&cover_image)
        .fetch_one(&mut *tx)
        .await?;

        for (position, url) in req.image_urls.iter().enumerate() {
            sqlx::query(
                "INSERT INTO project_images (project_id, image_url, position) VALUES ($1, $2, $3)",
            )
            .bind(project_id)
            .bind(url)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.fetch_project_response(project_id, None)
            .await?
            .ok_or(ApiError::Internal)
    }

    async fn projects_for_owner(&self, owner_id: i64) -> Result<Vec<ProjectResponse>, ApiError> {
        let sql = format!(
            "{PROJECT_SELECT} WHERE p.user_id = $1 AND p.deleted_at IS NULL \
             ORDER BY p.created_at DESC"
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        self.project_responses(rows, None).await
    }

    async fn update_project_owned(
        &self,
        id: i64,
        owner_id: i64,
        req: UpdateProjectRequest,
    ) -> Result<Option<ProjectResponse>, ApiError> {
        let updated = sqlx::query(
            "UPDATE projects SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                tags = COALESCE($5, tags), \
                cover_image = COALESCE($6, cover_image), \
                updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner_id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.tags)
        .bind(req.cover_image)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_project_response(id, None).await
    }

    async fn soft_delete_project_owned(&self, id: i64, owner_id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, icon FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    // --- Interaction edges & counters ---

    async fn like_project(&self, user_id: i64, project_id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let live: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM projects WHERE id = $1 AND deleted_at IS NULL")
                .bind(project_id)
                .fetch_optional(&mut *tx)
                .await?;
        if live.is_none() {
            return Err(ApiError::NotFound);
        }

        let inserted = sqlx::query(
            "INSERT INTO likes (user_id, project_id, created_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(project_id)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(ApiError::Conflict("already liked".to_string()));
        }

        // Edge and counter commit or roll back together.
        sqlx::query("UPDATE projects SET likes_count = likes_count + 1 WHERE id = $1")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn unlike_project(&self, user_id: i64, project_id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND project_id = $2")
            .bind(user_id)
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        if removed.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }

        // Floored at zero so historical drift can only heal, never grow.
        sqlx::query("UPDATE projects SET likes_count = GREATEST(likes_count - 1, 0) WHERE id = $1")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn likes_for_project(&self, project_id: i64) -> Result<Vec<LikeResponse>, ApiError> {
        let rows = sqlx::query_as::<_, LikeRow>(
            "SELECT l.id, l.created_at, u.id AS user_id, u.name AS user_name, \
                u.avatar_url AS user_avatar \
             FROM likes l JOIN users u ON l.user_id = u.id \
             WHERE l.project_id = $1 ORDER BY l.created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| LikeResponse {
                id: r.id,
                user: UserSummary {
                    id: r.user_id,
                    name: r.user_name,
                    avatar_url: r.user_avatar,
                },
                created_at: r.created_at,
            })
            .collect())
    }

    async fn add_comment(
        &self,
        user_id: i64,
        project_id: i64,
        content: String,
    ) -> Result<CommentResponse, ApiError> {
        let live: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM projects WHERE id = $1 AND deleted_at IS NULL")
                .bind(project_id)
                .fetch_optional(&self.pool)
                .await?;
        if live.is_none() {
            return Err(ApiError::NotFound);
        }

        // Insert and author join in one round trip.
        let row = sqlx::query_as::<_, CommentRow>(
            "WITH inserted AS ( \
                INSERT INTO comments (project_id, user_id, content, created_at) \
                VALUES ($1, $2, $3, NOW()) \
                RETURNING id, user_id, content, created_at \
             ) \
             SELECT i.id, i.content, i.created_at, u.id AS user_id, \
                u.name AS user_name, u.avatar_url AS user_avatar \
             FROM inserted i JOIN users u ON i.user_id = u.id",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(&content)
        .fetch_one(&self.pool)
        .await?;
        Ok(CommentResponse {
            id: row.id,
            user: UserSummary {
                id: row.user_id,
                name: row.user_name,
                avatar_url: row.user_avatar,
            },
            content: row.content,
            created_at: row.created_at,
        })
    }

    async fn comments_for_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<CommentResponse>, ApiError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT c.id, c.content, c.created_at, u.id AS user_id, \
                u.name AS user_name, u.avatar_url AS user_avatar \
             FROM comments c JOIN users u ON c.user_id = u.id \
             WHERE c.project_id = $1 ORDER BY c.created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| CommentResponse {
                id: r.id,
                user: UserSummary {
                    id: r.user_id,
                    name: r.user_name,
                    avatar_url: r.user_avatar,
                },
                content: r.content,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn delete_comment_owned(&self, id: i64, user_id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_comment_admin(&self, id: i64) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn follow_user(&self, follower_id: i64, following_id: i64) -> Result<(), ApiError> {
        let target: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(following_id)
            .fetch_optional(&self.pool)
            .await?;
        if target.is_none() {
            return Err(ApiError::NotFound);
        }

        let inserted = sqlx::query(
            "INSERT INTO follows (follower_id, following_id, created_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(&self.pool)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(ApiError::Conflict("already following".to_string()));
        }
        Ok(())
    }

    async fn unfollow_user(&self, follower_id: i64, following_id: i64) -> Result<(), ApiError> {
        let removed =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
                .bind(follower_id)
                .bind(following_id)
                .execute(&self.pool)
                .await?;
        if removed.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn followers_of(&self, user_id: i64) -> Result<Vec<UserSummary>, ApiError> {
        Ok(sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.name, u.avatar_url FROM follows f \
             JOIN users u ON f.follower_id = u.id \
             WHERE f.following_id = $1 ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn following_of(&self, user_id: i64) -> Result<Vec<UserSummary>, ApiError> {
        Ok(sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.name, u.avatar_url FROM follows f \
             JOIN users u ON f.following_id = u.id \
             WHERE f.follower_id = $1 ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // --- Admin ---

    async fn get_stats(&self) -> Result<AdminDashboardStats, ApiError> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let total_companies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;
        let total_jobs: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        let total_projects: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        let total_applications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await?;
        let total_likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes")
            .fetch_one(&self.pool)
            .await?;
        Ok(AdminDashboardStats {
            total_users,
            total_companies,
            total_jobs,
            total_projects,
            total_applications,
            total_likes,
        })
    }
}

/// Response without the job/applicant embeds, for creates and status
/// updates where the caller already has the context.
fn plain_application_response(app: Application) -> ApplicationResponse {
    ApplicationResponse {
        id: app.id,
        job: None,
        applicant: None,
        resume_url: app.resume_url,
        cover_letter: app.cover_letter,
        status: app.status,
        created_at: app.created_at,
    }
}
