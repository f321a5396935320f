use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::ApiError;
use crate::models::{
    AdminDashboardStats, Application, ApplicationResponse, ApplicationStatus, ApplicantProfile,
    Category, Comment, Company, CompanyResponse, CommentResponse, CreateCompanyRequest,
    CreateJobRequest, CreateProjectRequest, Follow, Job, JobFilter, JobResponse, JobStatus, Like,
    LikeResponse, NewUser, Page, PageParams, Project, ProjectFilter, ProjectImage,
    ProjectImageResponse, ProjectResponse, UpdateCompanyRequest, UpdateJobRequest,
    UpdateProfileRequest, UpdateProjectRequest, User, UserResponse, UserSummary,
};

use super::Repository;

/// MemoryRepository
///
/// An in-process implementation of the full `Repository` contract, used
/// by the test suite in place of Postgres. Semantics mirror the SQL
/// implementation: ownership predicates inside every lookup, soft-delete
/// filtering, unique-pair edges, and counters moved in the same critical
/// section as their edges (the single mutex stands in for a transaction).
pub struct MemoryRepository {
    state: Mutex<MemState>,
}

#[derive(Default)]
struct MemState {
    next_id: i64,
    users: BTreeMap<i64, User>,
    companies: BTreeMap<i64, Company>,
    jobs: BTreeMap<i64, Job>,
    projects: BTreeMap<i64, Project>,
    project_images: Vec<ProjectImage>,
    categories: Vec<Category>,
    applications: BTreeMap<i64, Application>,
    comments: BTreeMap<i64, Comment>,
    likes: Vec<Like>,
    follows: Vec<Follow>,
}

impl MemState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Fresh store with the reference categories preloaded, matching
    /// what migrations seed for Postgres.
    pub fn new() -> Self {
        let mut state = MemState::default();
        for (name, slug, icon) in [
            ("Branding", "branding", "tag"),
            ("Illustration", "illustration", "pen"),
            ("Motion", "motion", "film"),
            ("Photography", "photography", "camera"),
            ("UI/UX", "ui-ux", "layout"),
            ("Web Design", "web-design", "globe"),
        ] {
            let id = state.next_id();
            state.categories.push(Category {
                id,
                name: name.to_string(),
                slug: slug.to_string(),
                icon: icon.to_string(),
            });
        }
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemState> {
        self.state.lock().expect("repository state mutex poisoned")
    }
}

fn paginate<T>(mut items: Vec<T>, params: PageParams) -> Page<T> {
    let (page, limit, offset) = params.normalize();
    let total_count = items.len() as i64;
    let items = if offset >= total_count {
        Vec::new()
    } else {
        items
            .drain(offset as usize..items.len().min((offset + limit) as usize))
            .collect()
    };
    Page::new(items, page, limit, total_count)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn user_summary(state: &MemState, id: i64) -> Option<UserSummary> {
    state.users.get(&id).map(UserSummary::from)
}

fn job_response(state: &MemState, job: &Job) -> JobResponse {
    let company = state
        .companies
        .get(&job.company_id)
        .cloned()
        .map(CompanyResponse::from)
        .unwrap_or_default();
    JobResponse::from_parts(job.clone(), company)
}

fn project_response(state: &MemState, project: &Project, viewer: Option<i64>) -> ProjectResponse {
    let images: Vec<ProjectImageResponse> = state
        .project_images
        .iter()
        .filter(|img| img.project_id == project.id)
        .map(ProjectImageResponse::from)
        .collect();
    let is_liked = viewer.is_some_and(|v| {
        state
            .likes
            .iter()
            .any(|l| l.user_id == v && l.project_id == project.id)
    });
    ProjectResponse {
        id: project.id,
        title: project.title.clone(),
        description: project.description.clone(),
        cover_image: project.cover_image.clone(),
        images,
        user: user_summary(state, project.user_id).unwrap_or_default(),
        category: state
            .categories
            .iter()
            .find(|c| c.id == project.category_id)
            .cloned()
            .unwrap_or_default(),
        tags: project.tags.clone(),
        views: project.views,
        likes_count: project.likes_count,
        is_liked,
        created_at: project.created_at,
    }
}

fn application_with_job(state: &MemState, app: &Application) -> ApplicationResponse {
    let job = state.jobs.get(&app.job_id).map(|j| job_response(state, j));
    ApplicationResponse {
        id: app.id,
        job,
        applicant: None,
        resume_url: app.resume_url.clone(),
        cover_letter: app.cover_letter.clone(),
        status: app.status,
        created_at: app.created_at,
    }
}

fn plain_application(app: &Application) -> ApplicationResponse {
    ApplicationResponse {
        id: app.id,
        job: None,
        applicant: None,
        resume_url: app.resume_url.clone(),
        cover_letter: app.cover_letter.clone(),
        status: app.status,
        created_at: app.created_at,
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    // --- Accounts ---

    async fn create_user(&self, new: NewUser) -> Result<User, ApiError> {
        let mut s = self.lock();
        if s.users.values().any(|u| u.email == new.email) {
            return Err(ApiError::Conflict("email already registered".to_string()));
        }
        let now = Utc::now();
        let id = s.next_id();
        let user = User {
            id,
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            phone: String::new(),
            location: String::new(),
            bio: String::new(),
            skills: String::new(),
            website: String::new(),
            avatar_url: String::new(),
            resume_url: String::new(),
            for_hire: false,
            verified: true,
            company_id: None,
            created_at: now,
            updated_at: now,
        };
        s.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, ApiError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_user_with_company(
        &self,
        id: i64,
    ) -> Result<Option<(User, Option<Company>)>, ApiError> {
        let s = self.lock();
        Ok(s.users.get(&id).map(|user| {
            let company = user
                .company_id
                .and_then(|cid| s.companies.get(&cid).cloned());
            (user.clone(), company)
        }))
    }

    async fn update_profile(
        &self,
        id: i64,
        req: UpdateProfileRequest,
    ) -> Result<Option<User>, ApiError> {
        let mut s = self.lock();
        let Some(user) = s.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = req.name {
            user.name = v;
        }
        if let Some(v) = req.phone {
            user.phone = v;
        }
        if let Some(v) = req.location {
            user.location = v;
        }
        if let Some(v) = req.bio {
            user.bio = v;
        }
        if let Some(v) = req.skills {
            user.skills = v;
        }
        if let Some(v) = req.website {
            user.website = v;
        }
        if let Some(v) = req.for_hire {
            user.for_hire = v;
        }
        if let Some(v) = req.avatar_url {
            user.avatar_url = v;
        }
        if let Some(v) = req.resume_url {
            user.resume_url = v;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn list_users(&self, params: PageParams) -> Result<Page<UserResponse>, ApiError> {
        let s = self.lock();
        let mut users: Vec<&User> = s.users.values().collect();
        users.sort_by_key(|u| std::cmp::Reverse(u.id));
        let items: Vec<UserResponse> = users
            .into_iter()
            .map(|u| UserResponse::from_parts(u.clone(), None))
            .collect();
        Ok(paginate(items, params))
    }

    async fn delete_user_cascading(&self, id: i64) -> Result<bool, ApiError> {
        let mut s = self.lock();
        if !s.users.contains_key(&id) {
            return Ok(false);
        }
        let now = Utc::now();

        // Hand back this account's likes before dropping the edges.
        let liked: Vec<i64> = s
            .likes
            .iter()
            .filter(|l| l.user_id == id)
            .map(|l| l.project_id)
            .collect();
        for project_id in liked {
            if let Some(project) = s.projects.get_mut(&project_id) {
                project.likes_count = (project.likes_count - 1).max(0);
            }
        }
        s.likes.retain(|l| l.user_id != id);
        s.follows
            .retain(|f| f.follower_id != id && f.following_id != id);
        s.comments.retain(|_, c| c.user_id != id);
        s.applications.retain(|_, a| a.user_id != id);

        for job in s.jobs.values_mut().filter(|j| j.posted_by == id) {
            if job.deleted_at.is_none() {
                job.deleted_at = Some(now);
                job.updated_at = now;
            }
        }
        for project in s.projects.values_mut().filter(|p| p.user_id == id) {
            if project.deleted_at.is_none() {
                project.deleted_at = Some(now);
                project.updated_at = now;
            }
        }

        s.users.remove(&id);
        Ok(true)
    }

    // --- Companies ---

    async fn create_company_for(
        &self,
        owner_id: i64,
        req: CreateCompanyRequest,
    ) -> Result<Company, ApiError> {
        let mut s = self.lock();
        let already_linked = s
            .users
            .get(&owner_id)
            .map(|u| u.company_id.is_some())
            .unwrap_or(true);
        if already_linked {
            return Err(ApiError::Conflict(
                "company profile already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let id = s.next_id();
        let company = Company {
            id,
            name: req.name,
            description: req.description,
            website: req.website,
            location: req.location,
            logo_url: String::new(),
            industry: req.industry,
            size: req.size,
            created_at: now,
            updated_at: now,
        };
        s.companies.insert(id, company.clone());
        if let Some(user) = s.users.get_mut(&owner_id) {
            user.company_id = Some(id);
            user.updated_at = now;
        }
        Ok(company)
    }

    async fn company_for_user(&self, user_id: i64) -> Result<Option<Company>, ApiError> {
        let s = self.lock();
        Ok(s.users
            .get(&user_id)
            .and_then(|u| u.company_id)
            .and_then(|cid| s.companies.get(&cid).cloned()))
    }

    async fn update_company_for(
        &self,
        user_id: i64,
        req: UpdateCompanyRequest,
    ) -> Result<Option<Company>, ApiError> {
        let mut s = self.lock();
        let Some(company_id) = s.users.get(&user_id).and_then(|u| u.company_id) else {
            return Ok(None);
        };
        let Some(company) = s.companies.get_mut(&company_id) else {
            return Ok(None);
        };
        if let Some(v) = req.name {
            company.name = v;
        }
        if let Some(v) = req.description {
            company.description = v;
        }
        if let Some(v) = req.website {
            company.website = v;
        }
        if let Some(v) = req.location {
            company.location = v;
        }
        if let Some(v) = req.logo_url {
            company.logo_url = v;
        }
        if let Some(v) = req.industry {
            company.industry = v;
        }
        if let Some(v) = req.size {
            company.size = v;
        }
        company.updated_at = Utc::now();
        Ok(Some(company.clone()))
    }

    // --- Jobs ---

    async fn list_jobs(&self, filter: JobFilter) -> Result<Page<JobResponse>, ApiError> {
        let s = self.lock();
        let mut jobs: Vec<&Job> = s
            .jobs
            .values()
            .filter(|j| j.deleted_at.is_none() && j.status == JobStatus::Active)
            .filter(|j| match filter.search.as_ref().filter(|v| !v.is_empty()) {
                Some(q) => contains_ci(&j.title, q) || contains_ci(&j.description, q),
                None => true,
            })
            .filter(|j| match filter.job_type.as_ref().filter(|v| !v.is_empty()) {
                Some(t) => &j.job_type == t,
                None => true,
            })
            .filter(|j| match filter.location.as_ref().filter(|v| !v.is_empty()) {
                Some(loc) => contains_ci(&j.location, loc),
                None => true,
            })
            .collect();
        jobs.sort_by_key(|j| std::cmp::Reverse(j.id));
        let items: Vec<JobResponse> = jobs.into_iter().map(|j| job_response(&s, j)).collect();
        Ok(paginate(items, filter.page_params()))
    }

    async fn get_job(&self, id: i64) -> Result<Option<JobResponse>, ApiError> {
        let s = self.lock();
        Ok(s.jobs
            .get(&id)
            .filter(|j| j.deleted_at.is_none())
            .map(|j| job_response(&s, j)))
    }

    async fn create_job(
        &self,
        owner_id: i64,
        company_id: i64,
        req: CreateJobRequest,
    ) -> Result<JobResponse, ApiError> {
        let mut s = self.lock();
        let now = Utc::now();
        let id = s.next_id();
        let job = Job {
            id,
            title: req.title,
            description: req.description,
            company_id,
            location: req.location,
            job_type: req.job_type,
            salary: req.salary,
            experience: req.experience,
            skills: req.skills,
            status: JobStatus::Active,
            posted_by: owner_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        s.jobs.insert(id, job.clone());
        Ok(job_response(&s, &job))
    }

    async fn jobs_for_owner(&self, owner_id: i64) -> Result<Vec<JobResponse>, ApiError> {
        let s = self.lock();
        let mut jobs: Vec<&Job> = s
            .jobs
            .values()
            .filter(|j| j.posted_by == owner_id && j.deleted_at.is_none())
            .collect();
        jobs.sort_by_key(|j| std::cmp::Reverse(j.id));
        Ok(jobs.into_iter().map(|j| job_response(&s, j)).collect())
    }

    async fn update_job_owned(
        &self,
        id: i64,
        owner_id: i64,
        req: UpdateJobRequest,
    ) -> Result<Option<JobResponse>, ApiError> {
        let mut s = self.lock();
        let Some(job) = s
            .jobs
            .get_mut(&id)
            .filter(|j| j.posted_by == owner_id && j.deleted_at.is_none())
        else {
            return Ok(None);
        };
        if let Some(v) = req.title {
            job.title = v;
        }
        if let Some(v) = req.description {
            job.description = v;
        }
        if let Some(v) = req.location {
            job.location = v;
        }
        if let Some(v) = req.job_type {
            job.job_type = v;
        }
        if let Some(v) = req.salary {
            job.salary = v;
        }
        if let Some(v) = req.experience {
            job.experience = v;
        }
        if let Some(v) = req.skills {
            job.skills = v;
        }
        if let Some(v) = req.status {
            job.status = v;
        }
        job.updated_at = Utc::now();
        let job = job.clone();
        Ok(Some(job_response(&s, &job)))
    }

    async fn soft_delete_job_owned(&self, id: i64, owner_id: i64) -> Result<bool, ApiError> {
        let mut s = self.lock();
        let Some(job) = s
            .jobs
            .get_mut(&id)
            .filter(|j| j.posted_by == owner_id && j.deleted_at.is_none())
        else {
            return Ok(false);
        };
        let now = Utc::now();
        job.deleted_at = Some(now);
        job.updated_at = now;
        Ok(true)
    }

    async fn list_all_jobs(&self, params: PageParams) -> Result<Page<JobResponse>, ApiError> {
        let s = self.lock();
        let mut jobs: Vec<&Job> = s.jobs.values().filter(|j| j.deleted_at.is_none()).collect();
        jobs.sort_by_key(|j| std::cmp::Reverse(j.id));
        let items: Vec<JobResponse> = jobs.into_iter().map(|j| job_response(&s, j)).collect();
        Ok(paginate(items, params))
    }

    async fn set_job_status(
        &self,
        id: i64,
        status: JobStatus,
    ) -> Result<Option<JobResponse>, ApiError> {
        let mut s = self.lock();
        let Some(job) = s.jobs.get_mut(&id).filter(|j| j.deleted_at.is_none()) else {
            return Ok(None);
        };
        job.status = status;
        job.updated_at = Utc::now();
        let job = job.clone();
        Ok(Some(job_response(&s, &job)))
    }

    // --- Applications ---

    async fn create_application(
        &self,
        user_id: i64,
        resume_url: &str,
        job_id: i64,
        cover_letter: String,
    ) -> Result<ApplicationResponse, ApiError> {
        let mut s = self.lock();
        let open = s
            .jobs
            .get(&job_id)
            .is_some_and(|j| j.deleted_at.is_none() && j.status == JobStatus::Active);
        if !open {
            return Err(ApiError::NotFound);
        }
        if s.applications
            .values()
            .any(|a| a.job_id == job_id && a.user_id == user_id)
        {
            return Err(ApiError::Conflict(
                "already applied for this job".to_string(),
            ));
        }
        let now = Utc::now();
        let id = s.next_id();
        let app = Application {
            id,
            job_id,
            user_id,
            resume_url: resume_url.to_string(),
            cover_letter,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        s.applications.insert(id, app.clone());
        Ok(plain_application(&app))
    }

    async fn applications_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<ApplicationResponse>, ApiError> {
        let s = self.lock();
        let mut apps: Vec<&Application> = s
            .applications
            .values()
            .filter(|a| a.user_id == user_id)
            .collect();
        apps.sort_by_key(|a| std::cmp::Reverse(a.id));
        Ok(apps
            .into_iter()
            .map(|a| application_with_job(&s, a))
            .collect())
    }

    async fn applications_for_job_owned(
        &self,
        job_id: i64,
        owner_id: i64,
    ) -> Result<Option<Vec<ApplicationResponse>>, ApiError> {
        let s = self.lock();
        let owned = s
            .jobs
            .get(&job_id)
            .is_some_and(|j| j.posted_by == owner_id && j.deleted_at.is_none());
        if !owned {
            return Ok(None);
        }
        let mut apps: Vec<&Application> = s
            .applications
            .values()
            .filter(|a| a.job_id == job_id)
            .collect();
        apps.sort_by_key(|a| std::cmp::Reverse(a.id));
        Ok(Some(
            apps.into_iter()
                .map(|a| ApplicationResponse {
                    id: a.id,
                    job: None,
                    applicant: s.users.get(&a.user_id).map(ApplicantProfile::from),
                    resume_url: a.resume_url.clone(),
                    cover_letter: a.cover_letter.clone(),
                    status: a.status,
                    created_at: a.created_at,
                })
                .collect(),
        ))
    }

    async fn set_application_status_owned(
        &self,
        app_id: i64,
        owner_id: i64,
        status: ApplicationStatus,
    ) -> Result<Option<ApplicationResponse>, ApiError> {
        let mut s = self.lock();
        let Some(job_id) = s.applications.get(&app_id).map(|a| a.job_id) else {
            return Ok(None);
        };
        let owned = s
            .jobs
            .get(&job_id)
            .is_some_and(|j| j.posted_by == owner_id && j.deleted_at.is_none());
        if !owned {
            return Ok(None);
        }
        let Some(app) = s.applications.get_mut(&app_id) else {
            return Ok(None);
        };
        app.status = status;
        app.updated_at = Utc::now();
        Ok(Some(plain_application(app)))
    }

    async fn list_all_applications(
        &self,
        params: PageParams,
    ) -> Result<Page<ApplicationResponse>, ApiError> {
        let s = self.lock();
        let mut apps: Vec<&Application> = s.applications.values().collect();
        apps.sort_by_key(|a| std::cmp::Reverse(a.id));
        let items: Vec<ApplicationResponse> = apps
            .into_iter()
            .map(|a| application_with_job(&s, a))
            .collect();
        Ok(paginate(items, params))
    }

    // --- Projects ---

    async fn list_projects(
        &self,
        filter: ProjectFilter,
    ) -> Result<Page<ProjectResponse>, ApiError> {
        let s = self.lock();
        let category_id = match filter.category.as_ref().filter(|v| !v.is_empty()) {
            Some(slug) => match s.categories.iter().find(|c| &c.slug == slug) {
                Some(cat) => Some(cat.id),
                None => {
                    return Ok(paginate(Vec::new(), filter.page_params()));
                }
            },
            None => None,
        };
        let mut projects: Vec<&Project> = s
            .projects
            .values()
            .filter(|p| p.deleted_at.is_none())
            .filter(|p| category_id.is_none_or(|cid| p.category_id == cid))
            .filter(|p| match filter.search.as_ref().filter(|v| !v.is_empty()) {
                Some(q) => {
                    contains_ci(&p.title, q)
                        || contains_ci(&p.description, q)
                        || contains_ci(&p.tags, q)
                }
                None => true,
            })
            .collect();
        projects.sort_by_key(|p| std::cmp::Reverse(p.id));
        let items: Vec<ProjectResponse> = projects
            .into_iter()
            .map(|p| project_response(&s, p, None))
            .collect();
        Ok(paginate(items, filter.page_params()))
    }

    async fn get_project(
        &self,
        id: i64,
        viewer: Option<i64>,
    ) -> Result<Option<ProjectResponse>, ApiError> {
        let mut s = self.lock();
        let Some(project) = s.projects.get_mut(&id).filter(|p| p.deleted_at.is_none()) else {
            return Ok(None);
        };
        project.views += 1;
        let project = project.clone();
        Ok(Some(project_response(&s, &project, viewer)))
    }

    async fn create_project(
        &self,
        owner_id: i64,
        req: CreateProjectRequest,
    ) -> Result<ProjectResponse, ApiError> {
        let mut s = self.lock();
        if !s.categories.iter().any(|c| c.id == req.category_id) {
            return Err(ApiError::Validation("unknown category".to_string()));
        }
        let now = Utc::now();
        let id = s.next_id();
        let project = Project {
            id,
            user_id: owner_id,
            title: req.title,
            description: req.description,
            category_id: req.category_id,
            tags: req.tags,
            cover_image: req.image_urls.first().cloned().unwrap_or_default(),
            views: 0,
            likes_count: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        s.projects.insert(id, project.clone());
        for (position, url) in req.image_urls.iter().enumerate() {
            let image_id = s.next_id();
            s.project_images.push(ProjectImage {
                id: image_id,
                project_id: id,
                image_url: url.clone(),
                position: position as i32,
            });
        }
        Ok(project_response(&s, &project, None))
    }

    async fn projects_for_owner(&self, owner_id: i64) -> Result<Vec<ProjectResponse>, ApiError> {
        let s = self.lock();
        let mut projects: Vec<&Project> = s
            .projects
            .values()
            .filter(|p| p.user_id == owner_id && p.deleted_at.is_none())
            .collect();
        projects.sort_by_key(|p| std::cmp::Reverse(p.id));
        Ok(projects
            .into_iter()
            .map(|p| project_response(&s, p, None))
            .collect())
    }

    async fn update_project_owned(
        &self,
        id: i64,
        owner_id: i64,
        req: UpdateProjectRequest,
    ) -> Result<Option<ProjectResponse>, ApiError> {
        let mut s = self.lock();
        let Some(project) = s
            .projects
            .get_mut(&id)
            .filter(|p| p.user_id == owner_id && p.deleted_at.is_none())
        else {
            return Ok(None);
        };
        if let Some(v) = req.title {
            project.title = v;
        }
        if let Some(v) = req.description {
            project.description = v;
        }
        if let Some(v) = req.tags {
            project.tags = v;
        }
        if let Some(v) = req.cover_image {
            project.cover_image = v;
        }
        project.updated_at = Utc::now();
        let project = project.clone();
        Ok(Some(project_response(&s, &project, None)))
    }

    async fn soft_delete_project_owned(&self, id: i64, owner_id: i64) -> Result<bool, ApiError> {
        let mut s = self.lock();
        let Some(project) = s
            .projects
            .get_mut(&id)
            .filter(|p| p.user_id == owner_id && p.deleted_at.is_none())
        else {
            return Ok(false);
        };
        let now = Utc::now();
        project.deleted_at = Some(now);
        project.updated_at = now;
        Ok(true)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let s = self.lock();
        let mut categories = s.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    // --- Interaction edges & counters ---

    async fn like_project(&self, user_id: i64, project_id: i64) -> Result<(), ApiError> {
        let mut s = self.lock();
        if !s
            .projects
            .get(&project_id)
            .is_some_and(|p| p.deleted_at.is_none())
        {
            return Err(ApiError::NotFound);
        }
        if s.likes
            .iter()
            .any(|l| l.user_id == user_id && l.project_id == project_id)
        {
            return Err(ApiError::Conflict("already liked".to_string()));
        }
        let id = s.next_id();
        s.likes.push(Like {
            id,
            user_id,
            project_id,
            created_at: Utc::now(),
        });
        if let Some(project) = s.projects.get_mut(&project_id) {
            project.likes_count += 1;
        }
        Ok(())
    }

    async fn unlike_project(&self, user_id: i64, project_id: i64) -> Result<(), ApiError> {
        let mut s = self.lock();
        let before = s.likes.len();
        s.likes
            .retain(|l| !(l.user_id == user_id && l.project_id == project_id));
        if s.likes.len() == before {
            return Err(ApiError::NotFound);
        }
        if let Some(project) = s.projects.get_mut(&project_id) {
            project.likes_count = (project.likes_count - 1).max(0);
        }
        Ok(())
    }

    async fn likes_for_project(&self, project_id: i64) -> Result<Vec<LikeResponse>, ApiError> {
        let s = self.lock();
        let mut likes: Vec<&Like> = s
            .likes
            .iter()
            .filter(|l| l.project_id == project_id)
            .collect();
        likes.sort_by_key(|l| std::cmp::Reverse(l.id));
        Ok(likes
            .into_iter()
            .filter_map(|l| {
                user_summary(&s, l.user_id).map(|user| LikeResponse {
                    id: l.id,
                    user,
                    created_at: l.created_at,
                })
            })
            .collect())
    }

    async fn add_comment(
        &self,
        user_id: i64,
        project_id: i64,
        content: String,
    ) -> Result<CommentResponse, ApiError> {
        let mut s = self.lock();
        if !s
            .projects
            .get(&project_id)
            .is_some_and(|p| p.deleted_at.is_none())
        {
            return Err(ApiError::NotFound);
        }
        let id = s.next_id();
        let comment = Comment {
            id,
            project_id,
            user_id,
            content,
            created_at: Utc::now(),
        };
        s.comments.insert(id, comment.clone());
        let user = user_summary(&s, user_id).ok_or(ApiError::Internal)?;
        Ok(CommentResponse {
            id: comment.id,
            user,
            content: comment.content,
            created_at: comment.created_at,
        })
    }

    async fn comments_for_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<CommentResponse>, ApiError> {
        let s = self.lock();
        let mut comments: Vec<&Comment> = s
            .comments
            .values()
            .filter(|c| c.project_id == project_id)
            .collect();
        comments.sort_by_key(|c| std::cmp::Reverse(c.id));
        Ok(comments
            .into_iter()
            .filter_map(|c| {
                user_summary(&s, c.user_id).map(|user| CommentResponse {
                    id: c.id,
                    user,
                    content: c.content.clone(),
                    created_at: c.created_at,
                })
            })
            .collect())
    }

    async fn delete_comment_owned(&self, id: i64, user_id: i64) -> Result<bool, ApiError> {
        let mut s = self.lock();
        let owned = s
            .comments
            .get(&id)
            .is_some_and(|c| c.user_id == user_id);
        if !owned {
            return Ok(false);
        }
        s.comments.remove(&id);
        Ok(true)
    }

    async fn delete_comment_admin(&self, id: i64) -> Result<bool, ApiError> {
        Ok(self.lock().comments.remove(&id).is_some())
    }

    async fn follow_user(&self, follower_id: i64, following_id: i64) -> Result<(), ApiError> {
        let mut s = self.lock();
        if !s.users.contains_key(&following_id) {
            return Err(ApiError::NotFound);
        }
        if s.follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id)
        {
            return Err(ApiError::Conflict("already following".to_string()));
        }
        let id = s.next_id();
        s.follows.push(Follow {
            id,
            follower_id,
            following_id,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn unfollow_user(&self, follower_id: i64, following_id: i64) -> Result<(), ApiError> {
        let mut s = self.lock();
        let before = s.follows.len();
        s.follows
            .retain(|f| !(f.follower_id == follower_id && f.following_id == following_id));
        if s.follows.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn followers_of(&self, user_id: i64) -> Result<Vec<UserSummary>, ApiError> {
        let s = self.lock();
        let mut edges: Vec<&Follow> = s
            .follows
            .iter()
            .filter(|f| f.following_id == user_id)
            .collect();
        edges.sort_by_key(|f| std::cmp::Reverse(f.id));
        Ok(edges
            .into_iter()
            .filter_map(|f| user_summary(&s, f.follower_id))
            .collect())
    }

    async fn following_of(&self, user_id: i64) -> Result<Vec<UserSummary>, ApiError> {
        let s = self.lock();
        let mut edges: Vec<&Follow> = s
            .follows
            .iter()
            .filter(|f| f.follower_id == user_id)
            .collect();
        edges.sort_by_key(|f| std::cmp::Reverse(f.id));
        Ok(edges
            .into_iter()
            .filter_map(|f| user_summary(&s, f.following_id))
            .collect())
    }

    // --- Admin ---

    async fn get_stats(&self) -> Result<AdminDashboardStats, ApiError> {
        let s = self.lock();
        Ok(AdminDashboardStats {
            total_users: s.users.len() as i64,
            total_companies: s.companies.len() as i64,
            total_jobs: s.jobs.values().filter(|j| j.deleted_at.is_none()).count() as i64,
            total_projects: s
                .projects
                .values()
                .filter(|p| p.deleted_at.is_none())
                .count() as i64,
            total_applications: s.applications.len() as i64,
            total_likes: s.likes.len() as i64,
        })
    }
}
