use talenthub::error::ApiError;
use talenthub::models::{
    ApplicationStatus, CreateCompanyRequest, CreateJobRequest, CreateProjectRequest, JobStatus,
    NewUser, PageParams, Role, UpdateJobRequest, UpdateProfileRequest, UpdateProjectRequest, User,
};
use talenthub::repository::{MemoryRepository, Repository};

async fn seed_user(repo: &MemoryRepository, name: &str, email: &str, role: Role) -> User {
    repo.create_user(NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: "phc-string".to_string(),
        role,
    })
    .await
    .unwrap()
}

async fn seed_company_job(repo: &MemoryRepository, owner: &User) -> i64 {
    let company = repo
        .create_company_for(
            owner.id,
            CreateCompanyRequest {
                name: "Acme".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let job = repo
        .create_job(
            owner.id,
            company.id,
            CreateJobRequest {
                title: "Engineer".to_string(),
                description: "Build things".to_string(),
                location: "Remote".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    job.id
}

async fn seed_project(repo: &MemoryRepository, owner: &User) -> i64 {
    let category = repo.list_categories().await.unwrap()[0].clone();
    repo.create_project(
        owner.id,
        CreateProjectRequest {
            title: "Series".to_string(),
            description: "Work".to_string(),
            category_id: category.id,
            tags: String::new(),
            image_urls: vec!["projects/x.png".to_string()],
        },
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn non_owner_and_missing_id_are_indistinguishable() {
    let repo = MemoryRepository::new();
    let owner = seed_user(&repo, "A", "a@x.com", Role::Company).await;
    let stranger = seed_user(&repo, "B", "b@x.com", Role::Company).await;
    let job_id = seed_company_job(&repo, &owner).await;

    let update = UpdateJobRequest {
        title: Some("X".to_string()),
        ..Default::default()
    };

    // Foreign record and absent record produce the same outcome on
    // every mutating entry point.
    let foreign = repo
        .update_job_owned(job_id, stranger.id, update.clone())
        .await
        .unwrap();
    let absent = repo
        .update_job_owned(999_999, stranger.id, update)
        .await
        .unwrap();
    assert!(foreign.is_none());
    assert!(absent.is_none());

    let foreign = repo
        .soft_delete_job_owned(job_id, stranger.id)
        .await
        .unwrap();
    let absent = repo.soft_delete_job_owned(999_999, stranger.id).await.unwrap();
    assert!(!foreign);
    assert!(!absent);

    let foreign = repo
        .applications_for_job_owned(job_id, stranger.id)
        .await
        .unwrap();
    let absent = repo
        .applications_for_job_owned(999_999, stranger.id)
        .await
        .unwrap();
    assert!(foreign.is_none());
    assert!(absent.is_none());
}

#[tokio::test]
async fn like_counter_tracks_edge_cardinality() {
    let repo = MemoryRepository::new();
    let owner = seed_user(&repo, "A", "a@x.com", Role::Creative).await;
    let fan_one = seed_user(&repo, "B", "b@x.com", Role::Creative).await;
    let fan_two = seed_user(&repo, "C", "c@x.com", Role::Creative).await;
    let project_id = seed_project(&repo, &owner).await;

    repo.like_project(fan_one.id, project_id).await.unwrap();
    repo.like_project(fan_two.id, project_id).await.unwrap();

    let project = repo.get_project(project_id, None).await.unwrap().unwrap();
    let edges = repo.likes_for_project(project_id).await.unwrap();
    assert_eq!(project.likes_count, 2);
    assert_eq!(edges.len() as i64, project.likes_count);

    repo.unlike_project(fan_one.id, project_id).await.unwrap();
    let project = repo.get_project(project_id, None).await.unwrap().unwrap();
    let edges = repo.likes_for_project(project_id).await.unwrap();
    assert_eq!(project.likes_count, 1);
    assert_eq!(edges.len() as i64, project.likes_count);

    // Removing an absent edge fails and leaves the counter alone.
    let err = repo.unlike_project(fan_one.id, project_id).await;
    assert!(matches!(err, Err(ApiError::NotFound)));
    let project = repo.get_project(project_id, None).await.unwrap().unwrap();
    assert_eq!(project.likes_count, 1);

    repo.unlike_project(fan_two.id, project_id).await.unwrap();
    let err = repo.unlike_project(fan_two.id, project_id).await;
    assert!(matches!(err, Err(ApiError::NotFound)));
    let project = repo.get_project(project_id, None).await.unwrap().unwrap();
    assert_eq!(project.likes_count, 0);
}

#[tokio::test]
async fn duplicate_edge_leaves_one_live_edge() {
    let repo = MemoryRepository::new();
    let owner = seed_user(&repo, "A", "a@x.com", Role::Creative).await;
    let fan = seed_user(&repo, "B", "b@x.com", Role::Creative).await;
    let project_id = seed_project(&repo, &owner).await;

    repo.like_project(fan.id, project_id).await.unwrap();
    let second = repo.like_project(fan.id, project_id).await;
    assert!(matches!(second, Err(ApiError::Conflict(_))));

    let edges = repo.likes_for_project(project_id).await.unwrap();
    assert_eq!(edges.len(), 1);
    let project = repo.get_project(project_id, None).await.unwrap().unwrap();
    assert_eq!(project.likes_count, 1);
}

#[tokio::test]
async fn partial_updates_only_touch_submitted_fields() {
    let repo = MemoryRepository::new();
    let user = seed_user(&repo, "A", "a@x.com", Role::Creative).await;

    repo.update_profile(
        user.id,
        UpdateProfileRequest {
            bio: Some("painter".to_string()),
            location: Some("Lisbon".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    // Explicit empty string clears; omitted fields stay put.
    let updated = repo
        .update_profile(
            user.id,
            UpdateProfileRequest {
                bio: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.bio, "");
    assert_eq!(updated.location, "Lisbon");
    assert_eq!(updated.name, "A");

    let project_id = seed_project(&repo, &user).await;
    let updated = repo
        .update_project_owned(
            project_id,
            user.id,
            UpdateProjectRequest {
                title: Some("New Title".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "New Title");
    assert_eq!(updated.description, "Work");
}

#[tokio::test]
async fn soft_deleted_items_vanish_from_every_default_query() {
    let repo = MemoryRepository::new();
    let owner = seed_user(&repo, "A", "a@x.com", Role::Creative).await;
    let project_id = seed_project(&repo, &owner).await;

    assert!(repo
        .soft_delete_project_owned(project_id, owner.id)
        .await
        .unwrap());

    assert!(repo.get_project(project_id, None).await.unwrap().is_none());
    assert!(repo.projects_for_owner(owner.id).await.unwrap().is_empty());
    let listing = repo
        .list_projects(Default::default())
        .await
        .unwrap();
    assert_eq!(listing.total_count, 0);

    // Deleting the tombstone again reports nothing to delete.
    assert!(!repo
        .soft_delete_project_owned(project_id, owner.id)
        .await
        .unwrap());
}

#[tokio::test]
async fn company_linkage_is_set_at_most_once() {
    let repo = MemoryRepository::new();
    let owner = seed_user(&repo, "A", "a@x.com", Role::Company).await;

    repo.create_company_for(
        owner.id,
        CreateCompanyRequest {
            name: "First".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let second = repo
        .create_company_for(
            owner.id,
            CreateCompanyRequest {
                name: "Second".to_string(),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(second, Err(ApiError::Conflict(_))));

    let company = repo.company_for_user(owner.id).await.unwrap().unwrap();
    assert_eq!(company.name, "First");
}

#[tokio::test]
async fn applications_only_land_on_active_jobs() {
    let repo = MemoryRepository::new();
    let owner = seed_user(&repo, "A", "a@x.com", Role::Company).await;
    let seeker = seed_user(&repo, "B", "b@x.com", Role::Creative).await;
    let job_id = seed_company_job(&repo, &owner).await;

    repo.set_job_status(job_id, JobStatus::Closed).await.unwrap();
    let closed = repo
        .create_application(seeker.id, "resumes/b.pdf", job_id, String::new())
        .await;
    assert!(matches!(closed, Err(ApiError::NotFound)));

    repo.set_job_status(job_id, JobStatus::Active).await.unwrap();
    repo.create_application(seeker.id, "resumes/b.pdf", job_id, "hello".to_string())
        .await
        .unwrap();

    let dup = repo
        .create_application(seeker.id, "resumes/b.pdf", job_id, String::new())
        .await;
    assert!(matches!(dup, Err(ApiError::Conflict(_))));

    // Status moves only through the job's poster.
    let stranger = seed_user(&repo, "C", "c@x.com", Role::Company).await;
    let apps = repo
        .applications_for_job_owned(job_id, owner.id)
        .await
        .unwrap()
        .unwrap();
    let app_id = apps[0].id;

    let denied = repo
        .set_application_status_owned(app_id, stranger.id, ApplicationStatus::Accepted)
        .await
        .unwrap();
    assert!(denied.is_none());

    let accepted = repo
        .set_application_status_owned(app_id, owner.id, ApplicationStatus::Accepted)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(accepted.status, ApplicationStatus::Accepted);
}

#[tokio::test]
async fn cascading_user_delete_protects_counters_and_items() {
    let repo = MemoryRepository::new();
    let creative = seed_user(&repo, "A", "a@x.com", Role::Creative).await;
    let fan = seed_user(&repo, "B", "b@x.com", Role::Creative).await;
    let project_id = seed_project(&repo, &creative).await;

    repo.like_project(fan.id, project_id).await.unwrap();
    repo.follow_user(fan.id, creative.id).await.unwrap();

    // Removing the fan takes their like (and its count) and follow along.
    assert!(repo.delete_user_cascading(fan.id).await.unwrap());
    let project = repo.get_project(project_id, None).await.unwrap().unwrap();
    assert_eq!(project.likes_count, 0);
    assert!(repo.likes_for_project(project_id).await.unwrap().is_empty());
    assert!(repo.followers_of(creative.id).await.unwrap().is_empty());

    // Removing the creative tombstones their portfolio.
    assert!(repo.delete_user_cascading(creative.id).await.unwrap());
    assert!(repo.get_project(project_id, None).await.unwrap().is_none());

    // A second delete finds nothing.
    assert!(!repo.delete_user_cascading(creative.id).await.unwrap());
}

#[tokio::test]
async fn stats_reflect_live_rows_only() {
    let repo = MemoryRepository::new();
    let owner = seed_user(&repo, "A", "a@x.com", Role::Company).await;
    let creative = seed_user(&repo, "B", "b@x.com", Role::Creative).await;
    let job_id = seed_company_job(&repo, &owner).await;
    let project_id = seed_project(&repo, &creative).await;

    let stats = repo.get_stats().await.unwrap();
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_companies, 1);
    assert_eq!(stats.total_jobs, 1);
    assert_eq!(stats.total_projects, 1);

    repo.soft_delete_job_owned(job_id, owner.id).await.unwrap();
    repo.soft_delete_project_owned(project_id, creative.id)
        .await
        .unwrap();

    let stats = repo.get_stats().await.unwrap();
    assert_eq!(stats.total_jobs, 0);
    assert_eq!(stats.total_projects, 0);
}

#[tokio::test]
async fn listing_pagination_and_facets() {
    let repo = MemoryRepository::new();
    let owner = seed_user(&repo, "A", "a@x.com", Role::Company).await;
    let company = repo
        .create_company_for(
            owner.id,
            CreateCompanyRequest {
                name: "Acme".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    for i in 0..25 {
        repo.create_job(
            owner.id,
            company.id,
            CreateJobRequest {
                title: format!("Role {i}"),
                description: "d".to_string(),
                job_type: if i % 2 == 0 { "remote" } else { "onsite" }.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let page = repo
        .list_jobs(talenthub::models::JobFilter {
            page: Some(2),
            limit: Some(10),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total_count, 25);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items.len(), 10);

    let remote = repo
        .list_jobs(talenthub::models::JobFilter {
            job_type: Some("remote".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(remote.total_count, 13);

    let admin_page = repo.list_users(PageParams::default()).await.unwrap();
    assert_eq!(admin_page.total_count, 1);
}
