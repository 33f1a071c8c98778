//! Tests for the Postgres link store
//!
//! These need a live test database (TEST_DATABASE_URL) with the migrations applied,
//! so they are ignored by default. Run with `cargo test -- --ignored`.

use data_model_jse::models::{JobType, NewJobDescription};
use data_model_jse::test_helpers::{clean_test_db, create_test_job_link, test_db_pool};
use data_model_jse::{LinkStore, PgLinkStore, Site, StoreError};
use tokio::sync::Mutex;

static TEST_MUTEX: Mutex<()> = Mutex::const_new(());

#[tokio::test]
#[ignore]
async fn test_unprocessed_jobs_are_filtered_by_site_and_flag() {
    let _guard = TEST_MUTEX.lock().await;
    let pool = test_db_pool().await;
    clean_test_db(&pool).await;
    let store = PgLinkStore::new(pool.clone());

    let linkedin = create_test_job_link(&pool, Site::LinkedIn, "Engineer", "https://www.linkedin.com/jobs/view/1").await;
    let done = create_test_job_link(&pool, Site::LinkedIn, "Engineer", "https://www.linkedin.com/jobs/view/2").await;
    create_test_job_link(&pool, Site::Xing, "Engineer", "https://www.xing.com/jobs/3").await;

    store.mark_processed(&done.id).await.unwrap();

    let pending = store.list_unprocessed_jobs(Site::LinkedIn).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, linkedin.id);

    let all = store.list_jobs(Site::LinkedIn).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_description_insert_is_a_no_op() {
    let _guard = TEST_MUTEX.lock().await;
    let pool = test_db_pool().await;
    clean_test_db(&pool).await;
    let store = PgLinkStore::new(pool.clone());

    let job = create_test_job_link(&pool, Site::LinkedIn, "Engineer", "https://www.linkedin.com/jobs/view/123").await;
    let skills = vec!["Go".to_string(), "SQL".to_string()];
    let description = NewJobDescription::new(Site::LinkedIn, &job, "Great role", JobType::Remote, &skills);

    assert!(store.insert_description(&description).await.unwrap());
    assert!(!store.insert_description(&description).await.unwrap());

    let stored = store.list_descriptions(Site::LinkedIn).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].job_type, JobType::Remote);
    assert_eq!(stored[0].skills_list(), skills);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_application_link_insert_is_a_no_op() {
    let _guard = TEST_MUTEX.lock().await;
    let pool = test_db_pool().await;
    clean_test_db(&pool).await;
    let store = PgLinkStore::new(pool.clone());

    let job = create_test_job_link(&pool, Site::Xing, "Analyst", "https://www.xing.com/jobs/berlin-analyst-9").await;
    let url = "https://careers.example.com/apply?source=xing";

    assert!(store.insert_application_link(Site::Xing, &job.id, url).await.unwrap());
    assert!(!store.insert_application_link(Site::Xing, &job.id, url).await.unwrap());
    assert_eq!(store.list_application_links(Site::Xing).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_failed_jobs_are_recorded() {
    let _guard = TEST_MUTEX.lock().await;
    let pool = test_db_pool().await;
    clean_test_db(&pool).await;
    let store = PgLinkStore::new(pool.clone());

    let job = create_test_job_link(&pool, Site::LinkedIn, "Engineer", "https://www.linkedin.com/jobs/view/5").await;
    store
        .insert_failed_job(Site::LinkedIn, &job.id, &job.link, "timeout")
        .await
        .unwrap();

    let failed = store.list_failed_jobs(Site::LinkedIn).await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].reason, "timeout");
}

#[tokio::test]
#[ignore]
async fn test_mark_processed_unknown_job() {
    let _guard = TEST_MUTEX.lock().await;
    let pool = test_db_pool().await;
    clean_test_db(&pool).await;
    let store = PgLinkStore::new(pool);

    assert!(matches!(
        store.mark_processed("does-not-exist").await,
        Err(StoreError::RecordNotFound)
    ));
}
