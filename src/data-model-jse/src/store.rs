//! Persistence of job links and the outcomes recorded against them.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::DbPool;
use crate::models::{
    ApplicationLink, FailedJob, JobDescription, JobLink, NewApplicationLink, NewFailedJob, NewJobDescription, Site,
};
use crate::schema::{application_links, failed_jobs, job_descriptions, job_links};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found in database.")]
    RecordNotFound,
    #[error("Database error: {0}")]
    DbError(diesel::result::Error),
    #[error("Database pool error: {0}")]
    DbPoolError(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Self::RecordNotFound,
            _ => Self::DbError(error),
        }
    }
}

impl<E: std::fmt::Debug> From<deadpool::managed::PoolError<E>> for StoreError {
    fn from(error: deadpool::managed::PoolError<E>) -> Self {
        Self::DbPoolError(format!("{:?}", error))
    }
}

/// Where job links are read from and where every per-job outcome is written to.
///
/// Inserts of descriptions and application links are idempotent: a duplicate
/// key is reported as `Ok(false)`, never as an error.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// All job links of the site whose `processed` flag is false or unset.
    async fn list_unprocessed_jobs(&self, site: Site) -> Result<Vec<JobLink>, StoreError>;

    async fn mark_processed(&self, job_id: &str) -> Result<(), StoreError>;

    /// True if a new row was written, false if the job already had a description.
    async fn insert_description(&self, description: &NewJobDescription) -> Result<bool, StoreError>;

    /// True if a new row was written, false if `(job_id, url)` was already recorded.
    async fn insert_application_link(&self, site: Site, job_id: &str, url: &str) -> Result<bool, StoreError>;

    async fn insert_failed_job(&self, site: Site, job_id: &str, job_link: &str, reason: &str)
    -> Result<(), StoreError>;

    async fn list_jobs(&self, site: Site) -> Result<Vec<JobLink>, StoreError>;

    async fn list_application_links(&self, site: Site) -> Result<Vec<ApplicationLink>, StoreError>;

    async fn list_descriptions(&self, site: Site) -> Result<Vec<JobDescription>, StoreError>;

    async fn list_failed_jobs(&self, site: Site) -> Result<Vec<FailedJob>, StoreError>;
}

/// Postgres-backed link store sharing the diesel-async connection pool.
#[derive(Clone)]
pub struct PgLinkStore {
    pool: DbPool,
}

impl PgLinkStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl LinkStore for PgLinkStore {
    async fn list_unprocessed_jobs(&self, site: Site) -> Result<Vec<JobLink>, StoreError> {
        let mut conn = self.pool.get().await?;
        let jobs = job_links::table
            .filter(job_links::site.eq(site))
            .filter(job_links::processed.is_null().or(job_links::processed.eq(false)))
            .order((job_links::created_at.asc(), job_links::id.asc()))
            .select(JobLink::as_select())
            .load(&mut *conn)
            .await?;
        Ok(jobs)
    }

    async fn mark_processed(&self, job_id: &str) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let updated = diesel::update(job_links::table.find(job_id))
            .set(job_links::processed.eq(Some(true)))
            .execute(&mut *conn)
            .await?;
        if updated == 0 {
            return Err(StoreError::RecordNotFound);
        }
        Ok(())
    }

    async fn insert_description(&self, description: &NewJobDescription) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let inserted = diesel::insert_into(job_descriptions::table)
            .values(description)
            .on_conflict(job_descriptions::job_id)
            .do_nothing()
            .execute(&mut *conn)
            .await?;
        Ok(inserted > 0)
    }

    async fn insert_application_link(&self, site: Site, job_id: &str, url: &str) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let inserted = diesel::insert_into(application_links::table)
            .values(&NewApplicationLink { site, job_id, url })
            .on_conflict((application_links::job_id, application_links::url))
            .do_nothing()
            .execute(&mut *conn)
            .await?;
        Ok(inserted > 0)
    }

    async fn insert_failed_job(
        &self,
        site: Site,
        job_id: &str,
        job_link: &str,
        reason: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        diesel::insert_into(failed_jobs::table)
            .values(&NewFailedJob {
                site,
                job_id,
                job_link,
                reason,
            })
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn list_jobs(&self, site: Site) -> Result<Vec<JobLink>, StoreError> {
        let mut conn = self.pool.get().await?;
        let jobs = job_links::table
            .filter(job_links::site.eq(site))
            .order(job_links::created_at.desc())
            .select(JobLink::as_select())
            .load(&mut *conn)
            .await?;
        Ok(jobs)
    }

    async fn list_application_links(&self, site: Site) -> Result<Vec<ApplicationLink>, StoreError> {
        let mut conn = self.pool.get().await?;
        let links = application_links::table
            .filter(application_links::site.eq(site))
            .order(application_links::id.asc())
            .select(ApplicationLink::as_select())
            .load(&mut *conn)
            .await?;
        Ok(links)
    }

    async fn list_descriptions(&self, site: Site) -> Result<Vec<JobDescription>, StoreError> {
        let mut conn = self.pool.get().await?;
        let descriptions = job_descriptions::table
            .filter(job_descriptions::site.eq(site))
            .order(job_descriptions::id.asc())
            .select(JobDescription::as_select())
            .load(&mut *conn)
            .await?;
        Ok(descriptions)
    }

    async fn list_failed_jobs(&self, site: Site) -> Result<Vec<FailedJob>, StoreError> {
        let mut conn = self.pool.get().await?;
        let failed = failed_jobs::table
            .filter(failed_jobs::site.eq(site))
            .order(failed_jobs::id.asc())
            .select(FailedJob::as_select())
            .load(&mut *conn)
            .await?;
        Ok(failed)
    }
}
