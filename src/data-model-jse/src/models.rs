use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

/// Separator used to store the ordered skills list in a single text column.
pub const SKILLS_SEPARATOR: &str = ", ";

// Site enum
/// Recruiting website that a job link was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    LinkedIn,
    Xing,
}

impl Site {
    pub const ALL: [Site; 2] = [Site::LinkedIn, Site::Xing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Site::LinkedIn => "linkedin",
            Site::Xing => "xing",
        }
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown site: '{0}'")]
pub struct UnknownSite(pub String);

impl FromStr for Site {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linkedin" => Ok(Site::LinkedIn),
            "xing" => Ok(Site::Xing),
            _ => Err(UnknownSite(s.to_string())),
        }
    }
}

impl ToSql<Text, Pg> for Site {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for Site {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"linkedin" => Ok(Site::LinkedIn),
            b"xing" => Ok(Site::Xing),
            _ => Err("Unrecognized site".into()),
        }
    }
}

// JobType enum
/// Work arrangement of a posting, as categorized by the summarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Remote,
    Hybrid,
    #[serde(rename = "on-site")]
    OnSite,
    Unknown,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Remote => "remote",
            JobType::Hybrid => "hybrid",
            JobType::OnSite => "on-site",
            JobType::Unknown => "unknown",
        }
    }

    /// Categorizes free text produced by a text model.
    /// Anything that isn't recognizably remote, hybrid or on-site is `Unknown`.
    pub fn parse_lenient(text: &str) -> JobType {
        let normalized: String = text
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "remote" | "fullyremote" | "remoteonly" => JobType::Remote,
            "hybrid" => JobType::Hybrid,
            "onsite" | "inoffice" | "office" | "onpremise" => JobType::OnSite,
            _ => JobType::Unknown,
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql<Text, Pg> for JobType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for JobType {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"remote" => Ok(JobType::Remote),
            b"hybrid" => Ok(JobType::Hybrid),
            b"on-site" => Ok(JobType::OnSite),
            b"unknown" => Ok(JobType::Unknown),
            _ => Err("Unrecognized job type".into()),
        }
    }
}

// job_links table model (database representation)
/// A job posting waiting for its description and application link to be captured.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::job_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobLink {
    pub id: String,
    pub site: Site,
    pub title: String,
    pub link: String,
    pub processed: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl JobLink {
    /// New unprocessed job link with a fresh opaque identifier.
    pub fn new(site: Site, title: &str, link: &str) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), site, title, link)
    }

    pub fn with_id(id: impl Into<String>, site: Site, title: &str, link: &str) -> Self {
        JobLink {
            id: id.into(),
            site,
            title: title.to_string(),
            link: link.to_string(),
            processed: Some(false),
            created_at: Utc::now(),
        }
    }

    /// A NULL `processed` column counts as pending.
    pub fn is_processed(&self) -> bool {
        self.processed.unwrap_or(false)
    }
}

/// Groups jobs by the search title that produced them.
/// Titles keep the order in which they first appear, as do the jobs within a title.
pub fn group_by_title(jobs: Vec<JobLink>) -> Vec<(String, Vec<JobLink>)> {
    let mut groups: Vec<(String, Vec<JobLink>)> = Vec::new();
    for job in jobs {
        match groups.iter_mut().find(|(title, _)| *title == job.title) {
            Some((_, members)) => members.push(job),
            None => groups.push((job.title.clone(), vec![job])),
        }
    }
    groups
}

// application_links table model
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::application_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ApplicationLink {
    pub id: i32,
    pub site: Site,
    pub job_id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::application_links)]
pub struct NewApplicationLink<'a> {
    pub site: Site,
    pub job_id: &'a str,
    pub url: &'a str,
}

// job_descriptions table model
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::job_descriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobDescription {
    pub id: i32,
    pub site: Site,
    pub job_id: String,
    pub job_link: String,
    pub description: String,
    pub job_type: JobType,
    pub skills: String,
}

impl JobDescription {
    /// The stored skills as an ordered list.
    pub fn skills_list(&self) -> Vec<String> {
        split_skills(&self.skills)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = crate::schema::job_descriptions)]
pub struct NewJobDescription {
    pub site: Site,
    pub job_id: String,
    pub job_link: String,
    pub description: String,
    pub job_type: JobType,
    pub skills: String,
}

impl NewJobDescription {
    pub fn new(site: Site, job: &JobLink, description: &str, job_type: JobType, skills: &[String]) -> Self {
        NewJobDescription {
            site,
            job_id: job.id.clone(),
            job_link: job.link.clone(),
            description: description.to_string(),
            job_type,
            skills: join_skills(skills),
        }
    }
}

pub fn join_skills(skills: &[String]) -> String {
    skills.join(SKILLS_SEPARATOR)
}

pub fn split_skills(skills: &str) -> Vec<String> {
    if skills.is_empty() {
        return Vec::new();
    }
    skills.split(SKILLS_SEPARATOR).map(|s| s.to_string()).collect()
}

// failed_jobs table model
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::failed_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FailedJob {
    pub id: i32,
    pub site: Site,
    pub job_id: String,
    pub job_link: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::failed_jobs)]
pub struct NewFailedJob<'a> {
    pub site: Site,
    pub job_id: &'a str,
    pub job_link: &'a str,
    pub reason: &'a str,
}

// API Payload Types

/// Response payload for a job description, with the skills split back into a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptionResponse {
    pub id: i32,
    pub job_id: String,
    pub job_link: String,
    pub description: String,
    pub job_type: JobType,
    pub skills: Vec<String>,
}

impl From<JobDescription> for JobDescriptionResponse {
    fn from(row: JobDescription) -> Self {
        let skills = row.skills_list();
        JobDescriptionResponse {
            id: row.id,
            job_id: row.job_id,
            job_link: row.job_link,
            description: row.description,
            job_type: row.job_type,
            skills,
        }
    }
}

/// Response payload for the trigger endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_round_trips_through_str() {
        for site in Site::ALL {
            assert_eq!(site.as_str().parse::<Site>().unwrap(), site);
        }
        assert_eq!("LinkedIn".parse::<Site>().unwrap(), Site::LinkedIn);
        assert!("monster".parse::<Site>().is_err());
    }

    #[test]
    fn test_site_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Site::LinkedIn).unwrap(), "\"linkedin\"");
        assert_eq!(serde_json::to_string(&Site::Xing).unwrap(), "\"xing\"");
    }

    #[test]
    fn test_job_type_parse_lenient() {
        assert_eq!(JobType::parse_lenient("Remote"), JobType::Remote);
        assert_eq!(JobType::parse_lenient(" remote "), JobType::Remote);
        assert_eq!(JobType::parse_lenient("Hybrid"), JobType::Hybrid);
        assert_eq!(JobType::parse_lenient("On-site"), JobType::OnSite);
        assert_eq!(JobType::parse_lenient("Onsite"), JobType::OnSite);
        assert_eq!(JobType::parse_lenient("on site"), JobType::OnSite);
        assert_eq!(JobType::parse_lenient("full time"), JobType::Unknown);
        assert_eq!(JobType::parse_lenient(""), JobType::Unknown);
    }

    #[test]
    fn test_new_job_link_is_pending() {
        let job = JobLink::new(Site::Xing, "Engineer", "https://www.xing.com/jobs/berlin-engineer-123");
        assert!(!job.id.is_empty());
        assert!(!job.is_processed());

        let job = JobLink {
            processed: None,
            ..job
        };
        assert!(!job.is_processed());
    }

    #[test]
    fn test_group_by_title_keeps_first_appearance_order() {
        let jobs = vec![
            JobLink::with_id("1", Site::LinkedIn, "Analyst", "https://site/job/1"),
            JobLink::with_id("2", Site::LinkedIn, "Engineer", "https://site/job/2"),
            JobLink::with_id("3", Site::LinkedIn, "Analyst", "https://site/job/3"),
        ];

        let groups = group_by_title(jobs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Analyst");
        assert_eq!(
            groups[0].1.iter().map(|j| j.id.as_str()).collect::<Vec<_>>(),
            vec!["1", "3"]
        );
        assert_eq!(groups[1].0, "Engineer");
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn test_skills_join_and_split() {
        let skills = vec!["Go".to_string(), "SQL".to_string()];
        let joined = join_skills(&skills);
        assert_eq!(joined, "Go, SQL");
        assert_eq!(split_skills(&joined), skills);
        assert!(split_skills("").is_empty());
    }

    #[test]
    fn test_description_response_splits_skills() {
        let row = JobDescription {
            id: 7,
            site: Site::LinkedIn,
            job_id: "J1".to_string(),
            job_link: "https://site/job/123".to_string(),
            description: "Great role".to_string(),
            job_type: JobType::Remote,
            skills: "Go, SQL".to_string(),
        };

        let response = JobDescriptionResponse::from(row);
        assert_eq!(response.skills, vec!["Go".to_string(), "SQL".to_string()]);
        assert_eq!(response.job_type, JobType::Remote);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["job_type"], "remote");
    }
}
