use std::sync::Arc;
use std::time::Duration;

use core_jse::capture::{TabSnapshot, capture_external_tab};
use core_jse::navigation::{attempt_apply, extract_description};
use core_jse::{
    BrowserDriver, BrowserSession, BrowserSettings, FailureReason, JobTab, SiteProfile, Summarizer, profile,
};
use data_model_jse::models::{JobLink, JobType, NewJobDescription, group_by_title};
use data_model_jse::{LinkStore, Site};
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, timeout_at};

use crate::errors::Error;

/// Kept back from the container wait so the description can still be read before the deadline.
const READ_ALLOWANCE: Duration = Duration::from_millis(250);

/// Steps of one job, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JobStage {
    Pending,
    Navigating,
    DescriptionExtracted,
    Summarized,
    Stored,
    ApplyAttempted,
    TabCaptured,
    Done,
}

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The description was stored. Apply and tab capture may still have come up empty.
    Done {
        stages: Vec<JobStage>,
        captured_url: Option<String>,
        summarized: bool,
    },
    /// `stage` is the last stage the job reached.
    Failed { stage: JobStage, reason: FailureReason },
}

impl JobOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, JobOutcome::Done { .. })
    }
}

/// Everything a run needs. The browser session is shared by every job of the run.
pub struct PipelineContext {
    pub store: Arc<dyn LinkStore>,
    pub browser: Arc<dyn BrowserDriver>,
    pub summarizer: Arc<Summarizer>,
    pub settings: BrowserSettings,
}

impl PipelineContext {
    /// Reads browser and summarizer settings from the environment and connects to the browser.
    pub async fn connect(store: Arc<dyn LinkStore>) -> Result<Self, Error> {
        let settings = BrowserSettings::from_env()?;
        let summarizer = Summarizer::from_env()?;
        let session = BrowserSession::connect(settings.clone()).await?;
        Ok(PipelineContext {
            store,
            browser: Arc::new(session),
            summarizer: Arc::new(summarizer),
            settings,
        })
    }
}

/// Counts for one run over a site's unprocessed jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub site: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub links_captured: usize,
}

/// Runs every unprocessed job of `site`, one at a time, grouped by title.
///
/// Per-job failures are recorded and the run moves on. Only an unreadable store or a
/// lost browser session end the run early; jobs not yet recorded then stay unprocessed.
pub async fn run_site(ctx: Arc<PipelineContext>, site: Site) -> Result<RunSummary, Error> {
    let jobs = ctx.store.list_unprocessed_jobs(site).await?;
    ctx.browser.check_health().await?;

    let mut summary = RunSummary {
        site: site.to_string(),
        total: jobs.len(),
        ..Default::default()
    };
    tracing::info!("Processing {} unprocessed {} jobs", jobs.len(), site);

    for (title, group) in group_by_title(jobs) {
        tracing::info!("Processing {} jobs titled '{}'", group.len(), title);

        for job in group {
            let outcome = run_isolated(&ctx, site, &job).await;

            if let JobOutcome::Failed { .. } = &outcome
                && let Err(e) = ctx.browser.check_health().await
            {
                tracing::error!("[job: {}] Browser session lost, aborting the run: {}", job.id, e);
                return Err(e.into());
            }

            match &outcome {
                JobOutcome::Done { captured_url, .. } => {
                    summary.succeeded += 1;
                    if captured_url.is_some() {
                        summary.links_captured += 1;
                    }
                }
                JobOutcome::Failed { .. } => summary.failed += 1,
            }
            record_outcome(ctx.store.as_ref(), site, &job, &outcome).await;
        }
    }

    tracing::info!(
        "Finished {}: {} succeeded, {} failed, {} application links captured",
        site,
        summary.succeeded,
        summary.failed,
        summary.links_captured
    );
    Ok(summary)
}

/// Runs one job on its own task so that a panic only fails that job.
async fn run_isolated(ctx: &Arc<PipelineContext>, site: Site, job: &JobLink) -> JobOutcome {
    let handle = tokio::spawn({
        let ctx = ctx.clone();
        let job = job.clone();
        async move { process_job(&ctx, site, &job).await }
    });

    match handle.await {
        Ok(outcome) => outcome,
        Err(join_error) => {
            tracing::error!("[job: {}] Job task faulted: {}", job.id, join_error);
            JobOutcome::Failed {
                stage: JobStage::Pending,
                reason: FailureReason::UnexpectedFault,
            }
        }
    }
}

/// Writes the terminal state of a job: the failure row if it failed, then the processed flag.
/// Both writes are attempted whatever happens to the other.
pub async fn record_outcome(store: &dyn LinkStore, site: Site, job: &JobLink, outcome: &JobOutcome) {
    if let JobOutcome::Failed { stage, reason } = outcome {
        tracing::warn!("[job: {}] Failed at {:?}: {}", job.id, stage, reason);
        if let Err(e) = store.insert_failed_job(site, &job.id, &job.link, reason.as_str()).await {
            tracing::error!("[job: {}] Failed to record failure '{}': {}", job.id, reason, e);
        }
    }

    match store.mark_processed(&job.id).await {
        Ok(()) => tracing::debug!("[job: {}] Marked processed", job.id),
        Err(e) => tracing::error!("[job: {}] Failed to mark processed: {}", job.id, e),
    }
}

/// Runs one job in a tab of its own. Never fails: every problem becomes `JobOutcome::Failed`.
///
/// All browser work of the job shares one `job_timeout` budget, paused while the description
/// is summarized. Running out before the description is stored fails the job; running out
/// later only skips tab capture. The tab is released on every path; if this future is
/// dropped or panics, the tab handle closes it instead.
pub async fn process_job(ctx: &PipelineContext, site: Site, job: &JobLink) -> JobOutcome {
    tracing::info!("[job: {}] Processing '{}' ({})", job.id, job.title, job.link);

    let mut tab = match ctx.browser.open_job_context().await {
        Ok(tab) => tab,
        Err(e) => {
            tracing::warn!("[job: {}] Failed to open a tab: {}", job.id, e);
            return JobOutcome::Failed {
                stage: JobStage::Pending,
                reason: FailureReason::OpenContext,
            };
        }
    };
    let deadline = Instant::now() + ctx.settings.job_timeout;

    let mut stages = vec![JobStage::Pending];
    let outcome = match run_pipeline(ctx, profile(site), job, tab.as_ref(), deadline, &mut stages).await {
        Ok((captured_url, summarized)) => {
            stages.push(JobStage::Done);
            JobOutcome::Done {
                stages,
                captured_url,
                summarized,
            }
        }
        Err(reason) => JobOutcome::Failed {
            stage: stages.last().copied().unwrap_or(JobStage::Pending),
            reason,
        },
    };

    match tokio::time::timeout(ctx.settings.connect_timeout, tab.release()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("[job: {}] Failed to release tab: {}", job.id, e),
        Err(_) => tracing::warn!("[job: {}] Timed out releasing tab", job.id),
    }
    outcome
}

/// navigate -> extract -> summarize -> store -> apply -> capture.
/// Returns the captured application URL and whether the description was summarized.
/// Nothing after the description is stored fails the job.
async fn run_pipeline(
    ctx: &PipelineContext,
    profile: &SiteProfile,
    job: &JobLink,
    tab: &dyn JobTab,
    mut deadline: Instant,
    stages: &mut Vec<JobStage>,
) -> Result<(Option<String>, bool), FailureReason> {
    stages.push(JobStage::Navigating);
    let settle_delay = ctx.settings.settle_delay_for(profile);
    let wait_timeout = deadline
        .saturating_duration_since(Instant::now())
        .saturating_sub(settle_delay + READ_ALLOWANCE);
    let description = timeout_at(deadline, extract_description(tab, profile, job, settle_delay, wait_timeout))
        .await
        .map_err(|_| {
            tracing::warn!("[job: {}] Timed out loading the posting", job.id);
            FailureReason::Timeout
        })??;
    stages.push(JobStage::DescriptionExtracted);

    let summarize_started = Instant::now();
    let (record, summarized) = describe(ctx.summarizer.as_ref(), profile.site, job, &description).await;
    deadline += summarize_started.elapsed();
    if summarized {
        stages.push(JobStage::Summarized);
    }

    match ctx.store.insert_description(&record).await {
        Ok(true) => tracing::debug!("[job: {}] Stored description", job.id),
        Ok(false) => tracing::debug!("[job: {}] Description was already stored", job.id),
        Err(e) => {
            tracing::error!("[job: {}] Failed to store description: {}", job.id, e);
            return Err(FailureReason::StoreDescription);
        }
    }
    stages.push(JobStage::Stored);

    let captured_url = if Instant::now() >= deadline {
        tracing::warn!("[job: {}] No time left to apply, skipping tab capture", job.id);
        None
    } else {
        match timeout_at(deadline, apply_and_capture(ctx, profile, job, tab, stages)).await {
            Ok(captured_url) => captured_url,
            Err(_) => {
                tracing::warn!("[job: {}] Timed out applying, skipping tab capture", job.id);
                None
            }
        }
    };
    Ok((captured_url, summarized))
}

/// The description record for a job. Falls back to the unsummarized text when no
/// backend produces a summary with a description.
async fn describe(summarizer: &Summarizer, site: Site, job: &JobLink, description: &str) -> (NewJobDescription, bool) {
    match summarizer.summarize(description).await {
        Ok(summary) if !summary.description.trim().is_empty() => (
            NewJobDescription::new(site, job, &summary.description, summary.job_type, &summary.skills),
            true,
        ),
        Ok(_) => {
            tracing::warn!("[job: {}] Summary has no description, storing the text as extracted", job.id);
            (NewJobDescription::new(site, job, description, JobType::Unknown, &[]), false)
        }
        Err(e) => {
            tracing::warn!("[job: {}] {}, storing the text as extracted", job.id, e);
            (NewJobDescription::new(site, job, description, JobType::Unknown, &[]), false)
        }
    }
}

/// Clicks apply and captures the tab it opens. Every failure here is logged and skipped.
async fn apply_and_capture(
    ctx: &PipelineContext,
    profile: &SiteProfile,
    job: &JobLink,
    tab: &dyn JobTab,
    stages: &mut Vec<JobStage>,
) -> Option<String> {
    let before = match TabSnapshot::capture(tab).await {
        Ok(before) => before,
        Err(e) => {
            tracing::warn!("[job: {}] Failed to list tabs before applying, skipping apply: {}", job.id, e);
            return None;
        }
    };

    if let Err(e) = attempt_apply(tab, profile, ctx.settings.apply_settle_for(profile)).await {
        tracing::info!("[job: {}] Apply click skipped: {}", job.id, e);
        return None;
    }
    stages.push(JobStage::ApplyAttempted);

    match capture_external_tab(tab, ctx.store.as_ref(), profile, &job.id, &before).await {
        Ok(Some(url)) => {
            stages.push(JobStage::TabCaptured);
            Some(url)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("[job: {}] Tab capture failed: {}", job.id, e);
            None
        }
    }
}
