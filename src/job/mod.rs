//! Job Orchestrator (`spec.md` §4.8): `createJob` returns a `JobId`
//! immediately; the driver runs in the background.
//!
//! `JobOrchestrator` holds a `DashMap<JobId, Arc<JobHandle>>`, grounded in
//! the teacher's `DashMap`-based per-domain state idiom
//! (`circuit_breaker.rs::CircuitBreaker.domains`), generalized to per-job
//! state. `JobHandle` routes all `urlState` mutation through the single
//! driver task spawned in `create_job`, satisfying `spec.md`'s "mutated by
//! one driver task only."

pub mod metrics;
pub mod persistence;
pub mod webhook;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::browser::BrowserCollaborator;
use crate::cache::Cache;
use crate::config::JobConfig;
use crate::model::{JobCounts, JobStatus, JobTiming, ProcessingResult, ProcessingResultWire};
use crate::pipeline::{self, PipelineDeps};
use crate::sitemap;
use metrics::JobMetrics;
use webhook::WebhookSender;

pub type JobId = Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub counts: JobCounts,
    pub timing: JobTiming,
    pub url_state: HashMap<String, ProcessingResult>,
    pub error: Option<String>,
}

impl Job {
    fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            counts: JobCounts::default(),
            timing: JobTiming::default(),
            url_state: HashMap::new(),
            error: None,
        }
    }

    fn recompute_counts(&mut self) {
        self.counts.processed = self.url_state.len();
        self.counts.success = self.url_state.values().filter(|r| r.success).count();
        self.counts.failed = self.counts.processed - self.counts.success;
    }
}

#[derive(Serialize)]
struct PersistedJob<'a> {
    id: JobId,
    status: JobStatus,
    #[serde(rename = "startTime")]
    start_time: Option<chrono::DateTime<Utc>>,
    #[serde(rename = "endTime")]
    end_time: Option<chrono::DateTime<Utc>>,
    duration: Option<f64>,
    summary: JobCounts,
    results: &'a HashMap<String, ProcessingResult>,
    error: Option<&'a str>,
}

impl<'a> From<&'a Job> for PersistedJob<'a> {
    fn from(job: &'a Job) -> Self {
        Self {
            id: job.id,
            status: job.status,
            start_time: job.timing.start_time,
            end_time: job.timing.end_time,
            duration: job.timing.duration_secs(),
            summary: job.counts,
            results: &job.url_state,
            error: job.error.as_deref(),
        }
    }
}

pub struct JobHandle {
    cancel: AtomicBool,
    job: RwLock<Job>,
}

impl JobHandle {
    /// Idempotent per `spec.md` §8: "repeated `cancelJob` is a no-op after
    /// the first."
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

pub struct JobOrchestrator<B: BrowserCollaborator> {
    jobs: DashMap<JobId, Arc<JobHandle>>,
    browser: Arc<B>,
    cache: Arc<Cache>,
    metrics: Arc<JobMetrics>,
    webhook_sender: Arc<WebhookSender>,
    http_client: Client,
    page_timeout: std::time::Duration,
    /// `MAX_RETRIES` — the Pipeline's own transient-error retry budget
    /// (`spec.md` §4.7), distinct from a `JobConfig`'s per-URL outer
    /// `retryCount`.
    pipeline_max_retries: u32,
    pipeline_retry_delay: std::time::Duration,
}

impl<B: BrowserCollaborator + 'static> JobOrchestrator<B>
where
    B::Page: 'static,
{
    pub fn new(
        browser: Arc<B>,
        cache: Arc<Cache>,
        page_timeout: std::time::Duration,
        pipeline_max_retries: u32,
        pipeline_retry_delay: std::time::Duration,
    ) -> Self {
        Self {
            jobs: DashMap::new(),
            browser,
            cache,
            metrics: Arc::new(JobMetrics::default()),
            webhook_sender: Arc::new(WebhookSender::new()),
            http_client: Client::new(),
            page_timeout,
            pipeline_max_retries,
            pipeline_retry_delay,
        }
    }

    pub fn metrics(&self) -> &JobMetrics {
        &self.metrics
    }

    pub async fn status(&self, job_id: JobId) -> Option<Job> {
        let handle = self.jobs.get(&job_id)?.clone();
        Some(handle.job.read().await.clone())
    }

    pub fn cancel(&self, job_id: JobId) {
        if let Some(handle) = self.jobs.get(&job_id) {
            handle.cancel();
        }
    }

    /// Returns immediately with a `JobId`; the driver algorithm runs as a
    /// detached background task.
    pub fn create_job(&self, config: JobConfig) -> JobId {
        let job_id = Uuid::now_v7();
        let handle = Arc::new(JobHandle { cancel: AtomicBool::new(false), job: RwLock::new(Job::new(job_id)) });
        self.jobs.insert(job_id, handle.clone());

        let browser = self.browser.clone();
        let cache = self.cache.clone();
        let metrics = self.metrics.clone();
        let webhook_sender = self.webhook_sender.clone();
        let http_client = self.http_client.clone();
        let page_timeout = self.page_timeout;
        let pipeline_max_retries = self.pipeline_max_retries;
        let pipeline_retry_delay = self.pipeline_retry_delay;

        tokio::spawn(async move {
            run_driver(
                job_id,
                handle,
                config,
                browser,
                cache,
                metrics,
                webhook_sender,
                http_client,
                page_timeout,
                pipeline_max_retries,
                pipeline_retry_delay,
            )
            .await;
        });

        job_id
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_driver<B: BrowserCollaborator + 'static>(
    job_id: JobId,
    handle: Arc<JobHandle>,
    config: JobConfig,
    browser: Arc<B>,
    cache: Arc<Cache>,
    metrics: Arc<JobMetrics>,
    webhook_sender: Arc<WebhookSender>,
    http_client: Client,
    page_timeout: std::time::Duration,
    pipeline_max_retries: u32,
    pipeline_retry_delay: std::time::Duration,
) where
    B::Page: 'static,
{
    {
        let mut job = handle.job.write().await;
        job.status = JobStatus::Processing;
        job.timing.start_time = Some(Utc::now());
    }

    let urls = match sitemap::read_source(&config.source, &http_client).await {
        Ok(urls) => urls,
        Err(e) => {
            let mut job = handle.job.write().await;
            job.status = JobStatus::Failed;
            job.error = Some(e.to_string());
            job.timing.end_time = Some(Utc::now());
            persistence::persist(&job_id.to_string(), &PersistedJob::from(&*job)).await;
            return;
        }
    };

    {
        let mut job = handle.job.write().await;
        job.counts.total = urls.len();
    }

    let deps = Arc::new(PipelineDeps {
        browser,
        cache,
        page_timeout,
        max_retries: pipeline_max_retries,
        retry_delay: pipeline_retry_delay,
    });

    let batches: Vec<Vec<url::Url>> =
        urls.chunks(config.batch_size.max(1)).map(|c| c.to_vec()).collect();
    let total_batches = batches.len();

    for (batch_index, batch) in batches.into_iter().enumerate() {
        if handle.is_cancelled() {
            info!(%job_id, "job cancelled, stopping before next batch");
            break;
        }

        let already_seen: std::collections::HashSet<String> = {
            let job = handle.job.read().await;
            job.url_state.keys().cloned().collect()
        };
        let pending: Vec<url::Url> =
            batch.into_iter().filter(|u| !already_seen.contains(u.as_str())).collect();

        let options = config.options.clone();
        let retry_count = config.retry_count;
        let retry_delay = config.retry_delay;
        let deps_for_batch = deps.clone();

        let results = crate::worker::run_bounded(pending, config.max_concurrent.max(1), move |url: url::Url| {
            let options = options.clone();
            let deps = deps_for_batch.clone();
            async move {
                Ok::<ProcessingResult, crate::error::Sf4aiError>(
                    convert_with_outer_retry(url, options, deps, retry_count, retry_delay).await,
                )
            }
        })
        .await;

        {
            let mut job = handle.job.write().await;
            for result in results {
                match result {
                    Ok(outcome) => {
                        metrics.record(outcome.success, 0);
                        job.url_state.insert(outcome.url.clone(), outcome);
                    }
                    Err((error, url)) => {
                        let outcome = ProcessingResult::failure(url.to_string(), error.to_string());
                        metrics.record(false, 0);
                        job.url_state.insert(outcome.url.clone(), outcome);
                    }
                }
            }
            job.counts.current_batch = batch_index + 1;
            job.recompute_counts();
        }

        persistence::persist(&job_id.to_string(), &PersistedJob::from(&*handle.job.read().await)).await;

        if let Some(webhook) = &config.webhook
            && webhook.progress_updates
        {
            let job = handle.job.read().await;
            let payload = serde_json::json!({
                "jobId": job_id,
                "status": "in_progress",
                "progress": {
                    "processed": job.counts.processed,
                    "total": job.counts.total,
                    "percentage": percentage(job.counts.processed, job.counts.total),
                    "success": job.counts.success,
                    "failed": job.counts.failed,
                    "batch": { "current": job.counts.current_batch, "total": total_batches },
                },
                "timestamp": Utc::now(),
            });
            drop(job);
            webhook_sender.send(webhook, payload).await;
        }

        tokio::time::sleep(config.processing_delay).await;
    }

    {
        let mut job = handle.job.write().await;
        job.status = if handle.is_cancelled() { JobStatus::Cancelled } else { JobStatus::Completed };
        job.timing.end_time = Some(Utc::now());
    }

    if !handle.is_cancelled() {
        reconcile(&handle, &urls).await;
    }

    persistence::persist(&job_id.to_string(), &PersistedJob::from(&*handle.job.read().await)).await;

    if !handle.is_cancelled()
        && let Some(webhook) = &config.webhook
    {
        let job = handle.job.read().await;
        let (successful, failed): (Vec<ProcessingResultWire>, Vec<ProcessingResultWire>) =
            job.url_state.values().map(ProcessingResultWire::from).partition(|r| r.status == "success");
        let payload = serde_json::json!({
            "jobId": job_id,
            "status": job.status,
            "summary": {
                "total": job.counts.total,
                "processed": job.counts.processed,
                "successful": job.counts.success,
                "failed": job.counts.failed,
                "processingTime": job.timing.duration_secs(),
            },
            "results": { "successful": successful, "failed": failed },
            "timestamp": Utc::now(),
        });
        drop(job);
        webhook_sender.send(webhook, payload).await;
    }
}

/// The orchestrator's outer retry (`spec.md` §4.8: "permits `retryCount`
/// full re-invocations ... for any URL that returned failure"), independent
/// of the Pipeline's own transient-error retry.
async fn convert_with_outer_retry<B: BrowserCollaborator + 'static>(
    url: url::Url,
    options: crate::config::ConversionOptions,
    deps: Arc<PipelineDeps<B>>,
    retry_count: u32,
    retry_delay: std::time::Duration,
) -> ProcessingResult
where
    B::Page: 'static,
{
    let url_str = url.to_string();
    let mut last_error = None;

    for attempt in 0..=retry_count {
        match pipeline::convert(&url_str, &options, &deps).await {
            Ok(artifact) => return ProcessingResult::success(url_str, &artifact),
            Err(e) => {
                warn!(url = %url_str, attempt, error = %e, "URL conversion failed");
                last_error = Some(e);
                if attempt < retry_count {
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }

    let error = last_error.expect("loop runs at least once");
    ProcessingResult::failure(url_str, error.to_string())
}

/// Step 4: any input URL not present in `url_state` gets the synthetic
/// skipped failure, then counts are recomputed.
async fn reconcile(handle: &JobHandle, urls: &[url::Url]) {
    let mut job = handle.job.write().await;
    for url in urls {
        let key = url.to_string();
        job.url_state.entry(key.clone()).or_insert_with(|| ProcessingResult::skipped(key));
    }
    job.recompute_counts();
}

fn percentage(processed: usize, total: usize) -> f64 {
    if total == 0 { 100.0 } else { (processed as f64 / total as f64) * 100.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_recompute_counts_derives_from_url_state() {
        let mut job = Job::new(Uuid::now_v7());
        job.url_state.insert(
            "https://a.test".to_string(),
            ProcessingResult::failure("https://a.test", "err"),
        );
        job.counts.total = 2;
        job.recompute_counts();
        assert_eq!(job.counts.processed, 1);
        assert_eq!(job.counts.failed, 1);
        assert_eq!(job.counts.success, 0);
    }

    #[test]
    fn percentage_handles_zero_total() {
        assert_eq!(percentage(0, 0), 100.0);
        assert_eq!(percentage(1, 2), 50.0);
    }
}
