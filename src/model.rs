//! Shared data-model entities from `spec.md` §3, used by both the cache and
//! the job orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The final composed record for a URL: header block + Markdown body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artifact {
    pub url: String,
    pub metadata: String,
    pub markdown: String,
    pub timestamp: DateTime<Utc>,
}

impl Artifact {
    /// `"URL: {url}\n\n{formattedMetadata}\n\n---\n\n{markdown}"` per
    /// `spec.md` §4.7 step 6.
    pub fn compose(url: &str, formatted_metadata: &str, markdown: &str) -> String {
        format!("URL: {url}\n\n{formatted_metadata}\n\n---\n\n{markdown}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

/// One outcome per URL per job; immutable after insertion
/// (`spec.md` §3: "ProcessingResult ... immutable after insertion").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub url: String,
    pub success: bool,
    pub markdown: Option<String>,
    pub metadata: Option<String>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProcessingResult {
    pub fn success(url: impl Into<String>, artifact: &Artifact) -> Self {
        Self {
            url: url.into(),
            success: true,
            markdown: Some(artifact.markdown.clone()),
            metadata: Some(artifact.metadata.clone()),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: false,
            markdown: None,
            metadata: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// The synthetic failure `spec.md` §4.8 step 4 inserts for URLs dropped
    /// by the reconciliation pass.
    pub fn skipped(url: impl Into<String>) -> Self {
        Self::failure(url, "URL was skipped during processing")
    }
}

/// The wire shape `spec.md` §6 documents for the final webhook's
/// `results.successful`/`results.failed` entries: a `status` string rather
/// than the internal `success` bool.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResultWire<'a> {
    pub url: &'a str,
    pub status: &'static str,
    pub markdown: Option<&'a str>,
    pub metadata: Option<&'a str>,
    pub error: Option<&'a str>,
    pub timestamp: DateTime<Utc>,
}

impl<'a> From<&'a ProcessingResult> for ProcessingResultWire<'a> {
    fn from(result: &'a ProcessingResult) -> Self {
        Self {
            url: &result.url,
            status: if result.success { "success" } else { "failed" },
            markdown: result.markdown.as_deref(),
            metadata: result.metadata.as_deref(),
            error: result.error.as_deref(),
            timestamp: result.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JobCounts {
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
    pub current_batch: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobTiming {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl JobTiming {
    pub fn duration_secs(&self) -> Option<f64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }
}
