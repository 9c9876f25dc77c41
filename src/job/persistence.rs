//! Job state persistence to `reports/{jobId}.json` (`spec.md` §6).
//! Grounded in the teacher's `content_saver::json_saver` idiom: serialize
//! with `serde_json`, write via `tokio::fs`, ensure the parent directory
//! exists first.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

const REPORTS_DIR: &str = "reports";

fn report_path(job_id: &str) -> PathBuf {
    Path::new(REPORTS_DIR).join(format!("{job_id}.json"))
}

/// Best-effort persist: a write failure is logged, not propagated, since
/// losing a status snapshot must never abort the driver loop.
pub async fn persist(job_id: &str, record: &impl Serialize) {
    let path = report_path(job_id);

    if let Some(parent) = path.parent()
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        warn!(job_id, error = %e, "failed to create reports directory");
        return;
    }

    let json = match serde_json::to_vec_pretty(record) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(job_id, error = %e, "failed to serialize job record");
            return;
        }
    };

    if let Err(e) = tokio::fs::write(&path, json).await {
        warn!(job_id, error = %e, path = %path.display(), "failed to persist job report");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Dummy {
        value: u32,
    }

    #[tokio::test]
    async fn persists_and_round_trips_through_the_reports_directory() {
        let job_id = format!("test-job-{}", std::process::id());
        persist(&job_id, &Dummy { value: 42 }).await;

        let path = report_path(&job_id);
        let bytes = tokio::fs::read(&path).await.expect("report should have been written");
        let decoded: Dummy = serde_json::from_slice(&bytes).expect("valid json");
        assert_eq!(decoded, Dummy { value: 42 });

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn report_path_lands_under_the_reports_directory() {
        use assert_fs::prelude::*;

        let temp = assert_fs::TempDir::new().expect("tempdir");
        let expected = temp.child("reports").child("abc-123.json");

        let path = report_path("abc-123");
        assert_eq!(path, std::path::Path::new("reports/abc-123.json"));
        // Confirms the relative layout `report_path` assumes matches what a
        // sandboxed working directory (as `assert_fs` models) would expect.
        assert_eq!(expected.path().file_name(), path.file_name());
    }
}
