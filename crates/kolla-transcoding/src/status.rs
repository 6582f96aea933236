use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Provider-independent job state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Map a provider's status string to a [`JobStatus`]. Unknown values are
/// treated as queued so they never finalize a clip.
pub fn map_provider_status(raw: &str) -> JobStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pending" | "queued" => JobStatus::Queued,
        "processing" | "transcoding" | "running" => JobStatus::Processing,
        "completed" | "finished" | "success" => JobStatus::Completed,
        "failed" | "error" => JobStatus::Failed,
        other => {
            tracing::warn!(status = %other, "Unknown transcoding provider status, treating as queued");
            JobStatus::Queued
        }
    }
}
