use serde::{Deserialize, Serialize};

use crate::status::JobStatus;

/// Where the provider writes the rendition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobDestination {
    pub bucket: String,
    /// Always ends with `/`
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJob {
    /// Presigned GET URL for the original
    pub source_url: String,
    pub destination: JobDestination,
    pub webhook_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedJob {
    pub job_id: String,
    pub status: JobStatus,
}

/// Canonical webhook record, independent of the provider's wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub job_id: String,
    pub status: JobStatus,
    pub hls_url: Option<String>,
    pub error: Option<String>,
}

impl JobUpdate {
    /// HLS prefix to record on completion.
    ///
    /// A relative `hls_url` contributes its directory; absolute URLs and a
    /// missing value fall back to the prefix the job was submitted with.
    pub fn hls_prefix(&self, submitted_prefix: &str) -> String {
        let Some(url) = self.hls_url.as_deref().map(str::trim) else {
            return submitted_prefix.to_string();
        };
        if url.is_empty() || url.contains("://") || url.starts_with('/') || url.contains("..") {
            return submitted_prefix.to_string();
        }
        if url.ends_with('/') {
            return url.to_string();
        }
        match url.rsplit_once('/') {
            Some((dir, _file)) => format!("{}/", dir),
            None => submitted_prefix.to_string(),
        }
    }
}
