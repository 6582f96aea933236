/// Prefix shared by every versioned route.
pub const API_PREFIX: &str = "/api/v0";

/// JSON bodies only; video bytes never pass through the service.
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

pub const MAX_CONCURRENT_REQUESTS: usize = 512;

/// Header carrying the processing job's shared secret.
pub const JOB_SECRET_HEADER: &str = "x-job-secret";
