//! Error types module
//!
//! Every domain failure is an [`AppError`]. How a variant is shown to a client
//! (status, code, log level) is described once in [`AppError::presentation`],
//! and the HTTP layer reads it through [`ErrorMetadata`].
//!
//! The `Database` variant wraps `sqlx::Error` only when the `sqlx` feature is on.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected failures such as bad input or a missing row
    Debug,
    /// Upstream hiccups the caller can work around
    Warn,
    /// Anything that points at a bug or an outage
    Error,
}

/// How an error variant is presented to clients and logs.
#[derive(Debug, Clone, Copy)]
struct Presentation {
    status: u16,
    code: &'static str,
    recoverable: bool,
    hint: Option<&'static str>,
    sensitive: bool,
    level: LogLevel,
}

impl Presentation {
    /// Caller mistake: 4xx, message shown as-is, logged at debug.
    const fn client(status: u16, code: &'static str, hint: &'static str) -> Self {
        Presentation {
            status,
            code,
            recoverable: false,
            hint: Some(hint),
            sensitive: false,
            level: LogLevel::Debug,
        }
    }

    /// Our side failed: message hidden, retry suggested.
    const fn server(status: u16, code: &'static str) -> Self {
        Presentation {
            status,
            code,
            recoverable: true,
            hint: Some("Retry after a short delay"),
            sensitive: true,
            level: LogLevel::Error,
        }
    }
}

/// Metadata for error responses
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Machine-readable code, e.g. `LINK_EXPIRED`
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to put in a response body
    fn client_message(&self) -> String;

    /// Whether internal details must stay out of responses
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The transcoding provider rejected or failed a request.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The entity exists but its lifecycle state forbids the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Link expired: {0}")]
    Expired(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("Malformed JSON: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

impl AppError {
    fn presentation(&self) -> Presentation {
        match self {
            AppError::Database(_) => Presentation::server(500, "DATABASE_ERROR"),
            AppError::Storage(_) => Presentation::server(502, "STORAGE_ERROR"),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                Presentation::server(500, "INTERNAL_ERROR")
            }
            AppError::Upstream(_) => Presentation {
                status: 502,
                code: "UPSTREAM_ERROR",
                recoverable: false,
                hint: Some("Re-upload the clip to try again"),
                sensitive: false,
                level: LogLevel::Warn,
            },
            AppError::InvalidInput(_) => Presentation::client(
                400,
                "INVALID_INPUT",
                "Check request parameters and try again",
            ),
            AppError::NotFound(_) => {
                Presentation::client(404, "NOT_FOUND", "Verify the resource ID exists")
            }
            AppError::InvalidState(_) => Presentation::client(
                409,
                "INVALID_STATE",
                "Refresh the resource and check its status",
            ),
            AppError::Expired(_) => {
                Presentation::client(403, "LINK_EXPIRED", "Ask the team for a new link")
            }
            AppError::Forbidden(_) => {
                Presentation::client(403, "FORBIDDEN", "This action requires a coach account")
            }
            AppError::Unauthorized(_) => Presentation::client(
                401,
                "UNAUTHORIZED",
                "Check the authentication token or shared secret",
            ),
        }
    }

    /// Variant name, shown in non-production error bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::Upstream(_) => "Upstream",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidState(_) => "InvalidState",
            AppError::Expired(_) => "Expired",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// The error followed by its source chain, one cause per line.
    pub fn detailed_message(&self) -> String {
        const MAX_CAUSES: usize = 5;

        let mut out = self.to_string();
        let causes = std::iter::successors(std::error::Error::source(self), |e| e.source());
        for (depth, cause) in causes.enumerate() {
            if depth == MAX_CAUSES {
                out.push_str("\n  ... (truncated)");
                break;
            }
            out.push_str(&format!("\n  Caused by: {}", cause));
        }
        out
    }

    pub fn not_found(entity: &str, id: i64) -> Self {
        AppError::NotFound(format!("{} {} not found", entity, id))
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.presentation().status
    }

    fn error_code(&self) -> &'static str {
        self.presentation().code
    }

    fn is_recoverable(&self) -> bool {
        self.presentation().recoverable
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.presentation().hint
    }

    fn is_sensitive(&self) -> bool {
        self.presentation().sensitive
    }

    fn log_level(&self) -> LogLevel {
        self.presentation().level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            AppError::Upstream(msg)
            | AppError::InvalidInput(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidState(msg)
            | AppError::Expired(msg)
            | AppError::Forbidden(msg)
            | AppError::Unauthorized(msg) => msg.clone(),
        }
    }
}
