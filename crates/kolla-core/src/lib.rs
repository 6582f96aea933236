//! Kolla Core Library
//!
//! Domain models, error types, configuration and validation shared by every
//! Kolla component.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{
    BaseConfig, Config, IngestConfig, StorageBackend, TranscoderKind, TranscodingSettings,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Actor, TeamRole};
