//! Transcoding provider adapters
//!
//! A provider turns an original upload into an HLS rendition. The service talks
//! to exactly one provider, chosen at startup, through the
//! [`TranscodingProvider`] trait. Each provider also knows how to authenticate
//! and parse its own webhook payloads into a canonical [`JobUpdate`].

pub mod factory;
pub mod http_provider;
pub mod job;
pub mod local;
pub mod provider;
pub mod status;
pub mod webhook;

pub use factory::create_provider;
pub use http_provider::HttpProvider;
pub use job::{JobDestination, JobUpdate, SubmitJob, SubmittedJob};
pub use local::LocalProvider;
pub use provider::{ProviderError, TranscodingProvider};
pub use status::{map_provider_status, JobStatus};
pub use webhook::{HttpWebhookPayload, LocalWebhookPayload, ProviderWebhook, WebhookBody};
