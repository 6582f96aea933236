//! Kolla Services Layer
//!
//! Business rules for the clip pipeline and the review surfaces around it.
//! Services take an [`Actor`](kolla_core::Actor) for anything team-scoped and
//! return `AppError`; HTTP concerns stay in `kolla-api`.

pub mod approval;
pub mod clips;
pub mod comments;
pub mod events;
pub mod lifecycle;
pub mod links;
pub mod playlists;
pub mod segments;
pub mod settings;
pub mod tokens;
pub mod transcoding;
pub mod uploads;
pub mod webhook;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use approval::ApprovalService;
pub use clips::ClipService;
pub use comments::CommentService;
pub use events::EventService;
pub use lifecycle::ClipLifecycle;
pub use links::{
    ShareLinkService, SharedContent, SharedPlaylistItem, UploadLinkInfo, UploadLinkService,
};
pub use playlists::PlaylistService;
pub use segments::SegmentService;
pub use settings::ServiceSettings;
pub use transcoding::TranscodingService;
pub use uploads::UploadService;
pub use webhook::{WebhookOutcome, WebhookReceiver};

pub use kolla_storage::{create_storage, Storage, StorageError};
pub use kolla_transcoding::{create_provider, TranscodingProvider};
