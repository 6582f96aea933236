//! Database repositories for data access layer
//!
//! Each repository owns one aggregate and hands back `kolla_core` models.
//! Status updates are conditional on the predecessor state and report whether
//! a row moved, so callers can tell a stale callback from a missing clip.

pub mod clip;
pub mod comment;
pub mod event;
pub mod links;
pub mod playlist;
pub mod pool;
mod rows;
pub mod segment;
pub mod team;

pub use clip::ClipRepository;
pub use comment::CommentRepository;
pub use event::EventRepository;
pub use links::{ShareLinkRepository, UploadLinkRepository};
pub use playlist::PlaylistRepository;
pub use pool::{connect, memory_pool, ping};
pub use segment::{SegmentFields, SegmentRepository};
pub use team::TeamRepository;
