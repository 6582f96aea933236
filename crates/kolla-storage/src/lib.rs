//! Kolla Storage Library
//!
//! Object store gateway for clip originals and HLS renditions. Clients never
//! stream video through the service: uploads go to presigned PUT URLs and
//! playback reads from presigned GET URLs.
//!
//! # Storage key format
//!
//! - Originals: `originals/{team_id}/{event_id}/{uuid}.{ext}`
//! - HLS renditions: `hls/{team_id}/{event_id}/{clip_id}/` (prefix, trailing slash)
//!
//! Keys must not contain `..` or a leading `/`. Key generation lives in the
//! `keys` module so every backend and service agrees on the layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use kolla_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageOp, StorageResult};
