//! Kolla persistence layer
//!
//! Repositories over an embedded SQLite database. Every query is scoped by team
//! unless it serves a machine caller (callbacks, webhooks, operator CLI).

pub mod db;

pub use db::*;
pub use sqlx::sqlite::SqlitePool;

/// Embedded schema migrations from the workspace `migrations/` directory.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
