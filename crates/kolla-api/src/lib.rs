//! Kolla HTTP API
//!
//! Handlers, middleware and application setup for the clip ingestion service.

pub mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod middleware;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
