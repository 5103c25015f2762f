//! HTTP API.
//!
//! Exposes the record, roster, dashboard and export operations as JSON
//! endpoints under `/api/`. `api_router()` returns a composable `Router`
//! that can be mounted on any axum server; `start_server()` binds and runs it.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_server, ApiServer, ServerError, ServerSession};
pub use types::{ApiContext, Viewer};
