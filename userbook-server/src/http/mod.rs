//! HTTP server layer
//!
//! Axum server with:
//! - CORS (localhost only by default)
//! - Request tracing
//! - Graceful shutdown
//! - JSON error responses

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, Operation};
pub use server::{build_router, run_server, ServerConfig, ServerError};
pub use state::AppState;
