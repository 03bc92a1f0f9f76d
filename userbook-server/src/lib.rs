//! userbook-server: HTTP JSON API over users and their postal addresses
//!
//! Layers, leaf first:
//! - [`db`]: connection pool, schema bootstrap, listing filter, user stores
//! - [`models`]: request/row types and pagination
//! - [`http`]: axum router, handlers and error mapping

pub mod db;
pub mod http;
pub mod models;

pub use db::{DbError, MemoryUserStore, PgUserStore, UserFilter, UserStore};
pub use http::{run_server, AppState, ServerConfig};
