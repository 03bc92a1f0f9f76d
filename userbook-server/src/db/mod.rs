//! Storage layer - connection pool, schema and user store
//!
//! # Design Principles
//!
//! - Connection pool (max 5 connections) - no Arc<Mutex<Connection>>
//! - Listing uses a single LEFT JOIN - no N+1 queries
//! - Filters are bound parameters - never string-built SQL
//! - Transactions for every multi-table write

pub mod filter;
pub mod memory;
pub mod pool;
pub mod repos;
pub mod schema;
pub mod store;

pub use filter::UserFilter;
pub use memory::MemoryUserStore;
pub use pool::{create_pool, create_pool_with_options};
pub use repos::PgUserStore;
pub use store::{DbError, UserStore};
