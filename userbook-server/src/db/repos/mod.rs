//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Uses JOINs for list operations (no N+1)
//! - Returns identities with RETURNING (never a follow-up MAX(id))
//! - Uses transactions for multi-step operations

pub mod users;

pub use users::PgUserStore;
