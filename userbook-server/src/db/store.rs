//! The user store seam between HTTP handlers and storage

use async_trait::async_trait;

use crate::db::UserFilter;
use crate::models::{NewUser, Paginated, Pagination, UserId, UserRow, UserUpdate};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// A value the store cannot hold, e.g. a birthdate that is not a date
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl DbError {
    pub(crate) fn user_not_found(id: UserId) -> Self {
        Self::NotFound {
            resource: "User",
            id: id.to_string(),
        }
    }
}

/// Storage operations behind the `/users` resource.
///
/// Every multi-table write is all-or-nothing: on error nothing it touched
/// remains changed.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// One page of users left-joined with their address, plus the number
    /// of users matching `filter`.
    async fn list(
        &self,
        filter: &UserFilter,
        page: Pagination,
    ) -> Result<Paginated<UserRow>, DbError>;

    /// Insert a user and, when any address field is non-empty, its address.
    /// Returns the new user's id.
    async fn create(&self, user: &NewUser) -> Result<UserId, DbError>;

    /// Update a user and upsert its address when one is supplied.
    ///
    /// Returns [`DbError::NotFound`] without mutating anything when the user
    /// does not exist.
    async fn update(&self, id: UserId, changes: &UserUpdate) -> Result<(), DbError>;

    /// Delete a user together with its address rows.
    async fn delete(&self, id: UserId) -> Result<(), DbError>;
}
