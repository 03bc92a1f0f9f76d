//! Postgres pool for the user store
//!
//! One pool per process, shared by every handler through `PgUserStore`.
//! A limit of zero would make every checkout wait forever, so it is raised
//! to one connection.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Pool size used by `userbook serve` unless `--max-connections` says otherwise.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new().max_connections(max_connections.max(1))
}

/// Connect with [`DEFAULT_MAX_CONNECTIONS`].
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/userbook").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Connect with at most `max_connections` (minimum one) open connections.
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let options = pool_options(max_connections);
    tracing::debug!(
        max_connections = options.get_max_connections(),
        "Opening database pool"
    );
    options.connect(database_url).await
}
