//! HTTP server command
//!
//! Builds the store (Postgres pool or in-memory), ensures the schema and
//! runs the server until shutdown.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;

use userbook_server::db::pool::{create_pool_with_options, DEFAULT_MAX_CONNECTIONS};
use userbook_server::db::schema;
use userbook_server::{run_server, AppState, MemoryUserStore, PgUserStore, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', default_value = "127.0.0.1:3030")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Keep records in process memory instead of Postgres (lost on exit).
    /// Any database URL is ignored.
    #[arg(long)]
    pub in_memory: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let state = if args.in_memory {
        tracing::warn!("Serving from in-memory store; records are lost on exit");
        AppState::new(MemoryUserStore::new())
    } else {
        let database_url = args
            .database_url
            .as_deref()
            .context("DATABASE_URL not set. Set via --database-url or DATABASE_URL env, or pass --in-memory")?;

        let pool = create_pool_with_options(database_url, args.max_connections)
            .await
            .context("Failed to create database pool")?;
        schema::ensure(&pool)
            .await
            .context("Failed to create users/addresses tables")?;

        AppState::new(PgUserStore::new(pool))
    };

    tracing::info!("Starting userbook server on {}", args.bind);

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
    };

    // Blocks until shutdown
    run_server(state, config).await.context("Server error")?;

    Ok(())
}
