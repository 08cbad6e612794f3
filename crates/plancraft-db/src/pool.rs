//! Connecting, creating, and migrating the plancraft database.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/plancraft-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Tables owned by plancraft, parents before children.
pub const TABLES: [&str; 3] = ["plans", "plan_items", "item_resources"];

const POOL_SIZE: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await
        .with_context(|| format!("failed to connect to database at {url}"))
}

/// Open the connection pool used by the CLI commands.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    connect(&config.database_url, POOL_SIZE).await
}

/// Bring the schema up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!(migrations = MIGRATOR.iter().count(), "schema up to date");
    Ok(())
}

/// Create the configured database on its server when it is missing.
///
/// The name is interpolated into `CREATE DATABASE`, so only ASCII
/// alphanumerics and `_` are accepted.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let Some(db_name) = config.database_name() else {
        bail!("database URL {:?} does not name a database", config.database_url);
    };
    if !db_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("database name {db_name:?} contains invalid characters");
    }

    let maintenance = connect(&config.maintenance_url(), 1).await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maintenance)
            .await
            .context("failed to query pg_database")?;

    let created = if exists {
        debug!(db = db_name, "database present");
        Ok(())
    } else {
        maintenance
            .execute(format!("CREATE DATABASE {db_name}").as_str())
            .await
            .map(|_| info!(db = db_name, "database created"))
            .with_context(|| format!("failed to create database {db_name}"))
    };

    maintenance.close().await;
    created
}

/// Row count of each table in [`TABLES`], in that order.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table, count));
    }
    Ok(counts)
}
