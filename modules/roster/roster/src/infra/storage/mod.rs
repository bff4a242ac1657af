//! Member persistence with `SeaORM`.
//!
//! - `entity/` - `members` and `organizations` tables
//! - `mapper.rs` - conversions between domain records and `SeaORM` models
//! - `migrations/` - schema, including the case-insensitive unique index on
//!   `members.login_id` the race reconciliation relies on

pub mod entity;
pub mod mapper;
pub mod migrations;

mod sea_orm_store;

pub use sea_orm_store::SeaOrmMemberStore;

use anyhow::Context;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::config::DatabaseConfig;

/// Open the pool and bring the schema up to date.
///
/// # Errors
/// Returns an error if the database cannot be reached or a migration fails.
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.url.clone());
    // every in-memory sqlite connection is a separate database
    let max_connections = if config.url.contains(":memory:") {
        1
    } else {
        config.max_connections
    };
    options.max_connections(max_connections).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .with_context(|| format!("failed to connect to member database at {}", config.url))?;
    migrations::Migrator::up(&db, None)
        .await
        .context("failed to run roster migrations")?;
    Ok(db)
}
