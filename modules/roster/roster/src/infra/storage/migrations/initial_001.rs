use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let conn = manager.get_connection();

        // login_id is globally unique, ignoring case: it is what concurrent
        // uploads race on. MySQL's default collation already ignores case.
        let sql = match backend {
            sea_orm::DatabaseBackend::Postgres => {
                r"
CREATE TABLE IF NOT EXISTS organizations (
    id UUID PRIMARY KEY NOT NULL,
    name VARCHAR(255) NOT NULL
);

CREATE TABLE IF NOT EXISTS members (
    id UUID PRIMARY KEY NOT NULL,
    organization_id UUID NULL,
    login_id VARCHAR(255) NOT NULL,
    login_id_ci VARCHAR(255) NOT NULL,
    full_name VARCHAR(255) NOT NULL CHECK (char_length(full_name) <= 200),
    full_name_ci VARCHAR(255) NOT NULL,
    email VARCHAR(255) NULL,
    auth_method VARCHAR(32) NOT NULL,
    auth_return_id VARCHAR(255) NULL,
    password_hash VARCHAR(255) NULL,
    password_temp BOOLEAN NOT NULL DEFAULT FALSE,
    role VARCHAR(32) NOT NULL,
    status VARCHAR(32) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_members_login_id ON members(login_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_members_login_id_lower ON members(LOWER(login_id));
CREATE INDEX IF NOT EXISTS idx_members_org_name ON members(organization_id, full_name_ci);
                "
            }
            sea_orm::DatabaseBackend::MySql => {
                r"
CREATE TABLE IF NOT EXISTS organizations (
    id VARCHAR(36) PRIMARY KEY NOT NULL,
    name VARCHAR(255) NOT NULL
);

CREATE TABLE IF NOT EXISTS members (
    id VARCHAR(36) PRIMARY KEY NOT NULL,
    organization_id VARCHAR(36) NULL,
    login_id VARCHAR(255) NOT NULL,
    login_id_ci VARCHAR(255) NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    full_name_ci VARCHAR(255) NOT NULL,
    email VARCHAR(255) NULL,
    auth_method VARCHAR(32) NOT NULL,
    auth_return_id VARCHAR(255) NULL,
    password_hash VARCHAR(255) NULL,
    password_temp BOOLEAN NOT NULL DEFAULT FALSE,
    role VARCHAR(32) NOT NULL,
    status VARCHAR(32) NOT NULL,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL,
    UNIQUE KEY idx_members_login_id (login_id),
    KEY idx_members_org_name (organization_id, full_name_ci),
    CONSTRAINT chk_members_full_name CHECK (CHAR_LENGTH(full_name) <= 200)
);
                "
            }
            sea_orm::DatabaseBackend::Sqlite => {
                r"
CREATE TABLE IF NOT EXISTS organizations (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS members (
    id TEXT PRIMARY KEY NOT NULL,
    organization_id TEXT NULL,
    login_id TEXT NOT NULL,
    login_id_ci TEXT NOT NULL,
    full_name TEXT NOT NULL CHECK (length(full_name) <= 200),
    full_name_ci TEXT NOT NULL,
    email TEXT NULL,
    auth_method TEXT NOT NULL,
    auth_return_id TEXT NULL,
    password_hash TEXT NULL,
    password_temp INTEGER NOT NULL DEFAULT 0,
    role TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_members_login_id ON members(login_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_members_login_id_lower ON members(LOWER(login_id));
CREATE INDEX IF NOT EXISTS idx_members_org_name ON members(organization_id, full_name_ci);
                "
            }
        };

        conn.execute_unprepared(sql).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        let sql = "DROP TABLE IF EXISTS members; DROP TABLE IF EXISTS organizations;";
        conn.execute_unprepared(sql).await?;
        Ok(())
    }
}
