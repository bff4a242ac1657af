#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Test support for roster integration tests: in-memory `SQLite`, seeding
//! helpers and a store decorator that simulates concurrent writers.

#![allow(dead_code)] // not every test binary uses every helper

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use roster::config::DatabaseConfig;
use roster::domain::model::{ExistingMember, MemberUpdate, NewMemberRecord};
use roster::domain::ports::{
    MemberStore, PasswordHashError, PasswordHasher, StoreError, UpdateOutcome, WriteFailure,
};
use roster::domain::service::Service;
use roster::infra::storage::entity::{member, organization};
use roster::infra::storage::{self, SeaOrmMemberStore};
use roster::MemberEntry;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use time::OffsetDateTime;
use uuid::Uuid;

pub async fn inmem_db() -> DatabaseConnection {
    storage::connect(&DatabaseConfig::default())
        .await
        .expect("Failed to open in-memory database")
}

pub async fn seed_org(db: &DatabaseConnection, name: &str) -> Uuid {
    let id = Uuid::now_v7();
    organization::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
    }
    .insert(db)
    .await
    .expect("Failed to seed organization");
    id
}

pub fn member_row(login_id: &str, org: Option<Uuid>, full_name: &str) -> member::ActiveModel {
    let now = OffsetDateTime::now_utc();
    member::ActiveModel {
        id: Set(Uuid::now_v7()),
        organization_id: Set(org),
        login_id: Set(login_id.to_owned()),
        login_id_ci: Set(login_id.to_lowercase()),
        full_name: Set(full_name.to_owned()),
        full_name_ci: Set(full_name.to_lowercase()),
        email: Set(None),
        auth_method: Set("password".to_owned()),
        auth_return_id: Set(None),
        password_hash: Set(None),
        password_temp: Set(false),
        role: Set("member".to_owned()),
        status: Set("active".to_owned()),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

pub async fn seed_member(
    db: &DatabaseConnection,
    login_id: &str,
    org: Option<Uuid>,
    full_name: &str,
) -> Uuid {
    member_row(login_id, org, full_name)
        .insert(db)
        .await
        .expect("Failed to seed member")
        .id
}

pub async fn find_member(db: &DatabaseConnection, login_id: &str) -> Option<member::Model> {
    member::Entity::find()
        .filter(member::Column::LoginId.eq(login_id))
        .one(db)
        .await
        .expect("Failed to query member")
}

pub async fn count_members(db: &DatabaseConnection) -> usize {
    member::Entity::find().all(db).await.unwrap().len()
}

pub fn entry(full_name: &str, login_id: &str, auth_method: &str) -> MemberEntry {
    MemberEntry {
        full_name: full_name.to_owned(),
        login_id: login_id.to_owned(),
        auth_method: auth_method.to_owned(),
        ..MemberEntry::default()
    }
}

pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        Ok(format!("plain:{plaintext}"))
    }
}

/// Wraps the real store and writes `race_row` straight to the database right
/// before the next bulk insert, as a concurrent upload would.
pub struct RacingStore {
    inner: SeaOrmMemberStore,
    db: DatabaseConnection,
    race_row: Mutex<Option<member::ActiveModel>>,
}

impl RacingStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            inner: SeaOrmMemberStore::new(db.clone()),
            db,
            race_row: Mutex::new(None),
        }
    }

    pub fn race_next_insert_with(&self, row: member::ActiveModel) {
        *self.race_row.lock() = Some(row);
    }
}

#[async_trait]
impl MemberStore for RacingStore {
    async fn find_by_login_ids(
        &self,
        login_ids: &[String],
    ) -> Result<Vec<ExistingMember>, StoreError> {
        self.inner.find_by_login_ids(login_ids).await
    }

    async fn insert_unordered(
        &self,
        records: Vec<NewMemberRecord>,
    ) -> Result<Vec<WriteFailure>, StoreError> {
        let row = self.race_row.lock().take();
        if let Some(row) = row {
            row.insert(&self.db).await.expect("Failed to insert racing row");
        }
        self.inner.insert_unordered(records).await
    }

    async fn update_unordered(
        &self,
        updates: Vec<MemberUpdate>,
    ) -> Result<Vec<UpdateOutcome>, StoreError> {
        self.inner.update_unordered(updates).await
    }

    async fn find_organization_names(
        &self,
        org_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, String>, StoreError> {
        self.inner.find_organization_names(org_ids).await
    }
}

pub fn racing_service(db: &DatabaseConnection) -> (Arc<RacingStore>, Service<RacingStore>) {
    let store = Arc::new(RacingStore::new(db.clone()));
    let service = Service::new(Arc::clone(&store), Arc::new(PlainHasher));
    (store, service)
}

pub fn sqlite_service(db: &DatabaseConnection) -> Service<SeaOrmMemberStore> {
    Service::new(
        Arc::new(SeaOrmMemberStore::new(db.clone())),
        Arc::new(PlainHasher),
    )
}
