use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, SqlErr};
use uuid::Uuid;

use crate::domain::model::{ExistingMember, MemberUpdate, NewMemberRecord};
use crate::domain::ports::{
    MemberStore, StoreError, UpdateOutcome, WriteFailure, WriteFailureKind,
};

use super::entity::{member, organization};
use super::mapper::{filter_condition, lower_login_id};

/// `SeaORM` implementation of [`MemberStore`].
///
/// Bulk writes issue one statement per item outside any transaction, so a
/// failing item never rolls back the others.
pub struct SeaOrmMemberStore {
    db: DatabaseConnection,
}

impl SeaOrmMemberStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn is_unavailable(e: &DbErr) -> bool {
    matches!(e, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}

fn store_error(e: &DbErr) -> StoreError {
    if is_unavailable(e) {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Other(e.to_string())
    }
}

fn failure_kind(e: &DbErr) -> WriteFailureKind {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        WriteFailureKind::Duplicate
    } else {
        WriteFailureKind::Other
    }
}

#[async_trait]
impl MemberStore for SeaOrmMemberStore {
    async fn find_by_login_ids(
        &self,
        login_ids: &[String],
    ) -> Result<Vec<ExistingMember>, StoreError> {
        if login_ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = member::Entity::find()
            .filter(lower_login_id().is_in(login_ids.iter().map(String::as_str)))
            .all(&self.db)
            .await
            .map_err(|e| store_error(&e))?;
        Ok(found.into_iter().map(Into::into).collect())
    }

    async fn insert_unordered(
        &self,
        records: Vec<NewMemberRecord>,
    ) -> Result<Vec<WriteFailure>, StoreError> {
        let mut failures = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            let model = member::ActiveModel::from(record);
            if let Err(e) = member::Entity::insert(model)
                .exec_without_returning(&self.db)
                .await
            {
                if is_unavailable(&e) {
                    return Err(store_error(&e));
                }
                failures.push(WriteFailure {
                    index,
                    kind: failure_kind(&e),
                    message: e.to_string(),
                });
            }
        }
        Ok(failures)
    }

    async fn update_unordered(
        &self,
        updates: Vec<MemberUpdate>,
    ) -> Result<Vec<UpdateOutcome>, StoreError> {
        let mut outcomes = Vec::with_capacity(updates.len());
        for MemberUpdate { filter, changes } in updates {
            let result = member::Entity::update_many()
                .set(member::ActiveModel::from(changes))
                .filter(filter_condition(&filter))
                .exec(&self.db)
                .await;
            outcomes.push(match result {
                Ok(r) if r.rows_affected == 0 => UpdateOutcome::Unmatched,
                Ok(_) => UpdateOutcome::Matched,
                Err(e) if is_unavailable(&e) => return Err(store_error(&e)),
                Err(e) => UpdateOutcome::Failed {
                    message: e.to_string(),
                },
            });
        }
        Ok(outcomes)
    }

    async fn find_organization_names(
        &self,
        org_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, String>, StoreError> {
        if org_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let found = organization::Entity::find()
            .filter(organization::Column::Id.is_in(org_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(|e| store_error(&e))?;
        Ok(found.into_iter().map(|o| (o.id, o.name)).collect())
    }
}
