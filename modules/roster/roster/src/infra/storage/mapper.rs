//! Conversions between domain records and `SeaORM` models.

use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, Condition};

use crate::domain::model::{
    ACTIVE_STATUS, ExistingMember, MEMBER_ROLE, MemberChanges, MemberFilter, NewMemberRecord,
};
use crate::infra::storage::entity::member;

impl From<member::Model> for ExistingMember {
    fn from(m: member::Model) -> Self {
        Self {
            id: m.id,
            login_id: m.login_id,
            organization_id: m.organization_id,
        }
    }
}

impl From<NewMemberRecord> for member::ActiveModel {
    fn from(r: NewMemberRecord) -> Self {
        Self {
            id: Set(r.id),
            organization_id: Set(Some(r.organization_id)),
            login_id: Set(r.login_id),
            login_id_ci: Set(r.login_id_ci),
            full_name: Set(r.full_name),
            full_name_ci: Set(r.full_name_ci),
            email: Set(r.email),
            auth_method: Set(r.auth_method.as_str().to_owned()),
            auth_return_id: Set(r.auth_return_id),
            password_temp: Set(r.password_hash.is_some()),
            password_hash: Set(r.password_hash),
            role: Set(MEMBER_ROLE.to_owned()),
            status: Set(ACTIVE_STATUS.to_owned()),
            created_at: Set(r.created_at),
            updated_at: Set(r.created_at),
        }
    }
}

/// Only the columns an update may touch are set; absent optionals keep the
/// stored value.
impl From<MemberChanges> for member::ActiveModel {
    fn from(c: MemberChanges) -> Self {
        let (password_hash, password_temp) = match c.password_hash {
            Some(hash) => (Set(Some(hash)), Set(true)),
            None => (NotSet, NotSet),
        };
        Self {
            id: NotSet,
            organization_id: NotSet,
            login_id: NotSet,
            login_id_ci: NotSet,
            full_name: Set(c.full_name),
            full_name_ci: Set(c.full_name_ci),
            email: c.email.map_or(NotSet, |e| Set(Some(e))),
            auth_method: Set(c.auth_method.as_str().to_owned()),
            auth_return_id: c.auth_return_id.map_or(NotSet, |id| Set(Some(id))),
            password_hash,
            password_temp,
            role: NotSet,
            status: NotSet,
            created_at: NotSet,
            updated_at: Set(c.updated_at),
        }
    }
}

/// `LOWER(login_id)`. Login IDs are matched case-insensitively so records
/// stored with mixed case before normalization still resolve.
#[must_use]
pub fn lower_login_id() -> Expr {
    Expr::expr(Func::lower(Expr::col(member::Column::LoginId)))
}

#[must_use]
pub fn filter_condition(filter: &MemberFilter) -> Condition {
    match filter {
        MemberFilter::ById(id) => Condition::all().add(member::Column::Id.eq(*id)),
        MemberFilter::LoginIdInOrg { login_id, org_id } => Condition::all()
            .add(lower_login_id().eq(login_id.as_str()))
            .add(member::Column::OrganizationId.eq(*org_id)),
    }
}
