//! Domain records flowing between the reconciliation phases.
//!
//! The sea-orm mapper in `infra::storage::mapper` is the only place these are
//! converted to and from stored columns.

use roster_sdk::{AuthMethod, MemberSummary};
use time::OffsetDateTime;
use uuid::Uuid;

/// Role assigned to every member created by a roster upload.
pub const MEMBER_ROLE: &str = "member";

/// Status assigned to every member created by a roster upload.
pub const ACTIVE_STATUS: &str = "active";

/// An input row that passed validation.
///
/// Always has a non-empty `login_id` and `full_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEntry {
    /// Original 1-indexed row number.
    pub row: usize,
    pub full_name: String,
    pub full_name_ci: String,
    pub login_id: String,
    pub login_id_ci: String,
    pub auth_method: AuthMethod,
    pub email: Option<String>,
    pub auth_return_id: Option<String>,
    /// One-way hash of the temporary password, if one was supplied.
    pub password_hash: Option<String>,
}

impl NormalizedEntry {
    #[must_use]
    pub fn summary(&self) -> MemberSummary {
        MemberSummary {
            row: self.row,
            full_name: self.full_name.clone(),
            login_id: self.login_id.clone(),
            auth_method: self.auth_method,
            auth_method_label: self.auth_method.label().to_owned(),
            email: self.email.clone(),
        }
    }

    #[must_use]
    pub fn new_record(&self, org_id: Uuid, now: OffsetDateTime) -> NewMemberRecord {
        NewMemberRecord {
            id: Uuid::now_v7(),
            organization_id: org_id,
            login_id: self.login_id.clone(),
            login_id_ci: self.login_id_ci.clone(),
            full_name: self.full_name.clone(),
            full_name_ci: self.full_name_ci.clone(),
            email: self.email.clone(),
            auth_method: self.auth_method,
            auth_return_id: self.auth_return_id.clone(),
            password_hash: self.password_hash.clone(),
            created_at: now,
        }
    }

    #[must_use]
    pub fn changes(&self, now: OffsetDateTime) -> MemberChanges {
        MemberChanges {
            full_name: self.full_name.clone(),
            full_name_ci: self.full_name_ci.clone(),
            auth_method: self.auth_method,
            email: self.email.clone(),
            auth_return_id: self.auth_return_id.clone(),
            password_hash: self.password_hash.clone(),
            updated_at: now,
        }
    }
}

/// Snapshot of a stored member, as seen by the bulk lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingMember {
    pub id: Uuid,
    pub login_id: String,
    pub organization_id: Option<Uuid>,
}

impl ExistingMember {
    #[must_use]
    pub fn belongs_to(&self, org_id: Uuid) -> bool {
        self.organization_id == Some(org_id)
    }
}

/// A member to insert. Role and status are fixed to
/// [`MEMBER_ROLE`] / [`ACTIVE_STATUS`] by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemberRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub login_id: String,
    pub login_id_ci: String,
    pub full_name: String,
    pub full_name_ci: String,
    pub email: Option<String>,
    pub auth_method: AuthMethod,
    pub auth_return_id: Option<String>,
    pub password_hash: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Fields overwritten on an existing member. `None` optionals leave the
/// stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberChanges {
    pub full_name: String,
    pub full_name_ci: String,
    pub auth_method: AuthMethod,
    pub email: Option<String>,
    pub auth_return_id: Option<String>,
    pub password_hash: Option<String>,
    pub updated_at: OffsetDateTime,
}

/// Which stored member an update targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberFilter {
    /// Keyed by internal id, so a concurrent login ID change elsewhere cannot
    /// redirect the update.
    ById(Uuid),
    /// Only matches while the login ID is still owned by `org_id`.
    LoginIdInOrg { login_id: String, org_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberUpdate {
    pub filter: MemberFilter,
    pub changes: MemberChanges,
}
