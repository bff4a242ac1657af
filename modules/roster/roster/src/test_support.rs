#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Test doubles for the roster domain.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use roster_sdk::{AuthMethod, MemberEntry};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::model::{
    ExistingMember, MemberChanges, MemberFilter, MemberUpdate, NewMemberRecord,
};
use crate::domain::ports::{
    MemberStore, PasswordHashError, PasswordHasher, StoreError, UpdateOutcome, WriteFailure,
    WriteFailureKind,
};
use crate::domain::service::Service;

/// Same limit the members table enforces.
pub const MAX_FULL_NAME_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMember {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub login_id: String,
    pub full_name: String,
    pub full_name_ci: String,
    pub email: Option<String>,
    pub auth_method: AuthMethod,
    pub auth_return_id: Option<String>,
    pub password_hash: Option<String>,
    pub password_temp: bool,
    pub updated_at: Option<OffsetDateTime>,
}

impl StoredMember {
    fn from_record(r: NewMemberRecord) -> Self {
        Self {
            id: r.id,
            organization_id: Some(r.organization_id),
            login_id: r.login_id,
            full_name: r.full_name,
            full_name_ci: r.full_name_ci,
            email: r.email,
            auth_method: r.auth_method,
            auth_return_id: r.auth_return_id,
            password_temp: r.password_hash.is_some(),
            password_hash: r.password_hash,
            updated_at: None,
        }
    }

    fn apply(&mut self, changes: MemberChanges) {
        self.full_name = changes.full_name;
        self.full_name_ci = changes.full_name_ci;
        self.auth_method = changes.auth_method;
        if changes.email.is_some() {
            self.email = changes.email;
        }
        if changes.auth_return_id.is_some() {
            self.auth_return_id = changes.auth_return_id;
        }
        if changes.password_hash.is_some() {
            self.password_hash = changes.password_hash;
            self.password_temp = true;
        }
        self.updated_at = Some(changes.updated_at);
    }
}

pub type MemberTable = HashMap<Uuid, StoredMember>;

type TableHook = Box<dyn FnOnce(&mut MemberTable) + Send>;

#[derive(Default)]
struct State {
    members: MemberTable,
    org_names: HashMap<Uuid, String>,
    failing_logins: HashMap<String, String>,
    unavailable: bool,
    org_lookup_fails: bool,
    insert_delay: Option<Duration>,
    lookup_delay: Option<Duration>,
    before_insert: Option<TableHook>,
    after_update: Option<TableHook>,
    lookups: usize,
    insert_calls: usize,
    update_calls: usize,
    org_lookups: usize,
}

/// In-memory member store with failure and race injection.
#[derive(Default)]
pub struct InMemoryMemberStore {
    state: Mutex<State>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_org(&self, name: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.state.lock().org_names.insert(id, name.to_owned());
        id
    }

    pub fn seed(&self, login_id: &str, organization_id: Option<Uuid>, full_name: &str) -> Uuid {
        let member = stored(login_id, organization_id, full_name);
        let id = member.id;
        self.state.lock().members.insert(id, member);
        id
    }

    /// Every insert or update of `login_id` fails with `message`.
    pub fn fail_writes_for(&self, login_id: &str, message: &str) {
        self.state
            .lock()
            .failing_logins
            .insert(login_id.to_owned(), message.to_owned());
    }

    /// Runs `hook` against the table right before the next bulk insert is
    /// applied, simulating a concurrent writer.
    pub fn before_next_insert(&self, hook: impl FnOnce(&mut MemberTable) + Send + 'static) {
        self.state.lock().before_insert = Some(Box::new(hook));
    }

    /// Runs `hook` against the table right after the next bulk update was
    /// applied, before its outcomes reach the caller.
    pub fn after_next_update(&self, hook: impl FnOnce(&mut MemberTable) + Send + 'static) {
        self.state.lock().after_update = Some(Box::new(hook));
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    pub fn fail_org_lookups(&self) {
        self.state.lock().org_lookup_fails = true;
    }

    pub fn delay_inserts(&self, delay: Duration) {
        self.state.lock().insert_delay = Some(delay);
    }

    pub fn delay_lookups(&self, delay: Duration) {
        self.state.lock().lookup_delay = Some(delay);
    }

    pub fn member(&self, login_id: &str) -> Option<StoredMember> {
        self.state
            .lock()
            .members
            .values()
            .find(|m| m.login_id == login_id)
            .cloned()
    }

    pub fn member_count(&self) -> usize {
        self.state.lock().members.len()
    }

    pub fn lookups(&self) -> usize {
        self.state.lock().lookups
    }

    pub fn insert_calls(&self) -> usize {
        self.state.lock().insert_calls
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().update_calls
    }

    pub fn org_lookups(&self) -> usize {
        self.state.lock().org_lookups
    }

    fn check_available(state: &State) -> Result<(), StoreError> {
        if state.unavailable {
            return Err(StoreError::Unavailable("connection refused".to_owned()));
        }
        Ok(())
    }
}

/// A member row as another writer would have stored it.
pub fn stored(login_id: &str, organization_id: Option<Uuid>, full_name: &str) -> StoredMember {
    StoredMember {
        id: Uuid::now_v7(),
        organization_id,
        login_id: login_id.to_owned(),
        full_name: full_name.to_owned(),
        full_name_ci: full_name.to_lowercase(),
        email: None,
        auth_method: AuthMethod::Password,
        auth_return_id: None,
        password_hash: None,
        password_temp: false,
        updated_at: None,
    }
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn find_by_login_ids(
        &self,
        login_ids: &[String],
    ) -> Result<Vec<ExistingMember>, StoreError> {
        let delay = {
            let mut state = self.state.lock();
            Self::check_available(&state)?;
            state.lookups += 1;
            state.lookup_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock();
        Ok(state
            .members
            .values()
            .filter(|m| login_ids.contains(&m.login_id.to_lowercase()))
            .map(|m| ExistingMember {
                id: m.id,
                login_id: m.login_id.clone(),
                organization_id: m.organization_id,
            })
            .collect())
    }

    async fn insert_unordered(
        &self,
        records: Vec<NewMemberRecord>,
    ) -> Result<Vec<WriteFailure>, StoreError> {
        let delay = {
            let mut state = self.state.lock();
            Self::check_available(&state)?;
            state.insert_calls += 1;
            if let Some(hook) = state.before_insert.take() {
                hook(&mut state.members);
            }
            state.insert_delay
        };

        let mut failures = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let mut state = self.state.lock();
            let failure = |kind, message: &str| WriteFailure {
                index,
                kind,
                message: message.to_owned(),
            };
            if state
                .members
                .values()
                .any(|m| m.login_id.to_lowercase() == record.login_id)
            {
                failures.push(failure(
                    WriteFailureKind::Duplicate,
                    "UNIQUE constraint failed: members.login_id",
                ));
            } else if let Some(message) = state.failing_logins.get(&record.login_id) {
                failures.push(failure(WriteFailureKind::Other, message));
            } else if record.full_name.chars().count() > MAX_FULL_NAME_CHARS {
                failures.push(failure(
                    WriteFailureKind::Other,
                    "CHECK constraint failed: full_name",
                ));
            } else {
                let member = StoredMember::from_record(record);
                state.members.insert(member.id, member);
            }
        }
        Ok(failures)
    }

    async fn update_unordered(
        &self,
        updates: Vec<MemberUpdate>,
    ) -> Result<Vec<UpdateOutcome>, StoreError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        state.update_calls += 1;

        let mut outcomes = Vec::with_capacity(updates.len());
        for MemberUpdate { filter, changes } in updates {
            let target = match &filter {
                MemberFilter::ById(id) => state.members.get(id).map(|m| m.id),
                MemberFilter::LoginIdInOrg { login_id, org_id } => state
                    .members
                    .values()
                    .find(|m| {
                        m.login_id.to_lowercase() == *login_id && m.organization_id == Some(*org_id)
                    })
                    .map(|m| m.id),
            };
            let Some(id) = target else {
                outcomes.push(UpdateOutcome::Unmatched);
                continue;
            };

            let login_id = state.members[&id].login_id.clone();
            if let Some(message) = state.failing_logins.get(&login_id) {
                outcomes.push(UpdateOutcome::Failed {
                    message: message.clone(),
                });
            } else if changes.full_name.chars().count() > MAX_FULL_NAME_CHARS {
                outcomes.push(UpdateOutcome::Failed {
                    message: "CHECK constraint failed: full_name".to_owned(),
                });
            } else {
                state.members.get_mut(&id).unwrap().apply(changes);
                outcomes.push(UpdateOutcome::Matched);
            }
        }
        if let Some(hook) = state.after_update.take() {
            hook(&mut state.members);
        }
        Ok(outcomes)
    }

    async fn find_organization_names(
        &self,
        org_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, String>, StoreError> {
        let mut state = self.state.lock();
        state.org_lookups += 1;
        if state.org_lookup_fails {
            return Err(StoreError::Other("organizations table locked".to_owned()));
        }
        Ok(org_ids
            .iter()
            .filter_map(|id| state.org_names.get(id).map(|name| (*id, name.clone())))
            .collect())
    }
}

/// Prefixes every value with `hashed:`; fails for the configured plaintext.
#[derive(Default)]
pub struct FakeHasher {
    fail_on: Option<String>,
}

impl FakeHasher {
    pub fn failing_on(plaintext: &str) -> Self {
        Self {
            fail_on: Some(plaintext.to_owned()),
        }
    }
}

impl PasswordHasher for FakeHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        if self.fail_on.as_deref() == Some(plaintext) {
            return Err(PasswordHashError("entropy source exhausted".to_owned()));
        }
        Ok(format!("hashed:{plaintext}"))
    }
}

/// Sleeps for a fixed time per hash, standing in for an expensive bcrypt cost.
pub struct SlowHasher {
    per_hash: Duration,
    calls: AtomicUsize,
}

impl SlowHasher {
    pub fn new(per_hash: Duration) -> Self {
        Self {
            per_hash,
            calls: AtomicUsize::new(0),
        }
    }

    /// Hashes started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PasswordHasher for SlowHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.per_hash);
        Ok(format!("slow:{plaintext}"))
    }
}

pub fn service(store: &Arc<InMemoryMemberStore>) -> Service<InMemoryMemberStore> {
    Service::new(Arc::clone(store), Arc::new(FakeHasher::default()))
}

pub fn entry(full_name: &str, login_id: &str, auth_method: &str) -> MemberEntry {
    MemberEntry {
        full_name: full_name.to_owned(),
        login_id: login_id.to_owned(),
        auth_method: auth_method.to_owned(),
        email: None,
        auth_return_id: None,
        temp_password: None,
    }
}
