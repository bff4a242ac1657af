//! Roster Module Implementation
//!
//! Batch reconciliation of member rosters into the member store. The public
//! API is defined in `roster-sdk` and re-exported here.

pub use roster_sdk::{
    AuthMethod, ItemError, ItemErrorKind, MemberEntry, MemberSummary, RosterClientV1, RosterError,
    SkippedMember, UpsertBatchResult,
};

pub mod module;
pub use module::RosterModule;

pub mod local_client;

#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;

#[cfg(test)]
mod test_support;
