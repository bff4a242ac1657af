//! Roster SDK
//!
//! This crate provides the public API for the `roster` module:
//!
//! - [`RosterClientV1`] - Public API trait for consumers (upload handlers)
//! - [`MemberEntry`], [`AuthMethod`] - Batch input models
//! - [`UpsertBatchResult`] and its per-row outcome types
//! - [`RosterError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use roster_sdk::{MemberEntry, RosterClientV1};
//!
//! let result = roster.upsert_members_in_org(org_id, entries, None).await?;
//! for err in &result.item_errors {
//!     println!("row {}: {}", err.row, err.kind);
//! }
//! ```

pub mod api;
pub mod errors;
pub mod models;

pub use api::RosterClientV1;
pub use errors::RosterError;
pub use models::{
    AuthMethod, ItemError, ItemErrorKind, MemberEntry, MemberSummary, SkippedMember,
    UnknownAuthMethod, UpsertBatchResult,
};
