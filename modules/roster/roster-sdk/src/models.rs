//! Public models for the roster module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the roster module and its consumers (CSV upload handlers).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Input
// ============================================================================

/// Authentication method of a member account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Trust,
    Password,
    Email,
    Google,
    Microsoft,
    Clever,
    Classlink,
    Schoology,
}

impl AuthMethod {
    pub const ALL: [Self; 8] = [
        Self::Trust,
        Self::Password,
        Self::Email,
        Self::Google,
        Self::Microsoft,
        Self::Clever,
        Self::Classlink,
        Self::Schoology,
    ];

    /// Value stored in the member record.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trust => "trust",
            Self::Password => "password",
            Self::Email => "email",
            Self::Google => "google",
            Self::Microsoft => "microsoft",
            Self::Clever => "clever",
            Self::Classlink => "classlink",
            Self::Schoology => "schoology",
        }
    }

    /// Name shown to operators.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Trust => "Trust",
            Self::Password => "Password",
            Self::Email => "Email Verification",
            Self::Google => "Google",
            Self::Microsoft => "Microsoft",
            Self::Clever => "Clever",
            Self::Classlink => "Classlink",
            Self::Schoology => "Schoology",
        }
    }

    /// Methods where the email address is the login identity.
    #[must_use]
    pub const fn email_is_login(self) -> bool {
        matches!(self, Self::Email | Self::Google | Self::Microsoft)
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown auth method '{0}'")]
pub struct UnknownAuthMethod(pub String);

impl FromStr for AuthMethod {
    type Err = UnknownAuthMethod;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownAuthMethod(wanted.to_owned()))
    }
}

/// A member row to create or update, as tokenized by the CSV parser.
///
/// Fields are raw; normalization happens inside the module.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemberEntry {
    pub full_name: String,
    /// Effective login identity (required).
    pub login_id: String,
    /// One of the [`AuthMethod`] values (required).
    pub auth_method: String,
    pub email: Option<String>,
    /// Correlation id for clever/classlink/schoology.
    pub auth_return_id: Option<String>,
    /// Plain text temporary password for password auth. Hashed before storage.
    pub temp_password: Option<String>,
}

// ============================================================================
// Output
// ============================================================================

/// Basic member info for result display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    /// Original 1-indexed row number.
    pub row: usize,
    pub full_name: String,
    pub login_id: String,
    pub auth_method: AuthMethod,
    /// Display label of `auth_method`.
    pub auth_method_label: String,
    pub email: Option<String>,
}

/// A member that was not written because its login ID belongs to another
/// organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedMember {
    pub row: usize,
    pub login_id: String,
    /// Display name of the organization owning the login ID.
    pub org_name: String,
    pub reason: String,
}

impl SkippedMember {
    pub const REASON: &'static str = "login ID exists in a different organization";
}

/// Why a row failed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemErrorKind {
    #[error("missing login ID and name")]
    MissingLoginIdAndName,

    #[error("missing login ID")]
    MissingLoginId,

    #[error("missing name")]
    MissingName,

    #[error("invalid auth method '{value}'")]
    InvalidAuthMethod { value: String },

    #[error("failed to hash password")]
    PasswordHashFailed,

    #[error("duplicate of row {first_row}")]
    DuplicateInBatch { first_row: usize },

    #[error("database error: {message}")]
    InsertFailed { message: String },

    #[error("update failed: {message}")]
    UpdateFailed { message: String },

    #[error("record changed concurrently; resubmit the row")]
    ConcurrentChange,

    #[error("timed out before the write was attempted")]
    TimedOutBeforeAttempt,

    #[error("timed out before the write was confirmed")]
    TimedOutUnconfirmed,
}

/// Per-row error during batch processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    /// Original 1-indexed row number.
    pub row: usize,
    /// Normalized login ID, or the raw value when normalization failed.
    pub login_id: String,
    pub kind: ItemErrorKind,
}

impl ItemError {
    #[must_use]
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }
}

/// Result of a batch upsert with per-row tracking.
///
/// Each input row appears in exactly one of `created_members`,
/// `updated_members`, `skipped_members` and `item_errors`, all ordered by row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpsertBatchResult {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,

    pub created_members: Vec<MemberSummary>,
    pub updated_members: Vec<MemberSummary>,
    pub skipped_members: Vec<SkippedMember>,
    pub item_errors: Vec<ItemError>,
}

impl UpsertBatchResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.item_errors.is_empty()
    }

    /// Number of rows accounted for across all outcome lists.
    #[must_use]
    pub fn rows_accounted(&self) -> usize {
        self.created_members.len()
            + self.updated_members.len()
            + self.skipped_members.len()
            + self.item_errors.len()
    }

    /// Row error for `row`, if that row failed.
    #[must_use]
    pub fn error_for_row(&self, row: usize) -> Option<&ItemError> {
        self.item_errors.iter().find(|e| e.row == row)
    }
}
