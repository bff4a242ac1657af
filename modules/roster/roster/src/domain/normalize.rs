//! Field normalization for roster rows. Pure functions, no I/O besides the
//! injected password hasher.

use roster_sdk::{AuthMethod, ItemError, ItemErrorKind, MemberEntry};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::model::NormalizedEntry;
use super::ports::PasswordHasher;

/// Case- and diacritic-insensitive form used for sorting and searching.
#[must_use]
pub fn fold(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[must_use]
pub fn login_id(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[must_use]
pub fn name(raw: &str) -> String {
    raw.trim().to_owned()
}

#[must_use]
pub fn email(raw: Option<&str>) -> Option<String> {
    raw.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty())
}

fn trimmed(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Extract the normalized login ID of a row.
///
/// # Errors
/// Returns the row error when the login ID (and possibly the name) is missing.
pub fn identity(row: usize, entry: &MemberEntry) -> Result<String, ItemError> {
    let login_id = login_id(&entry.login_id);
    if !login_id.is_empty() {
        return Ok(login_id);
    }
    let kind = if name(&entry.full_name).is_empty() {
        ItemErrorKind::MissingLoginIdAndName
    } else {
        ItemErrorKind::MissingLoginId
    };
    Err(ItemError {
        row,
        login_id: entry.login_id.clone(),
        kind,
    })
}

/// Validate and normalize the remaining fields of a row whose login ID is
/// already known to be non-empty.
///
/// # Errors
/// Returns the row error for a missing name, an auth method outside the closed
/// set, or a temporary password that could not be hashed.
pub fn normalize_entry(
    row: usize,
    login_id: String,
    entry: &MemberEntry,
    hasher: &dyn PasswordHasher,
) -> Result<NormalizedEntry, ItemError> {
    let reject = |login_id: String, kind| Err(ItemError { row, login_id, kind });

    let full_name = name(&entry.full_name);
    if full_name.is_empty() {
        return reject(login_id, ItemErrorKind::MissingName);
    }

    let Ok(auth_method) = entry.auth_method.parse::<AuthMethod>() else {
        let value = entry.auth_method.trim().to_owned();
        return reject(login_id, ItemErrorKind::InvalidAuthMethod { value });
    };

    let email = email(entry.email.as_deref())
        .or_else(|| auth_method.email_is_login().then(|| login_id.clone()));

    let password_hash = match entry.temp_password.as_deref().filter(|p| !p.is_empty()) {
        None => None,
        Some(plaintext) => match hasher.hash(plaintext) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::warn!(row, error = %e, "Failed to hash temporary password");
                return reject(login_id, ItemErrorKind::PasswordHashFailed);
            }
        },
    };

    Ok(NormalizedEntry {
        row,
        full_name_ci: fold(&full_name),
        full_name,
        login_id_ci: fold(&login_id),
        login_id,
        auth_method,
        email,
        auth_return_id: trimmed(entry.auth_return_id.as_deref()),
        password_hash,
    })
}
