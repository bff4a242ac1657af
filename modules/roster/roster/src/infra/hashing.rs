use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// bcrypt hasher for temporary passwords.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    #[must_use]
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| PasswordHashError(e.to_string()))
    }
}
