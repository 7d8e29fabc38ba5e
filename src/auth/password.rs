use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand_core::OsRng;
use thiserror::Error;

/// PBKDF2-SHA256 rounds for freshly generated hashes
pub const DEFAULT_ROUNDS: u32 = 100_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must not be empty")]
    Empty,

    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Hash `password` into a PHC string (`$pbkdf2-sha256$i=...`)
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_rounds(password, DEFAULT_ROUNDS)
}

pub fn hash_password_with_rounds(password: &str, rounds: u32) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }

    let salt = SaltString::generate(&mut OsRng);
    let params = Params {
        rounds,
        output_length: 32,
    };

    Pbkdf2
        .hash_password_customized(password.as_bytes(), None, None, params, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Constant-time check of `password` against a PHC hash. A hash that does
/// not parse never matches.
pub fn verify_password(password: &str, phc_hash: &str) -> bool {
    match PasswordHash::new(phc_hash) {
        Ok(parsed) => Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::error!("Stored admin password hash is not a valid PHC string: {}", e);
            false
        }
    }
}

/// Whether `value` parses as a PHC hash string
pub fn is_phc_hash(value: &str) -> bool {
    PasswordHash::new(value).is_ok()
}
