use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ApiError;

/// Password hashing, isolated from the rest of the auth flow.
///
/// Argon2id with default parameters; hashes are stored as PHC strings so
/// parameters travel with the hash.

pub fn hash_password(plain: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("password hashing failed: {:?}", e);
            ApiError::Validation("could not process password".to_string())
        })
}

/// Constant-time verification. An unparseable stored hash verifies as false
/// rather than erroring, so login failures stay uniform.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}
