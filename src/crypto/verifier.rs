// src/crypto/verifier.rs
//! One-way account password verifiers (Argon2id PHC strings)
//!
//! Independent of the cipher engine: a verifier can only be checked, never
//! turned back into the password.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use super::kdf::KdfParams;
use crate::error::{Result, VaultError};

/// Hash a password with a fresh per-user salt. The PHC string embeds the
/// salt and the cost parameters.
pub fn hash_password(password: &str, params: &KdfParams) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| VaultError::Config(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Constant-time check of `password` against a stored verifier.
/// A malformed verifier simply fails to verify.
pub fn verify_password(password: &str, verifier: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(verifier) else {
        return false;
    };
    // Cost parameters come from the PHC string itself.
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
