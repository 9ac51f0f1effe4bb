// src/error.rs
//! Public error type for the entire crate
//!
//! Every store and cipher operation returns one of these variants; raw
//! database or crypto errors never cross the crate boundary.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    /// Bad initialization input (empty secret, invalid KDF cost, unreadable config).
    #[error("configuration error: {0}")]
    Config(String),

    /// A seal/open call arrived before the cipher engine was initialized.
    #[error("cipher engine used before initialization")]
    NotInitialized,

    /// Integrity or format failure. Deliberately carries no detail.
    #[error("cannot decrypt")]
    Decrypt,

    #[error("username already exists")]
    DuplicateUsername,

    /// Unknown username or wrong password; the two cases are indistinguishable.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("record not found")]
    NotFound,

    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;

impl From<rusqlite::Error> for VaultError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => VaultError::NotFound,
            rusqlite::Error::SqliteFailure(ref e, ref msg) if e.code == ErrorCode::ConstraintViolation => {
                let msg = msg.as_deref().unwrap_or_default();
                if msg.contains("users.username") {
                    VaultError::DuplicateUsername
                } else if msg.contains("FOREIGN KEY") {
                    VaultError::NotFound
                } else {
                    VaultError::StoreUnavailable(err.to_string())
                }
            }
            other => VaultError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::StoreUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn constraint(msg: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some(msg.to_string()),
        )
    }

    #[test]
    fn unique_username_maps_to_duplicate() {
        let err: VaultError = constraint("UNIQUE constraint failed: users.username").into();
        assert!(matches!(err, VaultError::DuplicateUsername));
    }

    #[test]
    fn foreign_key_maps_to_not_found() {
        let err: VaultError = constraint("FOREIGN KEY constraint failed").into();
        assert!(matches!(err, VaultError::NotFound));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let err: VaultError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, VaultError::NotFound));
    }

    #[test]
    fn decrypt_message_is_opaque() {
        assert_eq!(VaultError::Decrypt.to_string(), "cannot decrypt");
    }
}
