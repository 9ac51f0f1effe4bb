// src/lib.rs
//! passwault — a local encrypted credential store
//!
//! Features:
//! - XChaCha20-Poly1305 field envelopes under an Argon2id-derived key
//! - Per-installation KDF salt, one-way Argon2id account verifiers
//! - Strict per-user isolation over a SQLite / SQLCipher database
//! - Full secure-gate v0.5 integration for long-lived secrets

pub mod aliases;
pub mod config;
pub mod consts;
pub mod crypto;
pub mod db;
pub mod error;
pub mod store;

// Re-export everything callers need at the crate root
pub use aliases::{CipherKey32, DbPassphrase, MasterSecret, UserPassword};
pub use config::{load as load_config, Config};
pub use crypto::{looks_sealed, CipherEngine, Envelope, KdfParams};
pub use db::Database;
pub use error::{Result, VaultError};
pub use store::{Credential, CredentialId, CredentialStore, SecretField, User, UserId};
