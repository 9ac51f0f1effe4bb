// src/store/mod.rs
//! Credential store — users, credentials, and field-level sealing
//!
//! Every public method runs in exactly one transaction on its own
//! connection and is scoped to the owning user's rows. Errors are always
//! `VaultError`; secrets never reach the log.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use zeroize::Zeroizing;

use crate::aliases::MasterSecret;
use crate::config::Config;
use crate::crypto::{looks_sealed, CipherEngine, KdfParams};
use crate::db::Database;
use crate::error::Result;

mod credentials;
mod maintenance;
mod models;
mod users;

pub use models::{Credential, CredentialId, SecretField, User, UserId};

pub struct CredentialStore {
    db: Database,
    cipher: Arc<CipherEngine>,
    kdf: KdfParams,
    dummy_verifier: OnceCell<String>,
    /// Shared by every call that seals or opens fields; rotation holds it
    /// exclusively until the engine has adopted the new key.
    rekey: RwLock<()>,
}

impl CredentialStore {
    /// Wire a store from parts. `cipher` must be initialized before the
    /// first credential call.
    pub fn new(db: Database, cipher: Arc<CipherEngine>, kdf: KdfParams) -> Self {
        Self {
            db,
            cipher,
            kdf,
            dummy_verifier: OnceCell::new(),
            rekey: RwLock::new(()),
        }
    }

    /// Open the configured database, derive the field key once, and (by
    /// default) seal any legacy plaintext rows.
    ///
    /// A master secret that does not match the vault fails with `Decrypt`
    /// before anything is written.
    pub fn open(config: &Config, master_secret: &MasterSecret) -> Result<Self> {
        let kdf = config.kdf_params()?;
        let db = Database::open(config.vault_db_path(), config.db_passphrase())?;
        let salt = db.load_or_create_salt()?;

        let cipher = Arc::new(CipherEngine::new(kdf));
        cipher.initialize(master_secret.expose_secret().as_bytes(), &salt)?;

        let store = Self::new(db, cipher, kdf);
        store.verify_master_key()?;
        if config.features.migrate_legacy_rows {
            store.migrate_legacy_rows()?;
        }
        Ok(store)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn cipher(&self) -> &Arc<CipherEngine> {
        &self.cipher
    }

    /// Open a stored field, passing legacy plaintext through unchanged.
    fn unseal_field(&self, stored: &str) -> Result<Zeroizing<String>> {
        if looks_sealed(stored) {
            self.cipher.open_str(stored)
        } else {
            Ok(Zeroizing::new(stored.to_owned()))
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("path", &self.db.path())
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}
