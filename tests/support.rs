// tests/support.rs
//! Test utilities — a fresh vault in its own temp directory

use std::path::PathBuf;
use std::sync::Arc;

use passwault::{CipherEngine, Config, CredentialStore, Database, KdfParams, UserId};
use rusqlite::Connection;
use tempfile::TempDir;

#[allow(dead_code)]
pub const MASTER_SECRET: &str = "test-master-secret-2025";

#[allow(dead_code)] // Not every test binary uses every helper
pub struct TestVault {
    pub store: CredentialStore,
    dir: TempDir,
}

#[allow(dead_code)]
impl TestVault {
    pub fn new() -> Self {
        Self::with_secret(MASTER_SECRET)
    }

    /// Wire the store by hand: fast KDF, engine initialized from the
    /// persisted installation salt.
    pub fn with_secret(secret: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::open(dir.path().join("vault.db"), None).expect("open vault db");
        let salt = db.load_or_create_salt().expect("salt");

        let engine = Arc::new(CipherEngine::new(KdfParams::insecure_fast()));
        engine
            .initialize(secret.as_bytes(), &salt)
            .expect("initialize engine");

        let store = CredentialStore::new(db, engine, KdfParams::insecure_fast());
        Self { store, dir }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("vault.db")
    }

    /// Config pointing at this vault, suitable for `CredentialStore::open`.
    pub fn config(&self) -> Config {
        config_for(self.db_path())
    }

    pub fn raw_conn(&self) -> Connection {
        self.store.database().connect().expect("raw connection")
    }

    pub fn user(&self, name: &str) -> UserId {
        self.store
            .create_user(name, &format!("{name}-password"))
            .expect("create user")
    }
}

impl Default for TestVault {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
pub fn config_for(path: PathBuf) -> Config {
    let mut config = Config::default();
    config.paths.vault_db = path.to_string_lossy().into_owned();
    config.features.skip_kdf_slowdown = true;
    config
}
