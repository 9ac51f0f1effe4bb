// src/db/vault_db_conn.rs
//! Opens the vault database and keeps its schema current.
//!
//! Every store call gets its own connection from `Database::connect`, so
//! concurrent callers queue on SQLite's own locking (WAL: readers never
//! block on the writer).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::aliases::DbPassphrase;
use crate::consts::{DB_BUSY_TIMEOUT_MS, DB_KDF_ITERATIONS};
use crate::error::Result;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS vault_meta (
        id             INTEGER PRIMARY KEY CHECK (id = 1),
        kdf_salt       BLOB NOT NULL,
        scheme_version INTEGER NOT NULL,
        created_at     TEXT NOT NULL,
        rotated_at     TEXT,
        key_check      TEXT
    );

    CREATE TABLE IF NOT EXISTS users (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        username   TEXT NOT NULL UNIQUE,
        verifier   TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS credentials (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_user_id     INTEGER NOT NULL REFERENCES users(id),
        website           TEXT NOT NULL,
        username_envelope TEXT NOT NULL,
        password_envelope TEXT NOT NULL,
        notes             TEXT,
        created_at        TEXT NOT NULL,
        updated_at        TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_credentials_owner ON credentials(owner_user_id);
"#;

pub struct Database {
    path: PathBuf,
    passphrase: Option<DbPassphrase>,
}

impl Database {
    /// Open (or create) the vault database at `path` and run migrations.
    ///
    /// With a passphrase the file is additionally SQLCipher-encrypted.
    pub fn open(path: impl AsRef<Path>, passphrase: Option<DbPassphrase>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let db = Self { path, passphrase };
        let conn = db.connect()?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %db.path.display(), "vault database ready");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh, fully configured connection.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;

        if let Some(passphrase) = &self.passphrase {
            conn.pragma_update(None, "key", passphrase.expose_secret().as_str())?;
            conn.execute_batch(&format!(
                r#"
                PRAGMA cipher_page_size = 4096;
                PRAGMA kdf_iter = {DB_KDF_ITERATIONS};
                PRAGMA cipher_hmac_algorithm = HMAC_SHA512;
                PRAGMA cipher_kdf_algorithm = PBKDF2_HMAC_SHA512;
                "#
            ))?;
        }

        conn.busy_timeout(Duration::from_millis(DB_BUSY_TIMEOUT_MS))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        // Fails here (not later) when the passphrase is wrong.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))?;
        Ok(conn)
    }

    /// Whether the schema has been created (the `users` table exists).
    pub fn is_initialized(&self) -> Result<bool> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 1)
    }
}

/// Write transaction that takes SQLite's write lock up front, so two writers
/// never both read and then fail to upgrade.
pub fn write_tx(conn: &mut Connection) -> Result<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// Read transaction: one consistent snapshot for the whole call.
pub fn read_tx(conn: &mut Connection) -> Result<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Deferred)?)
}
