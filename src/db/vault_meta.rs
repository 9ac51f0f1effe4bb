// src/db/vault_meta.rs
//! The single installation-wide row: KDF salt, scheme version, key check
//!
//! The salt is not secret, but it is unique per installation and must
//! never change except through a master-secret rotation.

use rusqlite::{params, Connection, OptionalExtension};

use super::now_timestamp;
use super::vault_db_conn::{write_tx, Database};
use crate::consts::{ENVELOPE_VERSION, SALT_LEN};
use crate::crypto::generate_salt;
use crate::error::{Result, VaultError};

impl Database {
    /// Installation salt, generated and persisted on first use.
    pub fn load_or_create_salt(&self) -> Result<[u8; SALT_LEN]> {
        let mut conn = self.connect()?;
        let tx = write_tx(&mut conn)?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO vault_meta (id, kdf_salt, scheme_version, created_at)
             VALUES (1, ?1, ?2, ?3)",
            params![
                generate_salt().as_slice(),
                ENVELOPE_VERSION,
                now_timestamp()
            ],
        )?;
        let salt = read_salt(&tx)?.ok_or(VaultError::NotFound)?;
        tx.commit()?;

        if inserted == 1 {
            tracing::info!("generated new installation KDF salt");
        }
        Ok(salt)
    }
}

pub(crate) fn read_salt(conn: &Connection) -> Result<Option<[u8; SALT_LEN]>> {
    let raw: Option<Vec<u8>> = conn
        .query_row("SELECT kdf_salt FROM vault_meta WHERE id = 1", [], |row| row.get(0))
        .optional()?;
    raw.map(|bytes| {
        <[u8; SALT_LEN]>::try_from(bytes.as_slice())
            .map_err(|_| VaultError::Config("stored KDF salt has the wrong length".into()))
    })
    .transpose()
}

/// Sealed `KEY_CHECK_PLAINTEXT` under the current field key, if one was ever written.
pub(crate) fn read_key_check(conn: &Connection) -> Result<Option<String>> {
    let check: Option<Option<String>> = conn
        .query_row("SELECT key_check FROM vault_meta WHERE id = 1", [], |row| row.get(0))
        .optional()?;
    Ok(check.flatten())
}

pub(crate) fn write_key_check(conn: &Connection, envelope: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE vault_meta SET key_check = ?1 WHERE id = 1",
        [envelope],
    )?;
    if changed != 1 {
        return Err(VaultError::NotFound);
    }
    Ok(())
}

/// Replace the salt inside an open rotation transaction.
pub(crate) fn replace_salt(conn: &Connection, salt: &[u8; SALT_LEN]) -> Result<()> {
    let changed = conn.execute(
        "UPDATE vault_meta SET kdf_salt = ?1, rotated_at = ?2 WHERE id = 1",
        params![salt.as_slice(), now_timestamp()],
    )?;
    if changed != 1 {
        return Err(VaultError::NotFound);
    }
    Ok(())
}
