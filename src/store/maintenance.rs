// src/store/maintenance.rs
//! Whole-vault maintenance: master-key check, legacy plaintext migration
//! and master-secret rotation. The last two rewrite every credential row in
//! one write transaction.

use rusqlite::{params, Connection};

use super::CredentialStore;
use crate::aliases::MasterSecret;
use crate::consts::KEY_CHECK_PLAINTEXT;
use crate::crypto::{generate_salt, looks_sealed, CipherEngine};
use crate::db::vault_db_conn::write_tx;
use crate::db::vault_meta::{read_key_check, replace_salt, write_key_check};
use crate::error::{Result, VaultError};

struct SealedPair {
    id: i64,
    username_envelope: String,
    password_envelope: String,
}

impl CredentialStore {
    /// Confirm the engine holds this vault's key.
    ///
    /// Vaults without a key check are first tested against any sealed
    /// field, then get a check written under the current key.
    pub(super) fn verify_master_key(&self) -> Result<()> {
        let mut conn = self.db.connect()?;
        let tx = write_tx(&mut conn)?;

        if let Some(check) = read_key_check(&tx)? {
            let matches = self
                .cipher
                .open_str(&check)
                .map(|plain| plain.as_bytes() == KEY_CHECK_PLAINTEXT)
                .unwrap_or(false);
            if !matches {
                tracing::warn!("master secret does not match this vault");
                return Err(VaultError::Decrypt);
            }
            tx.finish()?;
            return Ok(());
        }

        if let Some(sample) = first_sealed_field(&tx)? {
            if self.cipher.open_str(&sample).is_err() {
                tracing::warn!("master secret does not match this vault");
                return Err(VaultError::Decrypt);
            }
        }
        write_key_check(&tx, &self.cipher.seal(KEY_CHECK_PLAINTEXT)?.to_string())?;
        tx.commit()?;
        tracing::info!("recorded master key check");
        Ok(())
    }

    /// Seal every `username` / `password` field that is still plaintext.
    /// Returns the number of rows rewritten.
    pub fn migrate_legacy_rows(&self) -> Result<usize> {
        let _rekey = self.rekey.read();
        let mut conn = self.db.connect()?;
        let tx = write_tx(&mut conn)?;

        let mut migrated = 0;
        for row in all_pairs(&tx)? {
            let username_plain = !looks_sealed(&row.username_envelope);
            let password_plain = !looks_sealed(&row.password_envelope);
            if !username_plain && !password_plain {
                continue;
            }

            let username = if username_plain {
                self.cipher.seal_str(&row.username_envelope)?
            } else {
                row.username_envelope
            };
            let password = if password_plain {
                self.cipher.seal_str(&row.password_envelope)?
            } else {
                row.password_envelope
            };
            write_pair(&tx, row.id, &username, &password)?;
            migrated += 1;
        }
        tx.commit()?;

        if migrated > 0 {
            tracing::info!(rows = migrated, "sealed legacy plaintext credentials");
        }
        Ok(migrated)
    }

    /// Re-key the vault under `new_secret` and a fresh installation salt.
    ///
    /// The new key is derived before any lock is taken. All rows, the salt
    /// and the key check change in one transaction. Other field operations
    /// on this store wait until the engine has adopted the new key; a
    /// failure leaves both the file and the engine untouched.
    pub fn rotate_master_secret(&self, new_secret: &MasterSecret) -> Result<usize> {
        let new_salt = generate_salt();
        let next = CipherEngine::new(*self.cipher.params());
        next.initialize(new_secret.expose_secret().as_bytes(), &new_salt)?;

        let _rekey = self.rekey.write();
        let mut conn = self.db.connect()?;
        let tx = write_tx(&mut conn)?;

        let mut resealed = 0;
        for row in all_pairs(&tx)? {
            let username = self.unseal_field(&row.username_envelope)?;
            let password = self.unseal_field(&row.password_envelope)?;
            write_pair(
                &tx,
                row.id,
                &next.seal_str(&username)?,
                &next.seal_str(&password)?,
            )?;
            resealed += 1;
        }
        replace_salt(&tx, &new_salt)?;
        write_key_check(&tx, &next.seal(KEY_CHECK_PLAINTEXT)?.to_string())?;
        tx.commit()?;

        self.cipher.adopt_key(&next)?;
        tracing::info!(rows = resealed, "master secret rotated");
        Ok(resealed)
    }
}

fn all_pairs(conn: &Connection) -> Result<Vec<SealedPair>> {
    let mut stmt =
        conn.prepare("SELECT id, username_envelope, password_envelope FROM credentials")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(SealedPair {
                id: row.get(0)?,
                username_envelope: row.get(1)?,
                password_envelope: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn first_sealed_field(conn: &Connection) -> Result<Option<String>> {
    let mut stmt = conn.prepare(
        "SELECT password_envelope FROM credentials WHERE password_envelope LIKE 'v1:%' ORDER BY id",
    )?;
    let candidates = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(candidates.into_iter().find(|value| looks_sealed(value)))
}

// Leaves `updated_at` alone: the user-visible record did not change.
fn write_pair(conn: &Connection, id: i64, username: &str, password: &str) -> Result<()> {
    conn.execute(
        "UPDATE credentials SET username_envelope = ?1, password_envelope = ?2 WHERE id = ?3",
        params![username, password, id],
    )?;
    Ok(())
}
