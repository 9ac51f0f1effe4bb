// src/store/credentials.rs
//! Credential CRUD with transparent sealing of `username` / `password`
//!
//! `website` and `notes` stay plaintext so they can be sorted and shown.
//! Every statement filters on the owning user. Writers seal inside their
//! write transaction, under the shared side of the store's rekey lock.

use rusqlite::{params, Connection, OptionalExtension};
use zeroize::Zeroizing;

use super::models::{Credential, CredentialId, CredentialRow, SecretField, UserId};
use super::CredentialStore;
use crate::crypto::{looks_sealed, Envelope};
use crate::db::now_timestamp;
use crate::db::vault_db_conn::{read_tx, write_tx};
use crate::error::{Result, VaultError};

impl CredentialStore {
    pub fn add_credential(
        &self,
        user_id: UserId,
        website: &str,
        username: &str,
        password: &str,
        notes: Option<&str>,
    ) -> Result<CredentialId> {
        let _rekey = self.rekey.read();
        let mut conn = self.db.connect()?;
        let tx = write_tx(&mut conn)?;
        ensure_user_exists(&tx, user_id)?;

        let username_envelope = self.cipher.seal_str(username)?;
        let password_envelope = self.cipher.seal_str(password)?;
        let now = now_timestamp();
        tx.execute(
            "INSERT INTO credentials (owner_user_id, website, username_envelope,
                 password_envelope, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                user_id,
                website,
                username_envelope,
                password_envelope,
                notes,
                now
            ],
        )?;
        let credential_id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::info!(user_id, credential_id, "credential added");
        Ok(credential_id)
    }

    /// All of the user's credentials, ordered by lowercased website, then id.
    /// Usernames come back unsealed, passwords stay sealed.
    pub fn get_credentials(&self, user_id: UserId) -> Result<Vec<Credential>> {
        let _rekey = self.rekey.read();
        let rows = self.owned_rows(user_id)?;
        let mut creds = rows
            .into_iter()
            .map(|row| self.for_display(row))
            .collect::<Result<Vec<_>>>()?;
        // Same folding as search; SQLite's NOCASE only folds ASCII.
        creds.sort_by_cached_key(|c| (c.website.to_lowercase(), c.id));
        Ok(creds)
    }

    pub fn get_credential(&self, credential_id: CredentialId, user_id: UserId) -> Result<Credential> {
        let _rekey = self.rekey.read();
        let mut conn = self.db.connect()?;
        let tx = read_tx(&mut conn)?;
        let row = select_owned(&tx, credential_id, user_id)?.ok_or(VaultError::NotFound)?;
        tx.finish()?;
        self.for_display(row)
    }

    /// Re-seal both secret fields and overwrite the row in one statement.
    ///
    /// A `Sealed` password must open under the current key; a `Plain` one is
    /// the new value.
    pub fn update_credential(&self, credential: &Credential) -> Result<()> {
        let _rekey = self.rekey.read();
        let mut conn = self.db.connect()?;
        let tx = write_tx(&mut conn)?;

        let username_envelope = self.cipher.seal_str(&credential.username)?;
        let password_envelope = match &credential.password {
            SecretField::Sealed(envelope) => {
                let plain = self.cipher.open_envelope_str(envelope)?;
                self.cipher.seal_str(&plain)?
            }
            SecretField::Plain(plain) => self.cipher.seal_str(plain)?,
        };

        let changed = tx.execute(
            "UPDATE credentials
             SET website = ?1, username_envelope = ?2, password_envelope = ?3,
                 notes = ?4, updated_at = ?5
             WHERE id = ?6 AND owner_user_id = ?7",
            params![
                credential.website,
                username_envelope,
                password_envelope,
                credential.notes,
                now_timestamp(),
                credential.id,
                credential.owner_user_id
            ],
        )?;
        if changed != 1 {
            return Err(VaultError::NotFound);
        }
        tx.commit()?;

        tracing::info!(
            user_id = credential.owner_user_id,
            credential_id = credential.id,
            "credential updated"
        );
        Ok(())
    }

    /// Hard delete. `false` when no row matched `(credential_id, user_id)`.
    pub fn delete_credential(&self, credential_id: CredentialId, user_id: UserId) -> Result<bool> {
        let mut conn = self.db.connect()?;
        let tx = write_tx(&mut conn)?;
        let removed = tx.execute(
            "DELETE FROM credentials WHERE id = ?1 AND owner_user_id = ?2",
            params![credential_id, user_id],
        )?;
        tx.commit()?;

        if removed > 0 {
            tracing::info!(user_id, credential_id, "credential deleted");
        }
        Ok(removed > 0)
    }

    /// Case-insensitive substring match on website or unsealed username.
    /// Only the user's own rows are ever unsealed.
    pub fn search_credentials(&self, user_id: UserId, query: &str) -> Result<Vec<Credential>> {
        let needle = query.to_lowercase();
        let owned = self.get_credentials(user_id)?;
        if needle.is_empty() {
            return Ok(owned);
        }
        Ok(owned
            .into_iter()
            .filter(|c| {
                c.website.to_lowercase().contains(&needle)
                    || c.username.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// The one call that yields plaintext password material. Keep the
    /// returned value short-lived; it zeroizes on drop.
    pub fn reveal_password(
        &self,
        credential_id: CredentialId,
        user_id: UserId,
    ) -> Result<Zeroizing<String>> {
        let _rekey = self.rekey.read();
        let mut conn = self.db.connect()?;
        let tx = read_tx(&mut conn)?;
        let stored: String = tx
            .query_row(
                "SELECT password_envelope FROM credentials WHERE id = ?1 AND owner_user_id = ?2",
                params![credential_id, user_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(VaultError::NotFound)?;
        tx.finish()?;

        tracing::debug!(user_id, credential_id, "password revealed");
        self.unseal_field(&stored)
    }

    fn owned_rows(&self, user_id: UserId) -> Result<Vec<CredentialRow>> {
        let mut conn = self.db.connect()?;
        let tx = read_tx(&mut conn)?;
        let rows = select_all_owned(&tx, user_id)?;
        tx.finish()?;
        Ok(rows)
    }

    fn for_display(&self, row: CredentialRow) -> Result<Credential> {
        let username = self.unseal_field(&row.username_envelope)?.as_str().to_owned();
        let password = if looks_sealed(&row.password_envelope) {
            SecretField::Sealed(row.password_envelope.parse::<Envelope>()?)
        } else {
            SecretField::Plain(row.password_envelope)
        };

        Ok(Credential {
            id: row.id,
            owner_user_id: row.owner_user_id,
            website: row.website,
            username,
            password,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn ensure_user_exists(conn: &Connection, user_id: UserId) -> Result<()> {
    conn.query_row("SELECT 1 FROM users WHERE id = ?1", [user_id], |_| Ok(()))
        .optional()?
        .ok_or(VaultError::NotFound)
}

fn select_all_owned(conn: &Connection, user_id: UserId) -> Result<Vec<CredentialRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM credentials WHERE owner_user_id = ?1 ORDER BY id",
        CredentialRow::COLUMNS
    ))?;
    let rows = stmt
        .query_map([user_id], CredentialRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn select_owned(
    conn: &Connection,
    credential_id: CredentialId,
    user_id: UserId,
) -> Result<Option<CredentialRow>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM credentials WHERE id = ?1 AND owner_user_id = ?2",
                CredentialRow::COLUMNS
            ),
            params![credential_id, user_id],
            CredentialRow::from_row,
        )
        .optional()?)
}
