// src/store/users.rs
//! Account registration, authentication, and password changes

use rusqlite::{params, OptionalExtension};

use super::models::{User, UserId};
use super::CredentialStore;
use crate::crypto::{hash_password, verify_password};
use crate::db::now_timestamp;
use crate::db::vault_db_conn::{read_tx, write_tx};
use crate::error::{Result, VaultError};

const DUMMY_PASSWORD: &str = "passwault-timing-equalizer";

impl CredentialStore {
    /// Register a new account. Usernames are unique, compared case-sensitively.
    pub fn create_user(&self, username: &str, password: &str) -> Result<UserId> {
        // Slow hash first, outside the write lock.
        let verifier = hash_password(password, &self.kdf)?;
        let now = now_timestamp();

        let mut conn = self.db.connect()?;
        let tx = write_tx(&mut conn)?;
        tx.execute(
            "INSERT INTO users (username, verifier, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![username, verifier, now],
        )?;
        let user_id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::info!(user_id, "user created");
        Ok(user_id)
    }

    /// Check a username/password pair. Both "no such user" and "wrong
    /// password" fail with the same `InvalidCredentials`.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<UserId> {
        let mut conn = self.db.connect()?;
        let tx = read_tx(&mut conn)?;
        let found: Option<(UserId, String)> = tx
            .query_row(
                "SELECT id, verifier FROM users WHERE username = ?1",
                [username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        tx.finish()?;

        match found {
            Some((user_id, verifier)) if verify_password(password, &verifier) => {
                tracing::debug!(user_id, "authentication succeeded");
                Ok(user_id)
            }
            Some(_) => {
                tracing::debug!("authentication failed");
                Err(VaultError::InvalidCredentials)
            }
            None => {
                // Same amount of Argon2 work as a real mismatch.
                let dummy = self
                    .dummy_verifier
                    .get_or_try_init(|| hash_password(DUMMY_PASSWORD, &self.kdf))?;
                let _ = verify_password(password, dummy);
                tracing::debug!("authentication failed");
                Err(VaultError::InvalidCredentials)
            }
        }
    }

    /// Replace the account's verifier.
    pub fn change_password(&self, user_id: UserId, new_password: &str) -> Result<()> {
        let verifier = hash_password(new_password, &self.kdf)?;

        let mut conn = self.db.connect()?;
        let tx = write_tx(&mut conn)?;
        let changed = tx.execute(
            "UPDATE users SET verifier = ?1, updated_at = ?2 WHERE id = ?3",
            params![verifier, now_timestamp(), user_id],
        )?;
        if changed != 1 {
            return Err(VaultError::NotFound);
        }
        tx.commit()?;

        tracing::info!(user_id, "user password changed");
        Ok(())
    }

    pub fn get_user(&self, user_id: UserId) -> Result<User> {
        let mut conn = self.db.connect()?;
        let tx = read_tx(&mut conn)?;
        let user = tx
            .query_row(
                "SELECT id, username, created_at, updated_at FROM users WHERE id = ?1",
                [user_id],
                User::from_row,
            )
            .optional()?
            .ok_or(VaultError::NotFound)?;
        tx.finish()?;
        Ok(user)
    }
}
