// src/store/models.rs
//! Records handed across the store boundary

use std::fmt;

use rusqlite::Row;
use serde::Serialize;

use crate::crypto::Envelope;

pub type UserId = i64;
pub type CredentialId = i64;

/// Public account profile. The verifier never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// A password as carried by a `Credential`.
///
/// Reads return `Sealed`; callers set `Plain` to store a new value. Legacy
/// rows written before field sealing also surface as `Plain`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum SecretField {
    Sealed(Envelope),
    Plain(String),
}

impl SecretField {
    pub fn is_sealed(&self) -> bool {
        matches!(self, SecretField::Sealed(_))
    }
}

impl fmt::Debug for SecretField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretField::Sealed(env) => f.debug_tuple("Sealed").field(env).finish(),
            SecretField::Plain(_) => f.write_str("Plain(<redacted>)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credential {
    pub id: CredentialId,
    pub owner_user_id: UserId,
    pub website: String,
    /// Unsealed for display.
    pub username: String,
    pub password: SecretField,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A `credentials` row exactly as stored.
#[derive(Debug, Clone)]
pub(crate) struct CredentialRow {
    pub id: CredentialId,
    pub owner_user_id: UserId,
    pub website: String,
    pub username_envelope: String,
    pub password_envelope: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl CredentialRow {
    pub(crate) const COLUMNS: &'static str = "id, owner_user_id, website, username_envelope, \
         password_envelope, notes, created_at, updated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            owner_user_id: row.get("owner_user_id")?,
            website: row.get("website")?,
            username_envelope: row.get("username_envelope")?,
            password_envelope: row.get("password_envelope")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
