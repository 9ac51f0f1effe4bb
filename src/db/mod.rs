// src/db/mod.rs
//! SQLite / SQLCipher persistence — connection setup, schema, vault metadata
//!
//! Higher-level record operations live in `crate::store`.

pub mod vault_db_conn;
pub mod vault_meta;

pub use vault_db_conn::Database;

/// Fixed-width RFC 3339 UTC timestamp; sorts lexicographically.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
