// src/config/defaults.rs
use std::path::PathBuf;

use crate::config::app::{Features, KdfSettings, Keys, Paths};
use crate::consts::{DEFAULT_KDF_ITERATIONS, DEFAULT_KDF_MEMORY_KIB, DEFAULT_KDF_PARALLELISM};

pub const DEFAULT_CONFIG_FILE: &str = "passwault.toml";

pub fn default_vault_db() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("passwault")
        .join("vault.db")
        .to_string_lossy()
        .into_owned()
}

pub fn default_paths() -> Paths {
    Paths {
        vault_db: default_vault_db(),
    }
}

pub fn default_keys() -> Keys {
    Keys {
        master_secret: None,
        db_key: None,
    }
}

pub fn default_kdf() -> KdfSettings {
    KdfSettings {
        memory_kib: DEFAULT_KDF_MEMORY_KIB,
        iterations: DEFAULT_KDF_ITERATIONS,
        parallelism: DEFAULT_KDF_PARALLELISM,
    }
}

pub fn default_features() -> Features {
    Features {
        skip_kdf_slowdown: false,
        migrate_legacy_rows: true,
    }
}

pub fn default_true() -> bool {
    true
}
