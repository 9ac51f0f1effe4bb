// src/config/app.rs
use std::env;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::Deserialize;

use super::defaults::*;
use crate::aliases::{DbPassphrase, MasterSecret};
use crate::crypto::KdfParams;
use crate::error::{Result, VaultError};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_paths")]
    pub paths: Paths,
    #[serde(default = "default_keys")]
    pub keys: Keys,
    #[serde(default = "default_kdf")]
    pub kdf: KdfSettings,
    #[serde(default = "default_features")]
    pub features: Features,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paths {
    #[serde(default = "default_vault_db")]
    pub vault_db: String,
}

/// Dev-only fallbacks. Real deployments supply these through the environment.
#[derive(Clone, Deserialize)]
pub struct Keys {
    #[serde(default)]
    pub master_secret: Option<String>,
    #[serde(default)]
    pub db_key: Option<String>,
}

impl std::fmt::Debug for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keys")
            .field("master_secret", &self.master_secret.as_ref().map(|_| "<redacted>"))
            .field("db_key", &self.db_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KdfSettings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Features {
    #[serde(default)]
    pub skip_kdf_slowdown: bool,
    #[serde(default = "default_true")]
    pub migrate_legacy_rows: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: default_paths(),
            keys: default_keys(),
            kdf: default_kdf(),
            features: default_features(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| VaultError::Config(format!("invalid TOML: {e}")))
    }

    /// Read a config file; a missing file yields the built-in defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found — using built-in defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Apply `PWT_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(db) = env::var("PWT_VAULT_DB") {
            self.paths.vault_db = db;
        }
        if let Ok(secret) = env::var("PWT_MASTER_SECRET") {
            self.keys.master_secret = Some(secret);
        }
        if let Ok(key) = env::var("PWT_DB_KEY") {
            self.keys.db_key = Some(key);
        }
        self
    }

    pub fn vault_db_path(&self) -> PathBuf {
        PathBuf::from(&self.paths.vault_db)
    }

    pub fn kdf_params(&self) -> Result<KdfParams> {
        if self.features.skip_kdf_slowdown {
            return Ok(KdfParams::insecure_fast());
        }
        KdfParams::new(
            self.kdf.memory_kib,
            self.kdf.iterations,
            self.kdf.parallelism,
        )
    }

    pub fn master_secret(&self) -> Result<MasterSecret> {
        self.keys
            .master_secret
            .clone()
            .map(MasterSecret::new)
            .ok_or_else(|| VaultError::Config("no master secret: set PWT_MASTER_SECRET".into()))
    }

    pub fn db_passphrase(&self) -> Option<DbPassphrase> {
        self.keys.db_key.clone().map(DbPassphrase::new)
    }
}

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Load config once per process from `PWT_CONFIG` (default `passwault.toml`).
pub fn load() -> Result<&'static Config> {
    CONFIG.get_or_try_init(|| {
        let path = env::var("PWT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Ok(Config::from_file(Path::new(&path))?.with_env_overrides())
    })
}
