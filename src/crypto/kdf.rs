// src/crypto/kdf.rs
//! Key derivation — Argon2id, derives the 32-byte field key from the
//! master secret and the per-installation salt.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::aliases::CipherKey32;
use crate::consts::{
    DEFAULT_KDF_ITERATIONS, DEFAULT_KDF_MEMORY_KIB, DEFAULT_KDF_PARALLELISM, KEY_LEN, SALT_LEN,
};
use crate::error::{Result, VaultError};

/// Argon2id cost parameters shared by the master-key KDF and user verifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
}

impl KdfParams {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Self {
            memory_kib,
            iterations,
            parallelism,
        };
        params.argon2()?;
        Ok(params)
    }

    /// Minimal cost. Tests and `skip_kdf_slowdown` only.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    pub(crate) fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| VaultError::Config(format!("invalid Argon2 params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_KDF_MEMORY_KIB,
            iterations: DEFAULT_KDF_ITERATIONS,
            parallelism: DEFAULT_KDF_PARALLELISM,
        }
    }
}

/// Derive the field key. Slow by construction; call once at startup.
pub fn derive_key(master_secret: &[u8], salt: &[u8], params: &KdfParams) -> Result<CipherKey32> {
    if master_secret.is_empty() {
        return Err(VaultError::Config("master secret must not be empty".into()));
    }
    if salt.len() < SALT_LEN {
        return Err(VaultError::Config(format!(
            "KDF salt must be at least {SALT_LEN} bytes"
        )));
    }

    let mut out = [0u8; KEY_LEN];
    let result = params.argon2()?.hash_password_into(master_secret, salt, &mut out);
    let key = CipherKey32::new(out);
    zeroize::Zeroize::zeroize(&mut out);
    result.map_err(|e| VaultError::Config(format!("Argon2id derivation failed: {e}")))?;
    Ok(key)
}

/// Fresh random installation salt (generated once, stored in `vault_meta`).
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
