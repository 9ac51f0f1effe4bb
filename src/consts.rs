// src/consts.rs
//! Shared constants — security parameters and defaults

/// Current envelope scheme
pub const ENVELOPE_VERSION: u8 = 1;

/// Associated data bound into every v1 envelope
pub const ENVELOPE_AAD_V1: &[u8] = b"passwault/envelope/v1";

/// XChaCha20-Poly1305 nonce length
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length
pub const TAG_LEN: usize = 16;

/// Derived field-key length
pub const KEY_LEN: usize = 32;

/// Plaintext sealed into `vault_meta.key_check` to recognise the right master secret
pub const KEY_CHECK_PLAINTEXT: &[u8] = b"passwault/key-check/v1";

/// Per-installation KDF salt length
pub const SALT_LEN: usize = 16;

/// Argon2id defaults for the master key and user verifiers
// 64 MiB, 3 passes ≈ 0.2–0.5s on desktop hardware
pub const DEFAULT_KDF_MEMORY_KIB: u32 = 64 * 1024;
pub const DEFAULT_KDF_ITERATIONS: u32 = 3;
pub const DEFAULT_KDF_PARALLELISM: u32 = 1;

/// Recommended KDF iterations for SQLCipher databases (2025+)
// ~0.1–0.2s on modern hardware — only paid when a db_key is configured
pub const DB_KDF_ITERATIONS: u32 = 256_000;

/// How long a connection waits on SQLite's write lock before giving up
pub const DB_BUSY_TIMEOUT_MS: u64 = 5_000;
