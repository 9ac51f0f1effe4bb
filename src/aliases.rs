// src/aliases.rs
//! Re-exports secure-gate's ergonomic secret types
//!
//! These are the canonical secret containers used throughout passwault.
//! Every one of them zeroizes on drop.

pub use secure_gate::{dynamic_alias, fixed_alias};

// Fixed-size secrets
fixed_alias!(CipherKey32, 32); // 256-bit XChaCha20-Poly1305 field key

// Dynamic secrets
dynamic_alias!(MasterSecret, String); // Unlocks the field key via Argon2id
dynamic_alias!(DbPassphrase, String); // Optional SQLCipher whole-file passphrase
dynamic_alias!(UserPassword, String); // Account password on its way to the verifier
