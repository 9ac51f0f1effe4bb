// src/crypto/mod.rs
//! Pure cryptographic operations — no I/O, no database
//!
//! All functions work exclusively on in-memory buffers.
//! The engine holds the only long-lived key; everything else is stateless.
mod engine;
mod envelope;
mod kdf;
mod verifier;

pub use engine::CipherEngine;
pub use envelope::{looks_sealed, Envelope};
pub use kdf::{derive_key, generate_salt, KdfParams};
pub use verifier::{hash_password, verify_password};
