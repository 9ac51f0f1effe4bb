// src/crypto/engine.rs
//! Cipher engine — owns the derived field key and seals/opens envelopes
//!
//! The key is written once at startup (or replaced wholesale on
//! re-initialization / rotation) and read-only otherwise. Readers clone an
//! `Arc` out of the lock, so the lock is held only for a pointer copy.

use std::sync::Arc;

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use parking_lot::RwLock;
use zeroize::Zeroizing;

use super::envelope::Envelope;
use super::kdf::{derive_key, KdfParams};
use crate::aliases::CipherKey32;
use crate::consts::{ENVELOPE_AAD_V1, ENVELOPE_VERSION, NONCE_LEN, TAG_LEN};
use crate::error::{Result, VaultError};

pub struct CipherEngine {
    params: KdfParams,
    key: RwLock<Option<Arc<CipherKey32>>>,
}

impl CipherEngine {
    pub fn new(params: KdfParams) -> Self {
        Self {
            params,
            key: RwLock::new(None),
        }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Derive the field key from `master_secret` and the installation salt.
    ///
    /// The slow Argon2id pass runs before the write lock is taken; the key
    /// is published in a single store. Re-initializing replaces the key.
    pub fn initialize(&self, master_secret: &[u8], salt: &[u8]) -> Result<()> {
        let key = derive_key(master_secret, salt, &self.params)?;
        *self.key.write() = Some(Arc::new(key));
        tracing::debug!("cipher engine initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.key.read().is_some()
    }

    /// Take over the key of another engine (used after a committed rotation).
    pub fn adopt_key(&self, other: &CipherEngine) -> Result<()> {
        let key = other.current_key()?;
        *self.key.write() = Some(key);
        Ok(())
    }

    fn current_key(&self) -> Result<Arc<CipherKey32>> {
        self.key.read().clone().ok_or(VaultError::NotInitialized)
    }

    fn cipher(&self) -> Result<XChaCha20Poly1305> {
        let key = self.current_key()?;
        XChaCha20Poly1305::new_from_slice(key.expose_secret()).map_err(|_| VaultError::NotInitialized)
    }

    /// Encrypt under a fresh random nonce.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Envelope> {
        let cipher = self.cipher()?;
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

        let mut sealed = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad: ENVELOPE_AAD_V1,
                },
            )
            .map_err(|_| VaultError::StoreUnavailable("field encryption failed".into()))?;

        // aead output is ciphertext || tag
        let tag_start = sealed.len() - TAG_LEN;
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&sealed[tag_start..]);
        sealed.truncate(tag_start);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        nonce_bytes.copy_from_slice(&nonce);

        Ok(Envelope {
            version: ENVELOPE_VERSION,
            nonce: nonce_bytes,
            ciphertext: sealed,
            tag,
        })
    }

    /// Verify the tag and decrypt. Every failure is the same `Decrypt`.
    pub fn open(&self, envelope: &Envelope) -> Result<Zeroizing<Vec<u8>>> {
        let cipher = self.cipher()?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(VaultError::Decrypt);
        }

        let mut msg = Vec::with_capacity(envelope.ciphertext.len() + TAG_LEN);
        msg.extend_from_slice(&envelope.ciphertext);
        msg.extend_from_slice(&envelope.tag);

        let plaintext = cipher
            .decrypt(
                XNonce::from_slice(&envelope.nonce),
                Payload {
                    msg: &msg,
                    aad: ENVELOPE_AAD_V1,
                },
            )
            .map_err(|_| VaultError::Decrypt)?;
        Ok(Zeroizing::new(plaintext))
    }

    pub fn seal_str(&self, plaintext: &str) -> Result<String> {
        Ok(self.seal(plaintext.as_bytes())?.to_string())
    }

    /// Parse + open + UTF-8 decode, all failures collapsing to `Decrypt`.
    pub fn open_str(&self, envelope: &str) -> Result<Zeroizing<String>> {
        let envelope: Envelope = envelope.parse()?;
        self.open_envelope_str(&envelope)
    }

    pub fn open_envelope_str(&self, envelope: &Envelope) -> Result<Zeroizing<String>> {
        let mut bytes = self.open(envelope)?;
        let text = String::from_utf8(std::mem::take(&mut *bytes)).map_err(|e| {
            let mut raw = e.into_bytes();
            zeroize::Zeroize::zeroize(&mut raw);
            VaultError::Decrypt
        })?;
        Ok(Zeroizing::new(text))
    }
}

impl std::fmt::Debug for CipherEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherEngine")
            .field("params", &self.params)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SALT_LEN;

    const SALT: [u8; SALT_LEN] = [42u8; SALT_LEN];

    fn engine() -> CipherEngine {
        let engine = CipherEngine::new(KdfParams::insecure_fast());
        engine.initialize(b"correct horse battery staple", &SALT).unwrap();
        engine
    }

    #[test]
    fn roundtrip_various_payloads() {
        let engine = engine();
        let long = vec![0x5a; 4096];
        let payloads: [&[u8]; 4] = [b"", b"p@ss1", "pässwörd ✓".as_bytes(), &long];
        for p in payloads {
            let env = engine.seal(p).unwrap();
            assert_eq!(engine.open(&env).unwrap().as_slice(), p);
        }
    }

    #[test]
    fn roundtrip_through_text_form() {
        let engine = engine();
        let text = engine.seal_str("alice@x.com").unwrap();
        assert_eq!(engine.open_str(&text).unwrap().as_str(), "alice@x.com");
    }

    #[test]
    fn uninitialized_engine_refuses() {
        let engine = CipherEngine::new(KdfParams::insecure_fast());
        assert!(!engine.is_initialized());
        assert!(matches!(engine.seal(b"x"), Err(VaultError::NotInitialized)));

        let sealed = self::engine().seal(b"x").unwrap();
        assert!(matches!(engine.open(&sealed), Err(VaultError::NotInitialized)));
    }

    #[test]
    fn empty_secret_is_config_error() {
        let engine = CipherEngine::new(KdfParams::insecure_fast());
        assert!(matches!(engine.initialize(b"", &SALT), Err(VaultError::Config(_))));
        assert!(!engine.is_initialized());
    }

    #[test]
    fn identical_plaintexts_give_distinct_envelopes() {
        let engine = engine();
        let a = engine.seal(b"same").unwrap();
        let b = engine.seal(b"same").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn flipped_ciphertext_bits_fail() {
        let engine = engine();
        let env = engine.seal(b"attack at dawn").unwrap();
        for i in 0..env.ciphertext.len() * 8 {
            let mut bad = env.clone();
            bad.ciphertext[i / 8] ^= 1 << (i % 8);
            assert!(matches!(engine.open(&bad), Err(VaultError::Decrypt)));
        }
    }

    #[test]
    fn flipped_tag_bits_fail() {
        let engine = engine();
        let env = engine.seal(b"attack at dawn").unwrap();
        for i in 0..TAG_LEN * 8 {
            let mut bad = env.clone();
            bad.tag[i / 8] ^= 1 << (i % 8);
            assert!(matches!(engine.open(&bad), Err(VaultError::Decrypt)));
        }
    }

    #[test]
    fn flipped_nonce_never_yields_original() {
        let engine = engine();
        let env = engine.seal(b"attack at dawn").unwrap();
        for i in 0..NONCE_LEN * 8 {
            let mut bad = env.clone();
            bad.nonce[i / 8] ^= 1 << (i % 8);
            match engine.open(&bad) {
                Ok(p) => assert_ne!(p.as_slice(), b"attack at dawn"),
                Err(e) => assert!(matches!(e, VaultError::Decrypt)),
            }
        }
    }

    #[test]
    fn wrong_version_fails() {
        let engine = engine();
        let mut env = engine.seal(b"x").unwrap();
        env.version = 2;
        assert!(matches!(engine.open(&env), Err(VaultError::Decrypt)));
    }

    #[test]
    fn reinitialize_replaces_key() {
        let engine = engine();
        let env = engine.seal(b"before").unwrap();
        engine.initialize(b"another secret", &SALT).unwrap();
        assert!(matches!(engine.open(&env), Err(VaultError::Decrypt)));
        let env2 = engine.seal(b"after").unwrap();
        assert_eq!(engine.open(&env2).unwrap().as_slice(), b"after");
    }

    #[test]
    fn adopt_key_shares_key() {
        let a = engine();
        let b = CipherEngine::new(KdfParams::insecure_fast());
        b.adopt_key(&a).unwrap();
        let env = a.seal(b"shared").unwrap();
        assert_eq!(b.open(&env).unwrap().as_slice(), b"shared");
    }

    #[test]
    fn non_utf8_plaintext_is_decrypt_error() {
        let engine = engine();
        let env = engine.seal(&[0xff, 0xfe]).unwrap();
        assert!(matches!(engine.open_envelope_str(&env), Err(VaultError::Decrypt)));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let dbg = format!("{:?}", engine());
        assert!(dbg.contains("initialized: true"));
    }
}
