// src/crypto/envelope.rs
//! Self-describing container for one sealed field
//!
//! Text form (scheme v1):
//!   v1:<nonce hex, 24 bytes>:<ciphertext base64>:<tag hex, 16 bytes>

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Serialize, Serializer};

use crate::consts::{ENVELOPE_VERSION, NONCE_LEN, TAG_LEN};
use crate::error::VaultError;

#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    pub(crate) version: u8,
    pub(crate) nonce: [u8; NONCE_LEN],
    pub(crate) ciphertext: Vec<u8>,
    pub(crate) tag: [u8; TAG_LEN],
}

impl Envelope {
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{}:{}:{}:{}",
            self.version,
            hex::encode(self.nonce),
            STANDARD.encode(&self.ciphertext),
            hex::encode(self.tag)
        )
    }
}

// Ciphertext is not secret, but keep log lines short and uniform.
impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("version", &self.version)
            .field("len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

impl FromStr for Envelope {
    type Err = VaultError;

    /// Any syntax problem is reported as the same opaque `Decrypt` error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(version), Some(nonce), Some(ciphertext), Some(tag), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(VaultError::Decrypt);
        };

        let version: u8 = version
            .strip_prefix('v')
            .and_then(|v| v.parse().ok())
            .ok_or(VaultError::Decrypt)?;
        if version != ENVELOPE_VERSION {
            return Err(VaultError::Decrypt);
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        hex::decode_to_slice(nonce, &mut nonce_bytes).map_err(|_| VaultError::Decrypt)?;
        let mut tag_bytes = [0u8; TAG_LEN];
        hex::decode_to_slice(tag, &mut tag_bytes).map_err(|_| VaultError::Decrypt)?;
        let ciphertext = STANDARD.decode(ciphertext).map_err(|_| VaultError::Decrypt)?;

        Ok(Self {
            version,
            nonce: nonce_bytes,
            ciphertext,
            tag: tag_bytes,
        })
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Best-effort structural check used to tell legacy plaintext rows apart.
/// Not a security boundary: a plaintext value can look sealed.
pub fn looks_sealed(text: &str) -> bool {
    text.parse::<Envelope>().is_ok()
}
