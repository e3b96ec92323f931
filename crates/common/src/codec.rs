//! # Payload Codecs
//!
//! Turns free-text loan fields (purpose, collateral, syndication terms)
//! into opaque payload strings that travel as `string` arguments of a
//! ledger call, and back.
//!
//! ## Codecs
//!
//! | Codec | Confidential | Deterministic | Payload format |
//! |-------|--------------|---------------|----------------|
//! | [`Base64Codec`] | no | yes | `base64(utf8(text))` |
//! | [`SealedCodec`] | yes | no (random nonce) | `base64(nonce ‖ ciphertext ‖ tag)` |
//!
//! `Base64Codec` is what the deployed vault contract expects today. Anyone
//! holding the payload can read it back, no key involved. `SealedCodec`
//! is AES-256-GCM keyed by a secret that never appears in the payload.
//!
//! ## Round-trip
//!
//! For every codec and every `text` (empty and non-ASCII included):
//!
//! ```text
//! decode(encode(text)) == text
//! ```

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

// ════════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ════════════════════════════════════════════════════════════════════════════════

/// AES-GCM nonce length in bytes (96-bit).
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes (128-bit).
pub const TAG_LEN: usize = 16;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

// ════════════════════════════════════════════════════════════════════════════════
// ENCODED PAYLOAD
// ════════════════════════════════════════════════════════════════════════════════

/// Opaque text payload produced by a [`PayloadCodec`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedPayload(String);

impl EncodedPayload {
    /// Wraps a payload string received from elsewhere (ledger, CLI).
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

/// Errors raised while decoding a payload, or while sealing one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("payload is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("decoded payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("sealed payload too short: {len} bytes, need at least {min}")]
    PayloadTooShort { len: usize, min: usize },

    /// Wrong key or tampered payload.
    #[error("payload authentication failed")]
    AuthenticationFailed,

    #[error("payload encryption failed")]
    EncryptionFailed,

    #[error("invalid encryption key: {0}")]
    InvalidKey(String),
}

// ════════════════════════════════════════════════════════════════════════════════
// CODEC TRAIT
// ════════════════════════════════════════════════════════════════════════════════

/// Reversible text ↔ payload transformation.
///
/// Implementations are pure apart from nonce generation and must satisfy
/// `decode(encode(x)) == x`.
pub trait PayloadCodec: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn encode(&self, plaintext: &str) -> Result<EncodedPayload, CodecError>;

    fn decode(&self, payload: &EncodedPayload) -> Result<String, CodecError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// BASE64 CODEC
// ════════════════════════════════════════════════════════════════════════════════

/// Keyless, reversible byte-to-text encoding. Not confidential.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

impl Base64Codec {
    /// Infallible form of [`PayloadCodec::encode`].
    pub fn encode_text(plaintext: &str) -> EncodedPayload {
        EncodedPayload(BASE64.encode(plaintext.as_bytes()))
    }
}

impl PayloadCodec for Base64Codec {
    fn name(&self) -> &'static str {
        "base64"
    }

    fn encode(&self, plaintext: &str) -> Result<EncodedPayload, CodecError> {
        Ok(Self::encode_text(plaintext))
    }

    fn decode(&self, payload: &EncodedPayload) -> Result<String, CodecError> {
        let bytes = BASE64
            .decode(payload.as_str())
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// SEALED CODEC (AES-256-GCM)
// ════════════════════════════════════════════════════════════════════════════════
// Payload layout before base64:
//
//   nonce (12) || ciphertext (len(plaintext)) || tag (16)
//
// INVARIANTS:
// - fresh random nonce per encode
// - tag verified before any plaintext is returned
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated encryption codec. The key never leaves this struct and
/// is wiped when the codec is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SealedCodec {
    key: [u8; KEY_LEN],
}

impl SealedCodec {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Builds a codec from a 64-char hex key (optional `0x` prefix).
    pub fn from_hex(key_hex: &str) -> Result<Self, CodecError> {
        let trimmed = key_hex.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = Zeroizing::new(
            hex::decode(trimmed).map_err(|e| CodecError::InvalidKey(e.to_string()))?,
        );
        if bytes.len() != KEY_LEN {
            return Err(CodecError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        let codec = Self::new(key);
        key.zeroize();
        Ok(codec)
    }

    /// Random 32-byte key from the OS RNG.
    pub fn generate_key() -> [u8; KEY_LEN] {
        let mut k = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut k);
        k
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }
}

impl fmt::Debug for SealedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print key material
        f.debug_struct("SealedCodec").field("key", &"<redacted>").finish()
    }
}

impl PayloadCodec for SealedCodec {
    fn name(&self) -> &'static str {
        "aes-256-gcm"
    }

    fn encode(&self, plaintext: &str) -> Result<EncodedPayload, CodecError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        // aes-gcm appends the tag to the ciphertext
        let sealed = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| CodecError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(EncodedPayload(BASE64.encode(out)))
    }

    fn decode(&self, payload: &EncodedPayload) -> Result<String, CodecError> {
        let blob = BASE64
            .decode(payload.as_str())
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;

        let min = NONCE_LEN + TAG_LEN;
        if blob.len() < min {
            return Err(CodecError::PayloadTooShort { len: blob.len(), min });
        }

        let (nonce_bytes, sealed) = blob.split_at(NONCE_LEN);
        let plain = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| CodecError::AuthenticationFailed)?;

        String::from_utf8(plain).map_err(|_| CodecError::InvalidUtf8)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════
