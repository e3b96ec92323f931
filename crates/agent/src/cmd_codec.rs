//! Payload codec commands: `encode`, `decode`, `gen-key`.
//!
//! The codec follows the configuration: AES-256-GCM when
//! `SYNDILOAN_ENCRYPTION_KEY` (or `encryption_key`) is set, base64 otherwise.

use anyhow::{Context, Result};
use syndiloan_common::{ChainConfig, EncodedPayload, SealedCodec};

pub fn encode_text(cfg: &ChainConfig, text: &str) -> Result<EncodedPayload> {
    let codec = cfg.payload_codec()?;
    codec
        .encode(text)
        .with_context(|| format!("{} encode failed", codec.name()))
}

pub fn decode_payload(cfg: &ChainConfig, payload: &str) -> Result<String> {
    let codec = cfg.payload_codec()?;
    codec
        .decode(&EncodedPayload::new(payload.trim()))
        .with_context(|| format!("{} decode failed", codec.name()))
}

/// Handles `encode <text>`.
pub fn handle_encode(cfg: &ChainConfig, text: &str) -> Result<()> {
    println!("{}", encode_text(cfg, text)?);
    Ok(())
}

/// Handles `decode <payload>`.
pub fn handle_decode(cfg: &ChainConfig, payload: &str) -> Result<()> {
    println!("{}", decode_payload(cfg, payload)?);
    Ok(())
}

/// Handles `gen-key`: prints a fresh 32-byte key as hex.
pub fn handle_gen_key() -> Result<()> {
    let key = SealedCodec::generate_key();
    println!("{}", hex::encode(key));
    eprintln!("Set SYNDILOAN_ENCRYPTION_KEY to this value. Do not share it.");
    Ok(())
}
