//! Core ledger types: 20-byte account addresses and 32-byte transaction hashes.

use std::fmt;
use std::str::FromStr;

use hex::{decode as hex_decode, encode as hex_encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexError> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex_decode(s).map_err(|e| HexError::InvalidHex(e.to_string()))?;
    if bytes.len() != N {
        return Err(HexError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

// ════════════════════════════════════════════════════════════════════════════
// ADDRESS
// ════════════════════════════════════════════════════════════════════════════

/// 20-byte EVM account address. Displayed as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn from_bytes(b: [u8; 20]) -> Self {
        Address(b)
    }
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex_encode(self.0))
    }
    pub fn from_hex(s: &str) -> Result<Self, HexError> {
        decode_fixed::<20>(s).map(Address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.to_hex()).finish()
    }
}
impl FromStr for Address {
    type Err = HexError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

/* --- serde as hex string --- */
impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}
impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TRANSACTION HASH
// ════════════════════════════════════════════════════════════════════════════

/// Handle returned by the ledger for an accepted write: the 32-byte
/// transaction hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex_encode(self.0))
    }
    pub fn from_hex(s: &str) -> Result<Self, HexError> {
        decode_fixed::<32>(s).map(TxHash)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TxHash").field(&self.to_hex()).finish()
    }
}
impl Serialize for TxHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_roundtrip() {
        let a = Address::from_hex("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6").unwrap();
        assert_eq!(a.to_hex(), "0x742d35cc6634c0532925a3b8d4c9db96c4b4d8b6");
        assert_eq!(a, a.to_hex().parse::<Address>().unwrap());
        // prefix optional on input
        assert_eq!(a, Address::from_hex("742d35cc6634c0532925a3b8d4c9db96c4b4d8b6").unwrap());
    }

    #[test]
    fn address_rejects_bad_input() {
        assert_eq!(
            Address::from_hex("0x1234"),
            Err(HexError::InvalidLength { expected: 20, actual: 2 })
        );
        assert!(matches!(Address::from_hex("0xzz"), Err(HexError::InvalidHex(_))));
    }

    #[test]
    fn address_serde_as_hex() {
        let a = Address([0xAB; 20]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn tx_hash_parse() {
        let raw = format!("0x{}", "11".repeat(32));
        let h = TxHash::from_hex(&raw).unwrap();
        assert_eq!(h.as_bytes(), &[0x11; 32]);
        assert_eq!(h.to_string(), raw);
        assert!(TxHash::from_hex("0x11").is_err());
    }
}
