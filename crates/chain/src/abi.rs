//! # Contract Call Encoding
//!
//! Minimal Solidity ABI encoder for the vault contract's write functions.
//!
//! ## Layout
//!
//! ```text
//! calldata = selector (4) || head (32 × n) || tail
//!
//! selector = keccak256("name(type1,type2,...)")[0..4]
//! static  arg (uintN, bool) → 32-byte big-endian word in head
//! dynamic arg (string)      → offset word in head; tail gets
//!                             len (32) || utf8 bytes padded to 32
//! ```
//!
//! Argument order and declared widths are part of the ledger contract and
//! must not change: `uint32` arguments are still emitted as full words but
//! the function signature (and therefore the selector) names `uint32`.

use sha3::{Digest, Keccak256};

/// Size of one ABI word.
pub const WORD: usize = 32;

/// One typed call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint32(u32),
    /// `uint256`, restricted to values that fit in `u64`.
    Uint256(u64),
    Bool(bool),
    String(String),
}

impl AbiValue {
    /// Canonical type name used in the function signature.
    pub fn type_name(&self) -> &'static str {
        match self {
            AbiValue::Uint32(_) => "uint32",
            AbiValue::Uint256(_) => "uint256",
            AbiValue::Bool(_) => "bool",
            AbiValue::String(_) => "string",
        }
    }

    fn is_dynamic(&self) -> bool {
        matches!(self, AbiValue::String(_))
    }
}

fn word_from_u64(v: u64) -> [u8; WORD] {
    let mut w = [0u8; WORD];
    w[WORD - 8..].copy_from_slice(&v.to_be_bytes());
    w
}

/// `name(type1,type2,...)` for the given arguments.
pub fn function_signature(name: &str, args: &[AbiValue]) -> String {
    let types: Vec<&str> = args.iter().map(AbiValue::type_name).collect();
    format!("{}({})", name, types.join(","))
}

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Head/tail encoding of `args` (no selector).
pub fn encode_args(args: &[AbiValue]) -> Vec<u8> {
    let head_len = WORD * args.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for arg in args {
        match arg {
            AbiValue::Uint32(v) => head.extend_from_slice(&word_from_u64(u64::from(*v))),
            AbiValue::Uint256(v) => head.extend_from_slice(&word_from_u64(*v)),
            AbiValue::Bool(b) => head.extend_from_slice(&word_from_u64(u64::from(*b))),
            AbiValue::String(s) => {
                let offset = (head_len + tail.len()) as u64;
                head.extend_from_slice(&word_from_u64(offset));

                let bytes = s.as_bytes();
                tail.extend_from_slice(&word_from_u64(bytes.len() as u64));
                tail.extend_from_slice(bytes);
                let pad = (WORD - bytes.len() % WORD) % WORD;
                tail.resize(tail.len() + pad, 0);
            }
        }
    }

    debug_assert_eq!(head.len(), head_len);
    debug_assert!(args.iter().any(AbiValue::is_dynamic) || tail.is_empty());

    head.extend_from_slice(&tail);
    head
}

/// Full calldata: selector followed by the encoded arguments.
pub fn encode_call(name: &str, args: &[AbiValue]) -> Vec<u8> {
    let sig = function_signature(name, args);
    let mut out = Vec::with_capacity(4 + WORD * args.len());
    out.extend_from_slice(&selector(&sig));
    out.extend_from_slice(&encode_args(args));
    out
}
