//! # Wallet Session
//!
//! Explicit session context carrying the user's wallet identity and
//! connectivity status. Every component that gates an action on "is a
//! wallet connected?" receives the same `Arc<WalletSession>` instead of
//! looking the state up ambiently.
//!
//! ```text
//! connect(identity) ──▶ WalletSession ◀── identity() ── ChainGateway
//!                          ▲                             SubmissionController
//! disconnect() ────────────┘
//! ```
//!
//! Key custody and signing live in the wallet provider (RPC node or
//! external signer). This module only tracks *which* account is active.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::types::{Address, HexError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(#[from] HexError),

    #[error("wallet is on chain {actual}, expected {expected}")]
    WrongNetwork { expected: u64, actual: u64 },
}

// ════════════════════════════════════════════════════════════════════════════════
// WALLET IDENTITY
// ════════════════════════════════════════════════════════════════════════════════

/// The externally-held account that authorises ledger writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletIdentity {
    pub address: Address,
    pub chain_id: u64,
}

impl WalletIdentity {
    pub fn new(address: Address, chain_id: u64) -> Self {
        Self { address, chain_id }
    }

    /// Parses a `0x`-prefixed hex address.
    pub fn from_hex(address: &str, chain_id: u64) -> Result<Self, WalletError> {
        Ok(Self::new(Address::from_hex(address)?, chain_id))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// WALLET SESSION
// ════════════════════════════════════════════════════════════════════════════════

/// Shared, thread-safe connectivity state for one user session.
///
/// The session is bound to one network; an identity from another chain is
/// refused on `connect`.
#[derive(Debug)]
pub struct WalletSession {
    chain_id: u64,
    identity: RwLock<Option<WalletIdentity>>,
}

impl WalletSession {
    /// Disconnected session for the given network.
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            identity: RwLock::new(None),
        }
    }

    /// Session already connected to `identity`.
    pub fn connected(identity: WalletIdentity) -> Self {
        Self {
            chain_id: identity.chain_id,
            identity: RwLock::new(Some(identity)),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn connect(&self, identity: WalletIdentity) -> Result<(), WalletError> {
        if identity.chain_id != self.chain_id {
            return Err(WalletError::WrongNetwork {
                expected: self.chain_id,
                actual: identity.chain_id,
            });
        }
        info!(address = %identity.address, chain_id = identity.chain_id, "wallet connected");
        *self.identity.write() = Some(identity);
        Ok(())
    }

    pub fn disconnect(&self) {
        if let Some(prev) = self.identity.write().take() {
            info!(address = %prev.address, "wallet disconnected");
        }
    }

    pub fn identity(&self) -> Option<WalletIdentity> {
        *self.identity.read()
    }

    pub fn is_connected(&self) -> bool {
        self.identity.read().is_some()
    }
}
