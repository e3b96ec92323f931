//! # SyndiLoan Chain Library
//!
//! Everything that touches the external ledger.
//!
//! ## Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `types` | `Address`, `TxHash` |
//! | `wallet` | `WalletIdentity`, shared `WalletSession` |
//! | `abi` | Solidity call encoding (selector + head/tail) |
//! | `gateway` | `ChainGateway`, `LedgerTransport` trait, mock transport |
//! | `rpc` | `JsonRpcTransport` (`eth_sendTransaction` over HTTP) |
//!
//! ## Call Path
//!
//! ```text
//! ChainGateway ──LedgerCall──▶ dyn LedgerTransport ──▶ JSON-RPC endpoint
//!      │                                                      │
//!      └── WalletSession (identity gate)          TxHash ◀────┘
//! ```

pub mod abi;
pub mod gateway;
pub mod rpc;
pub mod types;
pub mod wallet;

pub use gateway::{
    ChainGateway, GatewayError, LedgerCall, LedgerTransport, LoanSubmission,
    MockLedgerTransport, RecordedCall, SyndicateSubmission,
};
pub use rpc::JsonRpcTransport;
pub use types::{Address, HexError, TxHash};
pub use wallet::{WalletError, WalletIdentity, WalletSession};
