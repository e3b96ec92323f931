//! # SyndiLoan Common Crate
//!
//! Shared building blocks for the confidential submission workflow.
//!
//! ## Modules
//! - `codec`: payload codecs (base64, AES-256-GCM) for confidential text fields
//! - `amount`: fixed-point amount, interest rate and term parsing
//! - `draft`: loan application and syndicate bid form state
//! - `config`: ledger client configuration (TOML + environment)
//!
//! ## Data Flow
//! ```text
//! LoanApplicationDraft ──loan_terms()──▶ LoanTerms { Amount, InterestRate, LoanTerm }
//!        │
//!        └── purpose / collateral ──PayloadCodec::encode()──▶ EncodedPayload
//! ```

pub mod amount;
pub mod codec;
pub mod config;
pub mod draft;

pub use amount::{Amount, AmountError, InterestRate, LoanTerm, DAYS_PER_MONTH};
pub use codec::{Base64Codec, CodecError, EncodedPayload, PayloadCodec, SealedCodec};
pub use config::{ChainConfig, ConfigError};
pub use draft::{
    CreditRating, DraftError, LoanApplicationDraft, LoanTerms, RiskLevel, SyndicateBidDraft,
};
