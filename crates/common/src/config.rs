//! Ledger client configuration: TOML file, environment overrides, literal defaults.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `SYNDILOAN_CHAIN_ID` | `chain_id` | `11155111` (Sepolia) |
//! | `SYNDILOAN_RPC_URL` | `rpc_url` | `http://127.0.0.1:8545` |
//! | `SYNDILOAN_WALLET_CONNECT_PROJECT_ID` | `wallet_connect_project_id` | none |
//! | `SYNDILOAN_RPC_API_KEY` | `rpc_api_key` | none |
//! | `SYNDILOAN_CONTRACT_ADDRESS` | `contract_address` | vault address |
//! | `SYNDILOAN_TIMEOUT_MS` | `timeout_ms` | `30000` |
//! | `SYNDILOAN_ENCRYPTION_KEY` | `encryption_key` | none |
//!
//! Precedence: environment > file > defaults.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::codec::{Base64Codec, PayloadCodec, SealedCodec};

// ════════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ════════════════════════════════════════════════════════════════════════════════

pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const ENV_CHAIN_ID: &str = "SYNDILOAN_CHAIN_ID";
pub const ENV_RPC_URL: &str = "SYNDILOAN_RPC_URL";
pub const ENV_WALLET_CONNECT_PROJECT_ID: &str = "SYNDILOAN_WALLET_CONNECT_PROJECT_ID";
pub const ENV_RPC_API_KEY: &str = "SYNDILOAN_RPC_API_KEY";
pub const ENV_CONTRACT_ADDRESS: &str = "SYNDILOAN_CONTRACT_ADDRESS";
pub const ENV_TIMEOUT_MS: &str = "SYNDILOAN_TIMEOUT_MS";
pub const ENV_ENCRYPTION_KEY: &str = "SYNDILOAN_ENCRYPTION_KEY";

const REDACTED: &str = "<redacted>";

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{name} invalid: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        reason: reason.into(),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// CHAIN CONFIG
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// EVM chain id of the target network.
    pub chain_id: u64,

    /// JSON-RPC endpoint.
    pub rpc_url: String,

    /// Wallet-connect relay project id (32 hex chars).
    pub wallet_connect_project_id: Option<String>,

    /// Bearer token for hosted RPC providers.
    pub rpc_api_key: Option<String>,

    /// Vault contract every call targets.
    pub contract_address: String,

    /// Request timeout in milliseconds.
    pub timeout_ms: u64,

    /// 64 hex chars. When set, sensitive fields are sealed with AES-256-GCM
    /// instead of plain base64.
    pub encryption_key: Option<String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            chain_id: DEFAULT_CHAIN_ID,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            wallet_connect_project_id: None,
            rpc_api_key: None,
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            encryption_key: None,
        }
    }
}

impl fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.redacted();
        f.debug_struct("ChainConfig")
            .field("chain_id", &shown.chain_id)
            .field("rpc_url", &shown.rpc_url)
            .field("wallet_connect_project_id", &shown.wallet_connect_project_id)
            .field("rpc_api_key", &shown.rpc_api_key)
            .field("contract_address", &shown.contract_address)
            .field("timeout_ms", &shown.timeout_ms)
            .field("encryption_key", &shown.encryption_key)
            .finish()
    }
}

impl ChainConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable source.
    ///
    /// A variable that is set but blank counts as unset and leaves the
    /// current value in place.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(val) = lookup(ENV_CHAIN_ID) {
            self.chain_id = val
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid(ENV_CHAIN_ID, format!("'{}' is not a number", val)))?;
        }
        if let Some(val) = lookup(ENV_RPC_URL) {
            self.rpc_url = val;
        }
        if let Some(val) = lookup(ENV_WALLET_CONNECT_PROJECT_ID) {
            self.wallet_connect_project_id = Some(val);
        }
        if let Some(val) = lookup(ENV_RPC_API_KEY) {
            self.rpc_api_key = Some(val);
        }
        if let Some(val) = lookup(ENV_CONTRACT_ADDRESS) {
            self.contract_address = val;
        }
        if let Some(val) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = val
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid(ENV_TIMEOUT_MS, format!("'{}' is not a number", val)))?;
        }
        if let Some(val) = lookup(ENV_ENCRYPTION_KEY) {
            self.encryption_key = Some(val);
        }
        Ok(())
    }

    /// Checks every field; returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id == 0 {
            return Err(invalid("chain_id", "must be non-zero"));
        }
        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            return Err(invalid(
                "rpc_url",
                format!("'{}' must start with http:// or https://", self.rpc_url),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(invalid("timeout_ms", "must be non-zero"));
        }
        if let Some(ref id) = self.wallet_connect_project_id {
            if id.len() != 32 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid("wallet_connect_project_id", "must be 32 hex characters"));
            }
        }
        if let Some(ref key) = self.rpc_api_key {
            if key.trim().is_empty() {
                return Err(invalid("rpc_api_key", "must not be blank"));
            }
        }
        validate_address_hex(&self.contract_address)
            .map_err(|reason| invalid("contract_address", reason))?;
        if let Some(ref key) = self.encryption_key {
            SealedCodec::from_hex(key).map_err(|e| invalid("encryption_key", e.to_string()))?;
        }
        Ok(())
    }

    /// Codec for confidential fields: sealed when a key is configured,
    /// base64 otherwise.
    pub fn payload_codec(&self) -> Result<Arc<dyn PayloadCodec>, ConfigError> {
        match self.encryption_key {
            Some(ref key) => {
                let codec = SealedCodec::from_hex(key)
                    .map_err(|e| invalid("encryption_key", e.to_string()))?;
                debug!("confidential fields sealed with aes-256-gcm");
                Ok(Arc::new(codec))
            }
            None => {
                debug!("no encryption key configured, using base64 payloads");
                Ok(Arc::new(Base64Codec))
            }
        }
    }

    /// Copy with secrets replaced, safe to log or print.
    pub fn redacted(&self) -> Self {
        let mut out = self.clone();
        if out.rpc_api_key.is_some() {
            out.rpc_api_key = Some(REDACTED.to_string());
        }
        if out.encryption_key.is_some() {
            out.encryption_key = Some(REDACTED.to_string());
        }
        out
    }
}

/// `0x` followed by 40 hex characters.
pub fn validate_address_hex(address: &str) -> Result<(), String> {
    let body = address
        .strip_prefix("0x")
        .ok_or_else(|| format!("'{}' must start with 0x", address))?;
    if body.len() != 40 {
        return Err(format!("'{}' must have 40 hex characters after 0x", address));
    }
    if !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("'{}' contains non-hex characters", address));
    }
    Ok(())
}

/// Load config from a TOML file path. Missing keys take their defaults.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<ChainConfig, ConfigError> {
    let s = fs::read_to_string(path.as_ref())?;
    let cfg: ChainConfig = toml::from_str(&s)?;
    debug!(path = %path.as_ref().display(), chain_id = cfg.chain_id, "config file loaded");
    Ok(cfg)
}
