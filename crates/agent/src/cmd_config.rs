//! Configuration Commands
//!
//! - `syndiloan-agent config show` - Print effective configuration
//! - `syndiloan-agent config show --json` - Same, as JSON
//!
//! Effective configuration = defaults, overridden by `--config <file>`,
//! overridden by `SYNDILOAN_*` environment variables. Secrets are always
//! redacted on output.

use std::path::Path;

use anyhow::{Context, Result};
use syndiloan_common::config::{self, ChainConfig};
use tracing::debug;

/// Loads, overrides and validates the configuration.
pub fn load_config(path: Option<&Path>) -> Result<ChainConfig> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// Same as [`load_config`] with an explicit variable source.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<ChainConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match path {
        Some(p) => {
            debug!(path = %p.display(), "loading config file");
            config::load_from_file(p)
                .with_context(|| format!("failed to load config from {}", p.display()))?
        }
        None => ChainConfig::default(),
    };
    cfg.apply_overrides_from(lookup)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Handles `config show [--json]`.
pub fn handle_config_show(cfg: &ChainConfig, json: bool) -> Result<()> {
    let shown = cfg.redacted();
    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!("Chain ID:          {}", shown.chain_id);
    println!("RPC URL:           {}", shown.rpc_url);
    println!("Contract:          {}", shown.contract_address);
    println!("Timeout:           {} ms", shown.timeout_ms);
    println!(
        "WalletConnect ID:  {}",
        shown.wallet_connect_project_id.as_deref().unwrap_or("(none)")
    );
    println!("RPC API key:       {}", shown.rpc_api_key.as_deref().unwrap_or("(none)"));
    println!(
        "Payload codec:     {}",
        if shown.encryption_key.is_some() { "aes-256-gcm" } else { "base64" }
    );
    Ok(())
}
