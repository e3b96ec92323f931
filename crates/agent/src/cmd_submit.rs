//! Ledger Write Commands
//!
//! - `submit-loan --draft <file.toml>`
//! - `syndicate bid --amount <units> [--risk <level>]`
//! - `syndicate join --id <n>`
//! - `approve --loan-id <n> [--reject]`
//! - `status` - endpoint reachability and chain id check
//!
//! All write commands act on behalf of `--from` (or
//! `SYNDILOAN_WALLET_ADDRESS`). Without an address the session stays
//! disconnected and the controller refuses the action.
//!
//! # Exit Codes
//!
//! - 0: outcome is `Completed`
//! - 1: anything else

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use syndiloan_chain::{Address, ChainGateway, JsonRpcTransport, WalletIdentity, WalletSession};
use syndiloan_client::{
    Notification, NotificationKind, Notifier, SubmissionController, SubmissionOutcome,
};
use syndiloan_common::{ChainConfig, LoanApplicationDraft, RiskLevel, SyndicateBidDraft};
use tracing::info;

// ════════════════════════════════════════════════════════════════════════════
// CONSOLE NOTIFIER
// ════════════════════════════════════════════════════════════════════════════

/// Prints notifications the way the rest of the CLI prints status lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, n: Notification) {
        match n.kind {
            NotificationKind::Success => println!("✓ {}", n),
            NotificationKind::Destructive => eprintln!("✗ {}", n),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// WIRING
// ════════════════════════════════════════════════════════════════════════════

/// Session for `from`, disconnected when no address was given.
pub fn open_session(cfg: &ChainConfig, from: Option<&str>) -> Result<Arc<WalletSession>> {
    let session = WalletSession::new(cfg.chain_id);
    if let Some(addr) = from {
        let identity = WalletIdentity::from_hex(addr, cfg.chain_id)
            .with_context(|| format!("invalid --from address '{}'", addr))?;
        session.connect(identity)?;
    }
    Ok(Arc::new(session))
}

fn transport(cfg: &ChainConfig) -> Result<JsonRpcTransport> {
    Ok(JsonRpcTransport::new(
        cfg.rpc_url.clone(),
        cfg.rpc_api_key.clone(),
        Duration::from_millis(cfg.timeout_ms),
    )?)
}

pub fn build_controller(cfg: &ChainConfig, from: Option<&str>) -> Result<SubmissionController> {
    let contract = Address::from_hex(&cfg.contract_address)
        .with_context(|| format!("invalid contract address '{}'", cfg.contract_address))?;
    let session = open_session(cfg, from)?;
    let gateway = ChainGateway::new(Box::new(transport(cfg)?), session, contract);
    let codec = cfg.payload_codec()?;
    info!(contract = %contract, codec = codec.name(), rpc = %cfg.rpc_url, "controller ready");
    Ok(SubmissionController::new(gateway, codec, Arc::new(ConsoleNotifier)))
}

fn report(outcome: &SubmissionOutcome) -> bool {
    if let Some(tx) = outcome.tx_hash() {
        println!("Transaction: {}", tx);
    }
    outcome.is_completed()
}

// ════════════════════════════════════════════════════════════════════════════
// HANDLERS
// ════════════════════════════════════════════════════════════════════════════

pub fn read_draft(path: &Path) -> Result<LoanApplicationDraft> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read draft {}", path.display()))?;
    LoanApplicationDraft::from_toml(&text)
        .with_context(|| format!("failed to parse draft {}", path.display()))
}

/// Handles `submit-loan`. Returns `true` when the loan was recorded.
pub async fn handle_submit_loan(cfg: &ChainConfig, from: Option<&str>, draft: &Path) -> Result<bool> {
    let draft = read_draft(draft)?;
    let controller = build_controller(cfg, from)?;
    Ok(report(&controller.submit_loan(&draft).await))
}

/// Handles `syndicate bid`.
pub async fn handle_syndicate_bid(
    cfg: &ChainConfig,
    from: Option<&str>,
    amount: &str,
    risk: RiskLevel,
) -> Result<bool> {
    let controller = build_controller(cfg, from)?;
    let bid = SyndicateBidDraft::new(amount, risk);
    Ok(report(&controller.submit_syndicate_bid(&bid).await))
}

/// Handles `syndicate join`.
pub async fn handle_syndicate_join(cfg: &ChainConfig, from: Option<&str>, id: u64) -> Result<bool> {
    let controller = build_controller(cfg, from)?;
    Ok(report(&controller.join_syndicate(id).await))
}

/// Handles `approve`.
pub async fn handle_approve(
    cfg: &ChainConfig,
    from: Option<&str>,
    loan_id: u64,
    approved: bool,
) -> Result<bool> {
    let controller = build_controller(cfg, from)?;
    Ok(report(&controller.approve_loan_data(loan_id, approved).await))
}

#[derive(Debug, Serialize)]
struct StatusReport {
    rpc_url: String,
    expected_chain_id: u64,
    reachable: bool,
    latency_ms: u64,
    error: Option<String>,
}

/// Handles `status [--json]`. Returns `true` when the endpoint answers
/// with the configured chain id.
pub async fn handle_status(cfg: &ChainConfig, json: bool) -> Result<bool> {
    let transport = transport(cfg)?;
    let start = Instant::now();
    let result = transport.verify_chain_id(cfg.chain_id).await;
    let report = StatusReport {
        rpc_url: cfg.rpc_url.clone(),
        expected_chain_id: cfg.chain_id,
        reachable: result.is_ok(),
        latency_ms: start.elapsed().as_millis() as u64,
        error: result.err().map(|e| e.to_string()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let symbol = if report.reachable { "✓" } else { "✗" };
        println!("{} {} (chain {})", symbol, report.rpc_url, report.expected_chain_id);
        println!("  latency: {} ms", report.latency_ms);
        if let Some(ref err) = report.error {
            println!("  error:   {}", err);
        }
    }
    Ok(report.reachable)
}
