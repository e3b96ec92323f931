//! # SyndiLoan Agent CLI
//!
//! Command-line front end for confidential syndicated-loan submissions.
//!
//! ## Commands
//!
//! ### Ledger Writes
//! - `submit-loan --draft <file.toml>`: Encode purpose/collateral and record the loan
//! - `syndicate bid --amount <units> [--risk low|medium|high]`: Record an encoded participation bid
//! - `syndicate join --id <n>`: Join a syndicate
//! - `approve --loan-id <n> [--reject]`: Record a loan decision
//!
//! ### Payload Codec
//! - `encode <text>` / `decode <payload>`: Apply the configured codec
//! - `gen-key`: Generate a 32-byte AES-256-GCM key (hex)
//!
//! ### Diagnostics
//! - `config show [--json]`: Effective configuration, secrets redacted
//! - `status [--json]`: Check the RPC endpoint and its chain id
//!
//! ## Wallet
//!
//! Write commands act for `--from <0xaddr>`, falling back to
//! `SYNDILOAN_WALLET_ADDRESS`. With neither, the wallet is treated as not
//! connected and nothing is sent.
//!
//! ## Environment Variables
//!
//! - `SYNDILOAN_CHAIN_ID`, `SYNDILOAN_RPC_URL`, `SYNDILOAN_RPC_API_KEY`,
//!   `SYNDILOAN_CONTRACT_ADDRESS`, `SYNDILOAN_TIMEOUT_MS`,
//!   `SYNDILOAN_WALLET_CONNECT_PROJECT_ID`, `SYNDILOAN_ENCRYPTION_KEY`
//! - `RUST_LOG`: log filter (default: info)

mod cmd_codec;
mod cmd_config;
mod cmd_submit;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use syndiloan_common::RiskLevel;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "SyndiLoan Agent CLI")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Wallet address that authorises ledger writes
    #[arg(long, global = true, env = "SYNDILOAN_WALLET_ADDRESS")]
    from: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a loan application draft and record it on-chain
    SubmitLoan {
        /// Draft file (TOML)
        #[arg(long)]
        draft: PathBuf,
    },

    /// Syndication participation
    Syndicate {
        #[command(subcommand)]
        syndicate_cmd: SyndicateCommands,
    },

    /// Record an approval (or rejection with --reject) for a loan
    Approve {
        #[arg(long)]
        loan_id: u64,
        #[arg(long)]
        reject: bool,
    },

    /// Encode text with the configured payload codec
    Encode { text: String },

    /// Decode a payload with the configured payload codec
    Decode { payload: String },

    /// Generate a random 32-byte encryption key (hex)
    GenKey,

    /// Configuration inspection
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },

    /// Check the RPC endpoint and its chain id
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SyndicateCommands {
    /// Submit an encoded participation bid
    Bid {
        /// Participation amount in whole units
        #[arg(long)]
        amount: String,
        #[arg(long, value_enum, default_value_t = RiskArg::Medium)]
        risk: RiskArg,
    },
    /// Join an existing syndicate
    Join {
        #[arg(long)]
        id: u64,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RiskArg {
    Low,
    Medium,
    High,
}

impl From<RiskArg> for RiskLevel {
    fn from(r: RiskArg) -> Self {
        match r {
            RiskArg::Low => RiskLevel::Low,
            RiskArg::Medium => RiskLevel::Medium,
            RiskArg::High => RiskLevel::High,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // gen-key needs no configuration
    if let Commands::GenKey = cli.cmd {
        return cmd_codec::handle_gen_key();
    }

    let cfg = cmd_config::load_config(cli.config.as_deref())?;
    let from = cli.from.as_deref();

    let succeeded = match cli.cmd {
        Commands::SubmitLoan { draft } => cmd_submit::handle_submit_loan(&cfg, from, &draft).await?,
        Commands::Syndicate { syndicate_cmd } => match syndicate_cmd {
            SyndicateCommands::Bid { amount, risk } => {
                cmd_submit::handle_syndicate_bid(&cfg, from, &amount, risk.into()).await?
            }
            SyndicateCommands::Join { id } => {
                cmd_submit::handle_syndicate_join(&cfg, from, id).await?
            }
        },
        Commands::Approve { loan_id, reject } => {
            cmd_submit::handle_approve(&cfg, from, loan_id, !reject).await?
        }
        Commands::Encode { text } => {
            cmd_codec::handle_encode(&cfg, &text)?;
            true
        }
        Commands::Decode { payload } => {
            cmd_codec::handle_decode(&cfg, &payload)?;
            true
        }
        Commands::Config { config_cmd } => match config_cmd {
            ConfigCommands::Show { json } => {
                cmd_config::handle_config_show(&cfg, json)?;
                true
            }
        },
        Commands::Status { json } => cmd_submit::handle_status(&cfg, json).await?,
        Commands::GenKey => true,
    };

    // Exit code: 0 = completed, 1 = rejected / failed
    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
