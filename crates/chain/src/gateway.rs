//! # ChainGateway: Vault Contract Write Boundary
//!
//! The only component allowed to mutate the external ledger. Exposes one
//! method per vault write function, all targeting a single fixed contract
//! address and gated on the injected [`WalletSession`].
//!
//! ## Architecture
//!
//! ```text
//! SubmissionController
//!      │
//!      ▼
//! ChainGateway::submit_encrypted_loan() / join_syndicate() / ...
//!      │
//!      ├─ WalletSession::identity()  ── None ──▶ Err(WalletNotConnected)
//!      │                                         (nothing dispatched)
//!      ├─ Build LedgerCall
//!      └─ Delegate to dyn LedgerTransport
//!      │
//!      ▼
//! Result<TxHash, GatewayError>
//! ```
//!
//! ## Wire Contract
//!
//! | Operation | Solidity function |
//! |-----------|-------------------|
//! | `submit_encrypted_loan` | `encryptLoanData(uint32,uint32,uint32,string,string)` |
//! | `submit_encrypted_syndicate` | `encryptSyndicateData(uint32,uint32,string)` |
//! | `join_syndicate` | `joinSyndicate(uint256)` |
//! | `approve_loan_data` | `approveLoanData(uint256,bool)` |
//!
//! ## No Implicit Retry
//!
//! One call, one attempt. The gateway holds no ledger state; each
//! accepted call creates an append-only record on the ledger side.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use syndiloan_common::{EncodedPayload, LoanTerms};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::abi::{self, AbiValue};
use crate::types::{Address, TxHash};
use crate::wallet::{WalletIdentity, WalletSession};

// ════════════════════════════════════════════════════════════════════════════════
// REQUESTS
// ════════════════════════════════════════════════════════════════════════════════

/// Arguments of `encryptLoanData`, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanSubmission {
    /// Whole currency units.
    pub amount: u32,
    /// Basis points.
    pub interest_rate_bps: u32,
    pub term_days: u32,
    pub encrypted_purpose: EncodedPayload,
    pub encrypted_collateral: EncodedPayload,
}

impl LoanSubmission {
    pub fn new(
        terms: &LoanTerms,
        encrypted_purpose: EncodedPayload,
        encrypted_collateral: EncodedPayload,
    ) -> Self {
        Self {
            amount: terms.amount.units(),
            interest_rate_bps: terms.interest_rate.bps(),
            term_days: terms.term.days(),
            encrypted_purpose,
            encrypted_collateral,
        }
    }
}

/// Arguments of `encryptSyndicateData`, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyndicateSubmission {
    pub total_commitment: u32,
    pub risk_level: u32,
    pub encrypted_terms: EncodedPayload,
}

/// One vault write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    EncryptLoanData(LoanSubmission),
    EncryptSyndicateData(SyndicateSubmission),
    JoinSyndicate { syndicate_id: u64 },
    ApproveLoanData { loan_id: u64, approved: bool },
}

impl LedgerCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            LedgerCall::EncryptLoanData(_) => "encryptLoanData",
            LedgerCall::EncryptSyndicateData(_) => "encryptSyndicateData",
            LedgerCall::JoinSyndicate { .. } => "joinSyndicate",
            LedgerCall::ApproveLoanData { .. } => "approveLoanData",
        }
    }

    /// Typed arguments in declaration order.
    pub fn args(&self) -> Vec<AbiValue> {
        match self {
            LedgerCall::EncryptLoanData(s) => vec![
                AbiValue::Uint32(s.amount),
                AbiValue::Uint32(s.interest_rate_bps),
                AbiValue::Uint32(s.term_days),
                AbiValue::String(s.encrypted_purpose.as_str().to_string()),
                AbiValue::String(s.encrypted_collateral.as_str().to_string()),
            ],
            LedgerCall::EncryptSyndicateData(s) => vec![
                AbiValue::Uint32(s.total_commitment),
                AbiValue::Uint32(s.risk_level),
                AbiValue::String(s.encrypted_terms.as_str().to_string()),
            ],
            LedgerCall::JoinSyndicate { syndicate_id } => vec![AbiValue::Uint256(*syndicate_id)],
            LedgerCall::ApproveLoanData { loan_id, approved } => {
                vec![AbiValue::Uint256(*loan_id), AbiValue::Bool(*approved)]
            }
        }
    }

    pub fn signature(&self) -> String {
        abi::function_signature(self.function_name(), &self.args())
    }

    /// ABI calldata: selector || encoded arguments.
    pub fn calldata(&self) -> Vec<u8> {
        abi::encode_call(self.function_name(), &self.args())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// ERROR
// ════════════════════════════════════════════════════════════════════════════════

/// Failures of a gateway call.
///
/// `WalletNotConnected` is raised locally before anything is sent. Every
/// other variant comes from the transport or the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("wallet not connected")]
    WalletNotConnected,

    /// The ledger refused the call (revert, gas, nonce, ...).
    #[error("ledger rejected call (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Human-readable reason suitable for a user notification, if the
    /// failure carried one.
    pub fn reason(&self) -> Option<String> {
        match self {
            GatewayError::Rejected { message, .. } | GatewayError::Network(message) => {
                let trimmed = message.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            other => Some(other.to_string()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// TRANSPORT TRAIT
// ════════════════════════════════════════════════════════════════════════════════

/// Async transport abstraction for vault writes.
///
/// ## Contract
///
/// - Implementations MUST NOT modify the call.
/// - Implementations MUST NOT retry internally.
/// - Implementations MUST return `GatewayError::Timeout` for timeouts.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn send_call(
        &self,
        from: &WalletIdentity,
        contract: &Address,
        call: &LedgerCall,
    ) -> Result<TxHash, GatewayError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// GATEWAY
// ════════════════════════════════════════════════════════════════════════════════

/// Capability-restricted client for the vault contract.
pub struct ChainGateway {
    transport: Box<dyn LedgerTransport>,
    session: Arc<WalletSession>,
    contract: Address,
}

impl fmt::Debug for ChainGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainGateway")
            .field("contract", &self.contract)
            .field("connected", &self.session.is_connected())
            .finish()
    }
}

impl ChainGateway {
    #[must_use]
    pub fn new(
        transport: Box<dyn LedgerTransport>,
        session: Arc<WalletSession>,
        contract: Address,
    ) -> Self {
        Self {
            transport,
            session,
            contract,
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn session(&self) -> &Arc<WalletSession> {
        &self.session
    }

    pub async fn submit_encrypted_loan(
        &self,
        submission: LoanSubmission,
    ) -> Result<TxHash, GatewayError> {
        self.dispatch(LedgerCall::EncryptLoanData(submission)).await
    }

    pub async fn submit_encrypted_syndicate(
        &self,
        submission: SyndicateSubmission,
    ) -> Result<TxHash, GatewayError> {
        self.dispatch(LedgerCall::EncryptSyndicateData(submission)).await
    }

    pub async fn join_syndicate(&self, syndicate_id: u64) -> Result<TxHash, GatewayError> {
        self.dispatch(LedgerCall::JoinSyndicate { syndicate_id }).await
    }

    pub async fn approve_loan_data(
        &self,
        loan_id: u64,
        approved: bool,
    ) -> Result<TxHash, GatewayError> {
        self.dispatch(LedgerCall::ApproveLoanData { loan_id, approved }).await
    }

    async fn dispatch(&self, call: LedgerCall) -> Result<TxHash, GatewayError> {
        // identity check happens before the first await point
        let from = self.session.identity().ok_or_else(|| {
            warn!(function = call.function_name(), "refusing call without wallet identity");
            GatewayError::WalletNotConnected
        })?;

        debug!(
            function = call.function_name(),
            from = %from.address,
            contract = %self.contract,
            "dispatching ledger call"
        );

        let result = self.transport.send_call(&from, &self.contract, &call).await;
        match &result {
            Ok(tx) => info!(function = call.function_name(), tx = %tx, "ledger call accepted"),
            Err(e) => warn!(function = call.function_name(), error = %e, "ledger call failed"),
        }
        result
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// MOCK TRANSPORT
// ════════════════════════════════════════════════════════════════════════════════

/// A call as seen by [`MockLedgerTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub from: WalletIdentity,
    pub contract: Address,
    pub call: LedgerCall,
}

/// Mock transport for testing without a ledger.
///
/// Responses are pre-loaded and returned FIFO. When none remain, returns
/// `GatewayError::Network("no mock response")`. Every call is recorded.
#[derive(Debug, Default)]
pub struct MockLedgerTransport {
    responses: Mutex<Vec<Result<TxHash, GatewayError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLedgerTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: Result<TxHash, GatewayError>) {
        self.responses.lock().push(response);
    }

    pub fn push_success(&self, tx: TxHash) {
        self.push_response(Ok(tx));
    }

    pub fn push_error(&self, error: GatewayError) {
        self.push_response(Err(error));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl LedgerTransport for MockLedgerTransport {
    async fn send_call(
        &self,
        from: &WalletIdentity,
        contract: &Address,
        call: &LedgerCall,
    ) -> Result<TxHash, GatewayError> {
        self.calls.lock().push(RecordedCall {
            from: *from,
            contract: *contract,
            call: call.clone(),
        });

        let mut queue = self.responses.lock();
        if queue.is_empty() {
            return Err(GatewayError::Network("no mock response".to_string()));
        }
        // FIFO: remove from front.
        queue.remove(0)
    }
}

/// Lets tests keep a handle on the mock after boxing it into a gateway.
#[async_trait]
impl<T: LedgerTransport + ?Sized> LedgerTransport for Arc<T> {
    async fn send_call(
        &self,
        from: &WalletIdentity,
        contract: &Address,
        call: &LedgerCall,
    ) -> Result<TxHash, GatewayError> {
        (**self).send_call(from, contract, call).await
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// COMPILE-TIME ASSERTIONS
// ════════════════════════════════════════════════════════════════════════════════

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn check() {
        assert_send_sync::<ChainGateway>();
        assert_send_sync::<MockLedgerTransport>();
    }
    let _ = check;
};

// ════════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use syndiloan_common::{Amount, Base64Codec, InterestRate, LoanTerm};

    const SEPOLIA: u64 = 11_155_111;

    fn vault() -> Address {
        Address([0x74; 20])
    }

    fn identity() -> WalletIdentity {
        WalletIdentity::new(Address([0x11; 20]), SEPOLIA)
    }

    fn loan_submission() -> LoanSubmission {
        let terms = LoanTerms {
            amount: Amount::from_units(1_000_000),
            interest_rate: InterestRate::from_bps(550),
            term: LoanTerm::from_months(12).unwrap(),
        };
        LoanSubmission::new(
            &terms,
            Base64Codec::encode_text("Expansion"),
            Base64Codec::encode_text("Equipment"),
        )
    }

    fn gateway(connected: bool) -> (ChainGateway, Arc<MockLedgerTransport>) {
        let mock = Arc::new(MockLedgerTransport::new());
        let session = Arc::new(WalletSession::new(SEPOLIA));
        if connected {
            session.connect(identity()).unwrap();
        }
        let gw = ChainGateway::new(Box::new(Arc::clone(&mock)), session, vault());
        (gw, mock)
    }

    #[test]
    fn loan_submission_from_terms() {
        let s = loan_submission();
        assert_eq!(s.amount, 1_000_000);
        assert_eq!(s.interest_rate_bps, 550);
        assert_eq!(s.term_days, 360);
        assert_eq!(s.encrypted_purpose.as_str(), "RXhwYW5zaW9u");
    }

    #[test]
    fn ledger_call_signatures() {
        let loan = LedgerCall::EncryptLoanData(loan_submission());
        assert_eq!(loan.signature(), "encryptLoanData(uint32,uint32,uint32,string,string)");
        assert_eq!(hex::encode(&loan.calldata()[..4]), "3d0073f6");

        let join = LedgerCall::JoinSyndicate { syndicate_id: 1 };
        assert_eq!(join.signature(), "joinSyndicate(uint256)");

        let approve = LedgerCall::ApproveLoanData { loan_id: 3, approved: true };
        assert_eq!(approve.signature(), "approveLoanData(uint256,bool)");

        let synd = LedgerCall::EncryptSyndicateData(SyndicateSubmission {
            total_commitment: 5_000_000,
            risk_level: 2,
            encrypted_terms: EncodedPayload::new("x"),
        });
        assert_eq!(synd.signature(), "encryptSyndicateData(uint32,uint32,string)");
    }

    #[test]
    fn error_reason() {
        let rejected = GatewayError::Rejected {
            code: -32000,
            message: "insufficient gas".to_string(),
        };
        assert_eq!(rejected.reason().as_deref(), Some("insufficient gas"));

        let blank = GatewayError::Rejected { code: -32000, message: "  ".to_string() };
        assert_eq!(blank.reason(), None);

        assert_eq!(GatewayError::Timeout.reason().as_deref(), Some("request timed out"));
    }

    #[tokio::test]
    async fn submit_loan_success() {
        let (gw, mock) = gateway(true);
        mock.push_success(TxHash([0xAB; 32]));

        let tx = gw.submit_encrypted_loan(loan_submission()).await.unwrap();
        assert_eq!(tx, TxHash([0xAB; 32]));

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].from, identity());
        assert_eq!(calls[0].contract, vault());
        assert_eq!(calls[0].call, LedgerCall::EncryptLoanData(loan_submission()));
    }

    #[tokio::test]
    async fn no_wallet_never_dispatches() {
        let (gw, mock) = gateway(false);
        mock.push_success(TxHash([0xAB; 32]));

        assert_eq!(
            gw.join_syndicate(1).await.unwrap_err(),
            GatewayError::WalletNotConnected
        );
        assert_eq!(
            gw.submit_encrypted_loan(loan_submission()).await.unwrap_err(),
            GatewayError::WalletNotConnected
        );
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn disconnect_between_calls() {
        let (gw, mock) = gateway(true);
        mock.push_success(TxHash([0x01; 32]));
        assert!(gw.join_syndicate(1).await.is_ok());

        gw.session().disconnect();
        assert_eq!(gw.join_syndicate(1).await.unwrap_err(), GatewayError::WalletNotConnected);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn ledger_rejection_propagated() {
        let (gw, mock) = gateway(true);
        mock.push_error(GatewayError::Rejected {
            code: -32000,
            message: "insufficient gas".to_string(),
        });

        let err = gw.approve_loan_data(7, false).await.unwrap_err();
        assert_eq!(err.reason().as_deref(), Some("insufficient gas"));
        assert_eq!(
            mock.calls()[0].call,
            LedgerCall::ApproveLoanData { loan_id: 7, approved: false }
        );
    }

    #[tokio::test]
    async fn mock_responses_fifo_then_exhausted() {
        let (gw, mock) = gateway(true);
        mock.push_success(TxHash([0x01; 32]));
        mock.push_success(TxHash([0x02; 32]));

        assert_eq!(gw.join_syndicate(1).await.unwrap(), TxHash([0x01; 32]));
        assert_eq!(gw.join_syndicate(2).await.unwrap(), TxHash([0x02; 32]));
        assert!(matches!(
            gw.join_syndicate(3).await,
            Err(GatewayError::Network(_))
        ));
    }
}
