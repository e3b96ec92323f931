//! Submission controller integration tests.
//!
//! Controller + real gateway + in-process transports. No network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use syndiloan_chain::{
    Address, ChainGateway, GatewayError, LedgerCall, LedgerTransport, MockLedgerTransport,
    TxHash, WalletIdentity, WalletSession,
};
use syndiloan_common::{
    Base64Codec, CodecError, CreditRating, EncodedPayload, LoanApplicationDraft, PayloadCodec,
    RiskLevel, SealedCodec, SyndicateBidDraft,
};
use syndiloan_client::{
    RecordingNotifier, RejectReason, SubmissionController, SubmissionOutcome, SubmissionPhase,
};
use tokio::sync::Notify;

const SEPOLIA: u64 = 11_155_111;

// ════════════════════════════════════════════════════════════════════════════
// HELPERS
// ════════════════════════════════════════════════════════════════════════════

fn vault() -> Address {
    Address::from_hex("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6").unwrap()
}

fn identity() -> WalletIdentity {
    WalletIdentity::new(Address([0x11; 20]), SEPOLIA)
}

fn sample_draft() -> LoanApplicationDraft {
    LoanApplicationDraft {
        borrower_name: "Jane Doe".to_string(),
        company_name: "Global Tech Corp".to_string(),
        loan_amount: "1000000".to_string(),
        purpose: "Expansion".to_string(),
        collateral: "Equipment".to_string(),
        term: "12m".to_string(),
        interest_rate: "5.5".to_string(),
        credit_rating: Some(CreditRating::Aa),
    }
}

struct Harness {
    controller: Arc<SubmissionController>,
    transport: Arc<MockLedgerTransport>,
    notifier: Arc<RecordingNotifier>,
    session: Arc<WalletSession>,
}

fn harness_with_codec(connected: bool, codec: Arc<dyn PayloadCodec>) -> Harness {
    let transport = Arc::new(MockLedgerTransport::new());
    let session = Arc::new(WalletSession::new(SEPOLIA));
    if connected {
        session.connect(identity()).unwrap();
    }
    let gateway = ChainGateway::new(Box::new(Arc::clone(&transport)), Arc::clone(&session), vault());
    let notifier = Arc::new(RecordingNotifier::new());
    let controller = Arc::new(SubmissionController::new(gateway, codec, notifier.clone()));
    Harness {
        controller,
        transport,
        notifier,
        session,
    }
}

fn harness(connected: bool) -> Harness {
    harness_with_codec(connected, Arc::new(Base64Codec))
}

/// Transport that parks every call until released.
#[derive(Default)]
struct GatedTransport {
    entered: Notify,
    release: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl LedgerTransport for GatedTransport {
    async fn send_call(
        &self,
        _from: &WalletIdentity,
        _contract: &Address,
        _call: &LedgerCall,
    ) -> Result<TxHash, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(TxHash([0x77; 32]))
    }
}

struct FailingCodec;

impl PayloadCodec for FailingCodec {
    fn name(&self) -> &'static str {
        "failing"
    }
    fn encode(&self, _plaintext: &str) -> Result<EncodedPayload, CodecError> {
        Err(CodecError::EncryptionFailed)
    }
    fn decode(&self, _payload: &EncodedPayload) -> Result<String, CodecError> {
        Err(CodecError::AuthenticationFailed)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LOAN SUBMISSION
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_submit_loan_sends_wire_figures() {
    let h = harness(true);
    h.transport.push_success(TxHash([0xAB; 32]));

    let outcome = h.controller.submit_loan(&sample_draft()).await;
    assert_eq!(outcome, SubmissionOutcome::Completed(TxHash([0xAB; 32])));

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].from, identity());
    assert_eq!(calls[0].contract, vault());
    match &calls[0].call {
        LedgerCall::EncryptLoanData(s) => {
            assert_eq!(s.amount, 1_000_000);
            assert_eq!(s.interest_rate_bps, 550);
            assert_eq!(s.term_days, 360);
            assert_eq!(Base64Codec.decode(&s.encrypted_purpose).unwrap(), "Expansion");
            assert_eq!(Base64Codec.decode(&s.encrypted_collateral).unwrap(), "Equipment");
        }
        other => panic!("unexpected call {:?}", other),
    }

    let notes = h.notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Loan Data Encrypted");
    assert!(!notes[0].is_destructive());

    let status = h.controller.status();
    assert_eq!(status.phase, SubmissionPhase::Completed);
    assert!(!status.is_pending());
    assert!(!h.controller.is_pending());
}

#[tokio::test]
async fn test_submit_loan_24_months() {
    let h = harness(true);
    h.transport.push_success(TxHash([0x01; 32]));

    let mut draft = sample_draft();
    draft.term = "24".to_string();
    assert!(h.controller.submit_loan(&draft).await.is_completed());

    match &h.transport.calls()[0].call {
        LedgerCall::EncryptLoanData(s) => assert_eq!(s.term_days, 720),
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_loan_without_wallet() {
    let h = harness(false);
    h.transport.push_success(TxHash([0xAB; 32]));

    let outcome = h.controller.submit_loan(&sample_draft()).await;
    assert_eq!(outcome, SubmissionOutcome::Rejected(RejectReason::WalletNotConnected));
    assert_eq!(h.transport.call_count(), 0, "gateway must not be invoked");

    let notes = h.notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Wallet Not Connected");
    assert_eq!(
        notes[0].description,
        "Please connect your wallet to submit a loan application."
    );
    assert!(notes[0].is_destructive());

    let status = h.controller.status();
    assert_eq!(status.phase, SubmissionPhase::Rejected);
    assert_eq!(status.last_error().as_deref(), Some("wallet not connected"));
}

#[tokio::test]
async fn test_submit_loan_gateway_failure_reason() {
    let h = harness(true);
    h.transport.push_error(GatewayError::Rejected {
        code: -32000,
        message: "insufficient gas".to_string(),
    });

    let outcome = h.controller.submit_loan(&sample_draft()).await;
    assert_eq!(outcome, SubmissionOutcome::Failed("insufficient gas".to_string()));

    let notes = h.notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Encryption Failed");
    assert_eq!(notes[0].description, "insufficient gas");
    assert_eq!(h.controller.status().phase, SubmissionPhase::Failed);
}

#[tokio::test]
async fn test_submit_loan_gateway_failure_fallback() {
    let h = harness(true);
    h.transport.push_error(GatewayError::Rejected {
        code: 3,
        message: String::new(),
    });

    let outcome = h.controller.submit_loan(&sample_draft()).await;
    assert_eq!(
        outcome,
        SubmissionOutcome::Failed("Failed to encrypt loan data. Please try again.".to_string())
    );
    assert_eq!(
        h.notifier.last().unwrap().description,
        "Failed to encrypt loan data. Please try again."
    );
}

#[tokio::test]
async fn test_submit_loan_invalid_amount() {
    let h = harness(true);
    let mut draft = sample_draft();
    draft.loan_amount = "1000000.50".to_string();

    let outcome = h.controller.submit_loan(&draft).await;
    assert!(matches!(
        outcome,
        SubmissionOutcome::Rejected(RejectReason::InvalidInput(ref m)) if m.contains("loan amount")
    ));
    assert_eq!(h.transport.call_count(), 0);

    let note = h.notifier.last().unwrap();
    assert_eq!(note.title, "Invalid Input");
    assert_eq!(h.notifier.count(), 1);
}

#[tokio::test]
async fn test_zero_amounts_rejected() {
    let h = harness(true);
    let mut draft = sample_draft();
    draft.loan_amount = "0".to_string();

    let outcome = h.controller.submit_loan(&draft).await;
    assert!(matches!(
        outcome,
        SubmissionOutcome::Rejected(RejectReason::InvalidInput(ref m)) if m.contains("loan amount")
    ));

    let bid = SyndicateBidDraft::new("0", RiskLevel::Low);
    let outcome = h.controller.submit_syndicate_bid(&bid).await;
    assert!(matches!(
        outcome,
        SubmissionOutcome::Rejected(RejectReason::InvalidInput(ref m))
            if m.contains("participation amount")
    ));
    assert_eq!(h.transport.call_count(), 0);
}

#[tokio::test]
async fn test_submit_loan_rate_too_precise() {
    let h = harness(true);
    let mut draft = sample_draft();
    draft.interest_rate = "5.555".to_string();

    let outcome = h.controller.submit_loan(&draft).await;
    assert!(matches!(
        outcome,
        SubmissionOutcome::Rejected(RejectReason::InvalidInput(_))
    ));
    assert_eq!(h.transport.call_count(), 0);
}

#[tokio::test]
async fn test_wallet_checked_before_input() {
    let h = harness(false);
    let mut draft = sample_draft();
    draft.loan_amount = "not a number".to_string();

    let outcome = h.controller.submit_loan(&draft).await;
    assert_eq!(outcome, SubmissionOutcome::Rejected(RejectReason::WalletNotConnected));
}

#[tokio::test]
async fn test_empty_confidential_fields_encode() {
    let h = harness(true);
    h.transport.push_success(TxHash([0x02; 32]));

    let mut draft = sample_draft();
    draft.purpose = String::new();
    draft.collateral = String::new();
    assert!(h.controller.submit_loan(&draft).await.is_completed());

    match &h.transport.calls()[0].call {
        LedgerCall::EncryptLoanData(s) => {
            assert!(s.encrypted_purpose.is_empty());
            assert!(s.encrypted_collateral.is_empty());
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn test_codec_failure_is_failed() {
    let h = harness_with_codec(true, Arc::new(FailingCodec));

    let outcome = h.controller.submit_loan(&sample_draft()).await;
    assert_eq!(outcome, SubmissionOutcome::Failed("payload encryption failed".to_string()));
    assert_eq!(h.transport.call_count(), 0);
    assert_eq!(h.notifier.count(), 1);
}

#[tokio::test]
async fn test_sealed_codec_payloads_decrypt() {
    let codec = Arc::new(SealedCodec::new(SealedCodec::generate_key()));
    let h = harness_with_codec(true, codec.clone());
    h.transport.push_success(TxHash([0x03; 32]));

    assert!(h.controller.submit_loan(&sample_draft()).await.is_completed());

    match &h.transport.calls()[0].call {
        LedgerCall::EncryptLoanData(s) => {
            assert_eq!(codec.decode(&s.encrypted_purpose).unwrap(), "Expansion");
            // not readable without the key
            assert!(Base64Codec
                .decode(&s.encrypted_purpose)
                .map(|t| t != "Expansion")
                .unwrap_or(true));
        }
        other => panic!("unexpected call {:?}", other),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SYNDICATION & DECISIONS
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_syndicate_bid_encodes_terms() {
    let h = harness(true);
    h.transport.push_success(TxHash([0x04; 32]));

    let bid = SyndicateBidDraft::new("5000000", RiskLevel::Medium);
    let outcome = h.controller.submit_syndicate_bid(&bid).await;
    assert!(outcome.is_completed());

    match &h.transport.calls()[0].call {
        LedgerCall::EncryptSyndicateData(s) => {
            assert_eq!(s.total_commitment, 5_000_000);
            assert_eq!(s.risk_level, 2);
            assert_eq!(
                Base64Codec.decode(&s.encrypted_terms).unwrap(),
                "Participation: 5000000, Risk: Medium"
            );
        }
        other => panic!("unexpected call {:?}", other),
    }
    assert_eq!(h.notifier.last().unwrap().title, "Participation Encrypted");
}

#[tokio::test]
async fn test_syndicate_bid_without_wallet() {
    let h = harness(false);
    let bid = SyndicateBidDraft::new("5000000", RiskLevel::High);

    let outcome = h.controller.submit_syndicate_bid(&bid).await;
    assert_eq!(outcome, SubmissionOutcome::Rejected(RejectReason::WalletNotConnected));
    assert_eq!(
        h.notifier.last().unwrap().description,
        "Please connect your wallet to participate in syndication."
    );
    assert_eq!(h.transport.call_count(), 0);
}

#[tokio::test]
async fn test_syndicate_bid_failure_fallback() {
    let h = harness(true);
    h.transport.push_error(GatewayError::Network(String::new()));

    let bid = SyndicateBidDraft::new("100", RiskLevel::Low);
    let outcome = h.controller.submit_syndicate_bid(&bid).await;
    assert_eq!(
        outcome,
        SubmissionOutcome::Failed(
            "Failed to encrypt participation data. Please try again.".to_string()
        )
    );
}

#[tokio::test]
async fn test_join_syndicate() {
    let h = harness(true);
    h.transport.push_success(TxHash([0x05; 32]));

    let outcome = h.controller.join_syndicate(1).await;
    assert_eq!(outcome.tx_hash(), Some(TxHash([0x05; 32])));
    assert_eq!(
        h.transport.calls()[0].call,
        LedgerCall::JoinSyndicate { syndicate_id: 1 }
    );
    assert_eq!(h.notifier.last().unwrap().title, "Syndicate Joined");
}

#[tokio::test]
async fn test_approve_loan_data() {
    let h = harness(true);
    h.transport.push_success(TxHash([0x06; 32]));
    h.transport.push_error(GatewayError::Timeout);

    assert!(h.controller.approve_loan_data(9, true).await.is_completed());
    assert_eq!(
        h.controller.approve_loan_data(9, false).await,
        SubmissionOutcome::Failed("request timed out".to_string())
    );

    let calls = h.transport.calls();
    assert_eq!(calls[0].call, LedgerCall::ApproveLoanData { loan_id: 9, approved: true });
    assert_eq!(calls[1].call, LedgerCall::ApproveLoanData { loan_id: 9, approved: false });

    let notes = h.notifier.notifications();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "Loan Decision Recorded");
    assert_eq!(notes[1].title, "Decision Failed");
}

// ════════════════════════════════════════════════════════════════════════════
// SESSION, STATUS & CONCURRENCY
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_one_notification_per_attempt() {
    let h = harness(true);
    h.transport.push_success(TxHash([0x01; 32]));
    h.transport.push_error(GatewayError::Network("connection reset".to_string()));

    h.controller.join_syndicate(1).await;
    h.controller.join_syndicate(1).await;
    h.session.disconnect();
    h.controller.join_syndicate(1).await;

    assert_eq!(h.notifier.count(), 3);
    assert_eq!(h.transport.call_count(), 2);
}

#[tokio::test]
async fn test_status_published_on_watch() {
    let h = harness(true);
    h.transport.push_success(TxHash([0x09; 32]));

    let mut rx = h.controller.subscribe();
    assert_eq!(rx.borrow_and_update().phase, SubmissionPhase::Idle);

    h.controller.join_syndicate(3).await;
    assert!(rx.has_changed().unwrap());
    let status = rx.borrow_and_update().clone();
    assert_eq!(status.phase, SubmissionPhase::Completed);
    assert_eq!(status.outcome.unwrap().tx_hash(), Some(TxHash([0x09; 32])));
}

#[tokio::test]
async fn test_double_submit_rejected_while_pending() {
    let transport = Arc::new(GatedTransport::default());
    let session = Arc::new(WalletSession::connected(identity()));
    let gateway = ChainGateway::new(Box::new(Arc::clone(&transport)), session, vault());
    let notifier = Arc::new(RecordingNotifier::new());
    let controller = Arc::new(SubmissionController::new(
        gateway,
        Arc::new(Base64Codec),
        notifier.clone(),
    ));

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.join_syndicate(1).await })
    };

    transport.entered.notified().await;
    assert!(controller.is_pending());
    assert!(controller.status().is_pending());
    assert_eq!(controller.status().phase, SubmissionPhase::Dispatching);

    let second = controller.join_syndicate(2).await;
    assert_eq!(second, SubmissionOutcome::Rejected(RejectReason::SubmissionInFlight));
    // the running attempt's status is untouched
    assert!(controller.status().is_pending());

    transport.release.notify_one();
    let first = first.await.unwrap();
    assert_eq!(first, SubmissionOutcome::Completed(TxHash([0x77; 32])));

    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    let notes = notifier.notifications();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "Submission In Progress");
    assert_eq!(notes[1].title, "Syndicate Joined");
    assert!(!controller.is_pending());
}

#[tokio::test]
async fn test_dropped_attempt_releases_guard() {
    let transport = Arc::new(GatedTransport::default());
    let session = Arc::new(WalletSession::connected(identity()));
    let gateway = ChainGateway::new(Box::new(Arc::clone(&transport)), session, vault());
    let controller =
        SubmissionController::new(gateway, Arc::new(Base64Codec), Arc::new(RecordingNotifier::new()));

    let timed_out =
        tokio::time::timeout(Duration::from_millis(50), controller.join_syndicate(1)).await;
    assert!(timed_out.is_err());
    assert!(!controller.is_pending());
    assert_eq!(controller.status().phase, SubmissionPhase::Idle);

    // next attempt is accepted
    transport.release.notify_one();
    let outcome = controller.join_syndicate(2).await;
    assert!(outcome.is_completed());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}
