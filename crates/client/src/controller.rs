//! # SubmissionController
//!
//! Drives one user-initiated ledger write from draft to terminal outcome.
//!
//! ## State Machine (per attempt)
//!
//! ```text
//! trigger ──in-flight?──▶ Rejected(SubmissionInFlight)   (status untouched)
//!    │
//!    ▼
//! Validating ──no wallet──▶ Rejected(WalletNotConnected)
//!    │        ──bad field─▶ Rejected(InvalidInput)
//!    ▼
//! Encoding ──codec error──▶ Failed(reason)
//!    │
//!    ▼
//! Dispatching ──gateway error──▶ Failed(reason | fallback)
//!    │
//!    ▼
//! Completed(tx)
//! ```
//!
//! Every terminal outcome emits exactly one notification. Nothing is
//! retried. The only suspension point is the gateway call; dropping the
//! action future releases the in-flight guard and resets the status to
//! `Idle`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use syndiloan_chain::{
    ChainGateway, GatewayError, LoanSubmission, SyndicateSubmission, TxHash, WalletSession,
};
use syndiloan_common::{LoanApplicationDraft, PayloadCodec, SyndicateBidDraft};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::notification::{Notification, Notifier};
use crate::status::{RejectReason, SubmissionOutcome, SubmissionPhase, SubmissionStatus};

// ════════════════════════════════════════════════════════════════════════════════
// ACTIONS
// ════════════════════════════════════════════════════════════════════════════════

/// The user-facing operations the controller runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SubmitLoan,
    SyndicateBid,
    JoinSyndicate,
    ApproveLoan,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::SubmitLoan => "submit_loan",
            Action::SyndicateBid => "submit_syndicate_bid",
            Action::JoinSyndicate => "join_syndicate",
            Action::ApproveLoan => "approve_loan_data",
        }
    }

    fn wallet_hint(self) -> &'static str {
        match self {
            Action::SubmitLoan => "Please connect your wallet to submit a loan application.",
            Action::SyndicateBid | Action::JoinSyndicate => {
                "Please connect your wallet to participate in syndication."
            }
            Action::ApproveLoan => "Please connect your wallet to record a loan decision.",
        }
    }

    fn success(self) -> (&'static str, &'static str) {
        match self {
            Action::SubmitLoan => (
                "Loan Data Encrypted",
                "Your confidential loan data has been encrypted and stored on-chain.",
            ),
            Action::SyndicateBid => (
                "Participation Encrypted",
                "Your confidential participation data has been encrypted and stored on-chain.",
            ),
            Action::JoinSyndicate => ("Syndicate Joined", "You have joined the syndicate."),
            Action::ApproveLoan => (
                "Loan Decision Recorded",
                "Your loan decision has been recorded on-chain.",
            ),
        }
    }

    fn failure_title(self) -> &'static str {
        match self {
            Action::SubmitLoan | Action::SyndicateBid => "Encryption Failed",
            Action::JoinSyndicate => "Join Failed",
            Action::ApproveLoan => "Decision Failed",
        }
    }

    /// Used when the failure carries no reason of its own.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Action::SubmitLoan => "Failed to encrypt loan data. Please try again.",
            Action::SyndicateBid => "Failed to encrypt participation data. Please try again.",
            Action::JoinSyndicate => "Failed to join syndicate. Please try again.",
            Action::ApproveLoan => "Failed to record loan decision. Please try again.",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// IN-FLIGHT GUARD
// ════════════════════════════════════════════════════════════════════════════════

/// Held for the lifetime of one attempt. Releases the in-flight flag on
/// drop, including when the action future is dropped mid-dispatch.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    status: &'a watch::Sender<SubmissionStatus>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.status.send_if_modified(|s| {
            if s.is_pending() {
                *s = SubmissionStatus::default();
                true
            } else {
                false
            }
        });
        self.flag.store(false, Ordering::Release);
    }
}

/// Early exit of an attempt.
enum Stop {
    Rejected(RejectReason),
    Failed(String),
}

// ════════════════════════════════════════════════════════════════════════════════
// CONTROLLER
// ════════════════════════════════════════════════════════════════════════════════

pub struct SubmissionController {
    gateway: ChainGateway,
    codec: Arc<dyn PayloadCodec>,
    notifier: Arc<dyn Notifier>,
    in_flight: AtomicBool,
    status: watch::Sender<SubmissionStatus>,
}

impl std::fmt::Debug for SubmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionController")
            .field("gateway", &self.gateway)
            .field("codec", &self.codec.name())
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish()
    }
}

impl SubmissionController {
    pub fn new(
        gateway: ChainGateway,
        codec: Arc<dyn PayloadCodec>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (status, _) = watch::channel(SubmissionStatus::default());
        Self {
            gateway,
            codec,
            notifier,
            in_flight: AtomicBool::new(false),
            status,
        }
    }

    pub fn gateway(&self) -> &ChainGateway {
        &self.gateway
    }

    pub fn session(&self) -> &Arc<WalletSession> {
        self.gateway.session()
    }

    /// Current status snapshot.
    pub fn status(&self) -> SubmissionStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionStatus> {
        self.status.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Actions
    // ────────────────────────────────────────────────────────────────────────

    /// Encodes purpose and collateral and records the loan application.
    pub async fn submit_loan(&self, draft: &LoanApplicationDraft) -> SubmissionOutcome {
        let action = Action::SubmitLoan;
        let Some(_guard) = self.begin(action) else {
            return self.refuse_in_flight(action);
        };

        let result: Result<TxHash, Stop> = async {
            self.require_wallet()?;
            let terms = draft
                .loan_terms()
                .map_err(|e| Stop::Rejected(RejectReason::InvalidInput(e.to_string())))?;

            self.set_phase(SubmissionPhase::Encoding);
            let purpose = self.encode(&draft.purpose)?;
            let collateral = self.encode(&draft.collateral)?;

            self.set_phase(SubmissionPhase::Dispatching);
            let submission = LoanSubmission::new(&terms, purpose, collateral);
            debug!(
                amount = submission.amount,
                interest_rate_bps = submission.interest_rate_bps,
                term_days = submission.term_days,
                "loan terms prepared"
            );
            self.gateway
                .submit_encrypted_loan(submission)
                .await
                .map_err(|e| gateway_stop(action, e))
        }
        .await;

        self.finish(action, result)
    }

    /// Encodes the participation terms and records the bid.
    pub async fn submit_syndicate_bid(&self, bid: &SyndicateBidDraft) -> SubmissionOutcome {
        let action = Action::SyndicateBid;
        let Some(_guard) = self.begin(action) else {
            return self.refuse_in_flight(action);
        };

        let result: Result<TxHash, Stop> = async {
            self.require_wallet()?;
            let commitment = bid
                .commitment()
                .map_err(|e| Stop::Rejected(RejectReason::InvalidInput(e.to_string())))?;

            self.set_phase(SubmissionPhase::Encoding);
            let terms = self.encode(&bid.terms_description(commitment))?;

            self.set_phase(SubmissionPhase::Dispatching);
            self.gateway
                .submit_encrypted_syndicate(SyndicateSubmission {
                    total_commitment: commitment.units(),
                    risk_level: bid.risk_level.wire_value(),
                    encrypted_terms: terms,
                })
                .await
                .map_err(|e| gateway_stop(action, e))
        }
        .await;

        self.finish(action, result)
    }

    pub async fn join_syndicate(&self, syndicate_id: u64) -> SubmissionOutcome {
        let action = Action::JoinSyndicate;
        let Some(_guard) = self.begin(action) else {
            return self.refuse_in_flight(action);
        };

        let result: Result<TxHash, Stop> = async {
            self.require_wallet()?;
            self.set_phase(SubmissionPhase::Dispatching);
            self.gateway
                .join_syndicate(syndicate_id)
                .await
                .map_err(|e| gateway_stop(action, e))
        }
        .await;

        self.finish(action, result)
    }

    pub async fn approve_loan_data(&self, loan_id: u64, approved: bool) -> SubmissionOutcome {
        let action = Action::ApproveLoan;
        let Some(_guard) = self.begin(action) else {
            return self.refuse_in_flight(action);
        };

        let result: Result<TxHash, Stop> = async {
            self.require_wallet()?;
            self.set_phase(SubmissionPhase::Dispatching);
            self.gateway
                .approve_loan_data(loan_id, approved)
                .await
                .map_err(|e| gateway_stop(action, e))
        }
        .await;

        self.finish(action, result)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Internals
    // ────────────────────────────────────────────────────────────────────────

    /// Atomically claims the controller. `None` when another attempt runs.
    fn begin(&self, action: Action) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        debug!(action = action.label(), "attempt started");
        self.status.send_replace(SubmissionStatus {
            phase: SubmissionPhase::Validating,
            outcome: Some(SubmissionOutcome::Pending),
        });
        Some(InFlightGuard {
            flag: &self.in_flight,
            status: &self.status,
        })
    }

    fn refuse_in_flight(&self, action: Action) -> SubmissionOutcome {
        warn!(action = action.label(), "refused: submission already in progress");
        self.notifier.notify(Notification::destructive(
            "Submission In Progress",
            "Please wait for the current submission to finish.",
        ));
        SubmissionOutcome::Rejected(RejectReason::SubmissionInFlight)
    }

    fn require_wallet(&self) -> Result<(), Stop> {
        if self.session().is_connected() {
            Ok(())
        } else {
            Err(Stop::Rejected(RejectReason::WalletNotConnected))
        }
    }

    fn encode(&self, plaintext: &str) -> Result<syndiloan_common::EncodedPayload, Stop> {
        self.codec
            .encode(plaintext)
            .map_err(|e| Stop::Failed(e.to_string()))
    }

    fn set_phase(&self, phase: SubmissionPhase) {
        self.status.send_modify(|s| s.phase = phase);
    }

    /// Publishes the terminal status and emits the single notification.
    fn finish(&self, action: Action, result: Result<TxHash, Stop>) -> SubmissionOutcome {
        let (phase, outcome, notification) = match result {
            Ok(tx) => {
                info!(action = action.label(), tx = %tx, "submission completed");
                let (title, description) = action.success();
                (
                    SubmissionPhase::Completed,
                    SubmissionOutcome::Completed(tx),
                    Notification::success(title, description),
                )
            }
            Err(Stop::Failed(reason)) => {
                warn!(action = action.label(), %reason, "submission failed");
                (
                    SubmissionPhase::Failed,
                    SubmissionOutcome::Failed(reason.clone()),
                    Notification::destructive(action.failure_title(), reason),
                )
            }
            Err(Stop::Rejected(reason)) => {
                warn!(action = action.label(), %reason, "submission rejected");
                let notification = match reason {
                    RejectReason::WalletNotConnected => {
                        Notification::destructive("Wallet Not Connected", action.wallet_hint())
                    }
                    RejectReason::InvalidInput(ref msg) => {
                        Notification::destructive("Invalid Input", msg.clone())
                    }
                    RejectReason::SubmissionInFlight => Notification::destructive(
                        "Submission In Progress",
                        "Please wait for the current submission to finish.",
                    ),
                };
                (
                    SubmissionPhase::Rejected,
                    SubmissionOutcome::Rejected(reason),
                    notification,
                )
            }
        };

        self.status.send_replace(SubmissionStatus {
            phase,
            outcome: Some(outcome.clone()),
        });
        self.notifier.notify(notification);
        outcome
    }
}

/// Maps a gateway failure to the attempt's exit, filling in the action's
/// fallback text when the ledger gave no reason.
fn gateway_stop(action: Action, err: GatewayError) -> Stop {
    match err {
        // session dropped between validation and dispatch
        GatewayError::WalletNotConnected => Stop::Rejected(RejectReason::WalletNotConnected),
        other => Stop::Failed(
            other
                .reason()
                .unwrap_or_else(|| action.fallback_message().to_string()),
        ),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// COMPILE-TIME ASSERTIONS
// ════════════════════════════════════════════════════════════════════════════════

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn check() {
        assert_send_sync::<SubmissionController>();
    }
    let _ = check;
};
