//! Submission outcomes and the observable controller status.

use std::fmt;

use syndiloan_chain::TxHash;
use thiserror::Error;

/// Why an attempt was refused before reaching the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("wallet not connected")]
    WalletNotConnected,

    #[error("a submission is already in progress")]
    SubmissionInFlight,

    /// A draft field does not fit its wire representation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result of one user-initiated action.
///
/// `Pending` only appears in [`SubmissionStatus`] while an attempt runs;
/// controller actions always return one of the terminal variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Pending,
    Completed(TxHash),
    Failed(String),
    Rejected(RejectReason),
}

impl SubmissionOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionOutcome::Pending)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SubmissionOutcome::Completed(_))
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            SubmissionOutcome::Completed(tx) => Some(*tx),
            _ => None,
        }
    }
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionOutcome::Pending => f.write_str("pending"),
            SubmissionOutcome::Completed(tx) => write!(f, "completed ({})", tx),
            SubmissionOutcome::Failed(reason) => write!(f, "failed: {}", reason),
            SubmissionOutcome::Rejected(reason) => write!(f, "rejected: {}", reason),
        }
    }
}

/// Step of the current (or last) attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Validating,
    Encoding,
    Dispatching,
    Completed,
    Failed,
    Rejected,
}

impl SubmissionPhase {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SubmissionPhase::Validating | SubmissionPhase::Encoding | SubmissionPhase::Dispatching
        )
    }
}

/// Snapshot published on the controller's watch channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionStatus {
    pub phase: SubmissionPhase,
    /// `Some(Pending)` while running, the terminal outcome afterwards.
    pub outcome: Option<SubmissionOutcome>,
}

impl SubmissionStatus {
    pub fn is_pending(&self) -> bool {
        self.outcome == Some(SubmissionOutcome::Pending)
    }

    /// Reason of the last failed or rejected attempt.
    pub fn last_error(&self) -> Option<String> {
        match self.outcome {
            Some(SubmissionOutcome::Failed(ref reason)) => Some(reason.clone()),
            Some(SubmissionOutcome::Rejected(ref reason)) => Some(reason.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_helpers() {
        let done = SubmissionOutcome::Completed(TxHash([1; 32]));
        assert!(done.is_terminal());
        assert!(done.is_completed());
        assert_eq!(done.tx_hash(), Some(TxHash([1; 32])));
        assert!(!SubmissionOutcome::Pending.is_terminal());
    }

    #[test]
    fn status_last_error() {
        let mut s = SubmissionStatus::default();
        assert!(!s.is_pending());
        assert_eq!(s.last_error(), None);

        s.outcome = Some(SubmissionOutcome::Pending);
        assert!(s.is_pending());

        s.outcome = Some(SubmissionOutcome::Failed("insufficient gas".to_string()));
        assert_eq!(s.last_error().as_deref(), Some("insufficient gas"));

        s.outcome = Some(SubmissionOutcome::Rejected(RejectReason::WalletNotConnected));
        assert_eq!(s.last_error().as_deref(), Some("wallet not connected"));
    }

    #[test]
    fn active_phases() {
        assert!(SubmissionPhase::Dispatching.is_active());
        assert!(!SubmissionPhase::Idle.is_active());
        assert!(!SubmissionPhase::Failed.is_active());
    }
}
