//! # SyndiLoan Client
//!
//! Submission workflow on top of the chain gateway: wallet gating,
//! confidential-field encoding, dispatch, status tracking and
//! notifications.
//!
//! ```text
//! draft ──▶ SubmissionController ──encode──▶ PayloadCodec
//!                  │
//!                  ├──dispatch──▶ ChainGateway ──▶ ledger
//!                  ├──publish───▶ watch::Receiver<SubmissionStatus>
//!                  └──notify────▶ dyn Notifier
//! ```

pub mod controller;
pub mod notification;
pub mod status;

pub use controller::{Action, SubmissionController};
pub use notification::{
    Notification, NotificationKind, Notifier, RecordingNotifier, TracingNotifier,
};
pub use status::{RejectReason, SubmissionOutcome, SubmissionPhase, SubmissionStatus};
