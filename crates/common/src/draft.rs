//! # Submission Drafts
//!
//! User-entered form state for the two confidential submissions:
//!
//! - [`LoanApplicationDraft`]: borrower-side loan application.
//! - [`SyndicateBidDraft`]: lender-side participation in a syndicate.
//!
//! Drafts hold raw text exactly as typed. Conversion into wire figures
//! happens once, at submission time, through [`LoanApplicationDraft::loan_terms`]
//! and [`SyndicateBidDraft::commitment`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::{Amount, AmountError, InterestRate, LoanTerm};

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

/// A draft field could not be converted into its wire representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {source}")]
pub struct DraftError {
    pub field: &'static str,
    #[source]
    pub source: AmountError,
}

impl DraftError {
    fn at(field: &'static str) -> impl FnOnce(AmountError) -> DraftError {
        move |source| DraftError { field, source }
    }
}

/// Unknown enum label in a draft field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// CREDIT RATING
// ════════════════════════════════════════════════════════════════════════════════

/// Borrower credit rating as selected on the application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditRating {
    Aaa,
    Aa,
    A,
    Bbb,
    Bb,
    B,
}

impl CreditRating {
    pub const ALL: [CreditRating; 6] = [
        CreditRating::Aaa,
        CreditRating::Aa,
        CreditRating::A,
        CreditRating::Bbb,
        CreditRating::Bb,
        CreditRating::B,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CreditRating::Aaa => "AAA",
            CreditRating::Aa => "AA",
            CreditRating::A => "A",
            CreditRating::Bbb => "BBB",
            CreditRating::Bb => "BB",
            CreditRating::B => "B",
        }
    }
}

impl fmt::Display for CreditRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CreditRating {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVariant {
                kind: "credit rating",
                value: s.to_string(),
            })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// RISK LEVEL
// ════════════════════════════════════════════════════════════════════════════════

/// Lender risk tolerance attached to a syndicate bid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    /// `uint32` value sent as `_riskLevel`.
    pub fn wire_value(self) -> u32 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RiskLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(UnknownVariant {
                kind: "risk level",
                value: s.to_string(),
            }),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// LOAN APPLICATION DRAFT
// ════════════════════════════════════════════════════════════════════════════════

/// Loan application form state.
///
/// `purpose` and `collateral` are the confidential fields; they are
/// encoded before leaving the process. Borrower and company names are
/// kept locally and never transmitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanApplicationDraft {
    pub borrower_name: String,
    pub company_name: String,
    /// Whole currency units, decimal text.
    pub loan_amount: String,
    pub purpose: String,
    pub collateral: String,
    /// Months, e.g. `"12m"`.
    pub term: String,
    /// Percent, e.g. `"5.5"`.
    pub interest_rate: String,
    pub credit_rating: Option<CreditRating>,
}

/// Wire figures derived from a [`LoanApplicationDraft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanTerms {
    pub amount: Amount,
    pub interest_rate: InterestRate,
    pub term: LoanTerm,
}

impl LoanApplicationDraft {
    /// Parses a draft from TOML (field names as in this struct).
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Converts amount, rate and term into checked wire figures.
    pub fn loan_terms(&self) -> Result<LoanTerms, DraftError> {
        Ok(LoanTerms {
            amount: Amount::parse(&self.loan_amount).map_err(DraftError::at("loan amount"))?,
            interest_rate: InterestRate::parse(&self.interest_rate)
                .map_err(DraftError::at("interest rate"))?,
            term: LoanTerm::parse(&self.term).map_err(DraftError::at("term"))?,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// SYNDICATE BID DRAFT
// ════════════════════════════════════════════════════════════════════════════════

/// Participation bid in a syndicated loan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyndicateBidDraft {
    /// Whole currency units, decimal text.
    pub participation_amount: String,
    pub risk_level: RiskLevel,
}

impl SyndicateBidDraft {
    pub fn new(participation_amount: impl Into<String>, risk_level: RiskLevel) -> Self {
        Self {
            participation_amount: participation_amount.into(),
            risk_level,
        }
    }

    pub fn commitment(&self) -> Result<Amount, DraftError> {
        Amount::parse(&self.participation_amount).map_err(DraftError::at("participation amount"))
    }

    /// Plaintext of the confidential terms, e.g.
    /// `"Participation: 5000000, Risk: Medium"`.
    pub fn terms_description(&self, commitment: Amount) -> String {
        format!("Participation: {}, Risk: {}", commitment, self.risk_level)
    }
}
