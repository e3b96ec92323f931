//! # Fixed-Point Loan Figures
//!
//! Parses the decimal strings typed into a loan form into the fixed-width
//! unsigned integers the vault contract takes (`uint32`), refusing any
//! input that would lose precision or overflow.
//!
//! | Figure | Wire unit | Example |
//! |--------|-----------|---------|
//! | [`Amount`] | whole currency units | `"1000000"` → `1_000_000` |
//! | [`InterestRate`] | basis points | `"5.5"` → `550` |
//! | [`LoanTerm`] | days (months × 30) | `"12m"` → `360` |
//!
//! Month → day conversion is the flat 30-day approximation the ledger
//! records; it is not calendar exact.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ════════════════════════════════════════════════════════════════════════════════

/// Days recorded per month of loan term.
pub const DAYS_PER_MONTH: u32 = 30;

/// Basis points per percentage point.
pub const BPS_PER_PERCENT: u32 = 100;

/// Upper bound for an interest rate (100%).
pub const MAX_RATE_BPS: u32 = 100 * BPS_PER_PERCENT;

/// Longest accepted term (50 years).
pub const MAX_TERM_MONTHS: u32 = 600;

// ════════════════════════════════════════════════════════════════════════════════
// ERRORS
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("value is empty")]
    Empty,

    #[error("'{0}' is not a non-negative decimal number")]
    Malformed(String),

    #[error("'{0}' has a fractional part; whole units only")]
    FractionalUnits(String),

    #[error("'{input}' exceeds the maximum of {max}")]
    Overflow { input: String, max: u64 },

    #[error("'{input}' has more than {max_decimals} decimal places")]
    TooPrecise { input: String, max_decimals: usize },

    #[error("'{input}' is outside {min}..={max}")]
    OutOfRange { input: String, min: u32, max: u32 },
}

// ════════════════════════════════════════════════════════════════════════════════
// DECIMAL SPLITTING
// ════════════════════════════════════════════════════════════════════════════════

/// Splits `"123.4500"` into `("123", "45")` with trailing fractional
/// zeros dropped. Signs, exponents and separators are rejected.
fn split_decimal(input: &str) -> Result<(&str, &str), AmountError> {
    if input.is_empty() {
        return Err(AmountError::Empty);
    }

    let (int_part, frac_part) = match input.split_once('.') {
        Some((i, f)) => (i, f),
        None => (input, ""),
    };

    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty()
        || !digits_only(int_part)
        || !digits_only(frac_part)
    {
        return Err(AmountError::Malformed(input.to_string()));
    }

    Ok((int_part, frac_part.trim_end_matches('0')))
}

/// Parses a digit string into `u32`, mapping overflow explicitly.
fn digits_to_u32(digits: &str, input: &str) -> Result<u32, AmountError> {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<u32>().map_err(|_| AmountError::Overflow {
        input: input.to_string(),
        max: u64::from(u32::MAX),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// AMOUNT
// ════════════════════════════════════════════════════════════════════════════════

/// Loan or commitment amount in whole currency units (`uint32` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u32);

impl Amount {
    pub const fn from_units(units: u32) -> Self {
        Self(units)
    }

    pub const fn units(self) -> u32 {
        self.0
    }

    /// Parses `"1000000"` or `"1000000.00"`. A non-zero fraction or a
    /// zero amount is an error.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let input = input.trim();
        let (int_part, frac_part) = split_decimal(input)?;
        if !frac_part.is_empty() {
            return Err(AmountError::FractionalUnits(input.to_string()));
        }
        match digits_to_u32(int_part, input)? {
            0 => Err(AmountError::OutOfRange {
                input: input.to_string(),
                min: 1,
                max: u32::MAX,
            }),
            units => Ok(Self(units)),
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// INTEREST RATE
// ════════════════════════════════════════════════════════════════════════════════

/// Annual interest rate in basis points (`5.5%` = `550`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterestRate(u32);

impl InterestRate {
    pub const fn from_bps(bps: u32) -> Self {
        Self(bps)
    }

    pub const fn bps(self) -> u32 {
        self.0
    }

    /// Parses a percentage such as `"5.5"`, `"5.75"` or `"5.5%"`.
    ///
    /// At most two significant decimal places; upper bound [`MAX_RATE_BPS`].
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let input = input.trim();
        let number = input.strip_suffix('%').map(str::trim_end).unwrap_or(input);
        let (int_part, frac_part) = split_decimal(number)?;

        if frac_part.len() > 2 {
            return Err(AmountError::TooPrecise {
                input: input.to_string(),
                max_decimals: 2,
            });
        }

        let whole = digits_to_u32(int_part, input)?;
        // "5" -> 0, "5.5" -> 50, "5.75" -> 75
        let frac = match frac_part.len() {
            0 => 0,
            1 => digits_to_u32(frac_part, input)? * 10,
            _ => digits_to_u32(frac_part, input)?,
        };

        let bps = whole
            .checked_mul(BPS_PER_PERCENT)
            .and_then(|v| v.checked_add(frac))
            .filter(|v| *v <= MAX_RATE_BPS)
            .ok_or_else(|| AmountError::OutOfRange {
                input: input.to_string(),
                min: 0,
                max: MAX_RATE_BPS,
            })?;

        Ok(Self(bps))
    }
}

impl FromStr for InterestRate {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InterestRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / BPS_PER_PERCENT, self.0 % BPS_PER_PERCENT)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// LOAN TERM
// ════════════════════════════════════════════════════════════════════════════════

/// Loan term in whole months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoanTerm {
    months: u32,
}

impl LoanTerm {
    pub fn from_months(months: u32) -> Result<Self, AmountError> {
        if months == 0 || months > MAX_TERM_MONTHS {
            return Err(AmountError::OutOfRange {
                input: months.to_string(),
                min: 1,
                max: MAX_TERM_MONTHS,
            });
        }
        Ok(Self { months })
    }

    /// Parses form values like `"12m"`, `"12M"` or `"12"`.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AmountError::Empty);
        }
        let digits = input
            .strip_suffix('m')
            .or_else(|| input.strip_suffix('M'))
            .unwrap_or(input);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed(input.to_string()));
        }

        let months = digits_to_u32(digits, input)?;
        Self::from_months(months).map_err(|_| AmountError::OutOfRange {
            input: input.to_string(),
            min: 1,
            max: MAX_TERM_MONTHS,
        })
    }

    pub const fn months(self) -> u32 {
        self.months
    }

    /// Term in days as recorded on the ledger (`months × 30`).
    pub fn days(self) -> u32 {
        // bounded by MAX_TERM_MONTHS, cannot overflow
        self.months.saturating_mul(DAYS_PER_MONTH)
    }
}

impl FromStr for LoanTerm {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LoanTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.months)
    }
}
