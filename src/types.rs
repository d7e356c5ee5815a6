use serde::{Deserialize, Serialize};

use crate::error::{AttentionBankError, Result};

// ---------------------------------------------------------------------------
// Handle: opaque item identity owned by the item table
// ---------------------------------------------------------------------------

/// Identifies an item in the external item table.
///
/// The bank never interprets the bits; it only passes handles back to the
/// table and carries them in focus events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub u64);

impl Handle {
    /// Create a Handle from a raw u64 value.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Currency: the two independent importance currencies
// ---------------------------------------------------------------------------

/// One of the two conserved importance currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Short-term importance. Drives attentional focus.
    Sti,
    /// Long-term importance.
    Lti,
}

impl Currency {
    /// Both currencies, STI first.
    pub const ALL: [Currency; 2] = [Currency::Sti, Currency::Lti];
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sti => write!(f, "STI"),
            Self::Lti => write!(f, "LTI"),
        }
    }
}

// ---------------------------------------------------------------------------
// AttentionValue: immutable importance triple
// ---------------------------------------------------------------------------

/// The importance carried by one item: short-term, long-term and a
/// very-long-term retention counter.
///
/// Values are immutable; the table replaces an item's value wholesale and
/// reports the old and new value to the bank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttentionValue {
    pub sti: i64,
    pub lti: i64,
    pub vlti: i64,
}

impl AttentionValue {
    pub fn new(sti: i64, lti: i64, vlti: i64) -> Self {
        Self { sti, lti, vlti }
    }

    /// Importance held in the given currency.
    pub fn get(&self, currency: Currency) -> i64 {
        match currency {
            Currency::Sti => self.sti,
            Currency::Lti => self.lti,
        }
    }

    /// A copy of this value with `amount` added to one currency.
    ///
    /// Saturates instead of wrapping; importance never overflows silently.
    pub fn credited(&self, currency: Currency, amount: i64) -> Self {
        let mut next = *self;
        match currency {
            Currency::Sti => next.sti = self.sti.saturating_add(amount),
            Currency::Lti => next.lti = self.lti.saturating_add(amount),
        }
        next
    }
}

impl std::fmt::Display for AttentionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[sti={}, lti={}, vlti={}]", self.sti, self.lti, self.vlti)
    }
}

// ---------------------------------------------------------------------------
// FundConfig / BankConfig: construction-time configuration
// ---------------------------------------------------------------------------

/// Economic parameters for one currency's fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundConfig {
    /// Funds in the pool when the bank is created. Default: 10_000.
    pub starting_funds: i64,
    /// Level the wage controller steers the pool towards. Default: 10_000.
    pub target_funds: i64,
    /// Dead band around the target within which the wage is `base_wage`.
    /// Default: 1_000.
    pub buffer: i64,
    /// Wage paid per unit of stimulus at target. Default: 10.0.
    pub base_wage: f64,
    /// Lower clamp on `available / target`. Default: 0.0.
    pub min_wage_ratio: f64,
    /// Upper clamp on `available / target`. Default: 2.0.
    pub max_wage_ratio: f64,
}

impl FundConfig {
    fn validate(&self, currency: Currency) -> Result<()> {
        if self.target_funds <= 0 {
            return Err(AttentionBankError::InvalidConfig(format!(
                "{currency} target_funds must be positive, got {}",
                self.target_funds
            )));
        }
        if self.buffer < 0 {
            return Err(AttentionBankError::InvalidConfig(format!(
                "{currency} buffer must be non-negative, got {}",
                self.buffer
            )));
        }
        if !self.base_wage.is_finite() || self.base_wage < 0.0 {
            return Err(AttentionBankError::InvalidConfig(format!(
                "{currency} base_wage must be finite and non-negative, got {}",
                self.base_wage
            )));
        }
        if !self.min_wage_ratio.is_finite()
            || !self.max_wage_ratio.is_finite()
            || self.min_wage_ratio < 0.0
            || self.min_wage_ratio > self.max_wage_ratio
        {
            return Err(AttentionBankError::InvalidConfig(format!(
                "{currency} wage ratio clamp [{}, {}] is not a valid range",
                self.min_wage_ratio, self.max_wage_ratio
            )));
        }
        Ok(())
    }
}

impl Default for FundConfig {
    fn default() -> Self {
        Self {
            starting_funds: 10_000,
            target_funds: 10_000,
            buffer: 1_000,
            base_wage: 10.0,
            min_wage_ratio: 0.0,
            max_wage_ratio: 2.0,
        }
    }
}

/// Configuration for an AttentionBank.
///
/// Supplied once at construction and immutable afterwards. Missing fields
/// in a serialized document take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankConfig {
    /// Short-term importance fund.
    pub sti: FundConfig,
    /// Long-term importance fund.
    pub lti: FundConfig,
    /// Smoothing window N of the min/max STI trackers. Default: 20.
    pub extremum_window: u32,
    /// Attentional focus boundary at construction. Default: 100.
    pub initial_boundary: i64,
}

impl BankConfig {
    /// Fund parameters for one currency.
    pub fn fund(&self, currency: Currency) -> &FundConfig {
        match currency {
            Currency::Sti => &self.sti,
            Currency::Lti => &self.lti,
        }
    }

    /// Reject configurations the wage controller or trackers cannot run with.
    pub fn validate(&self) -> Result<()> {
        for currency in Currency::ALL {
            self.fund(currency).validate(currency)?;
        }
        if self.extremum_window == 0 {
            return Err(AttentionBankError::InvalidConfig(
                "extremum_window must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            sti: FundConfig::default(),
            lti: FundConfig::default(),
            extremum_window: 20,
            initial_boundary: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
