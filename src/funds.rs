//! Conserved fund pools, one per currency.
//!
//! A fund holds the importance not currently owned by any item. Items and
//! the pool together always account for `starting_funds`, so the total held
//! by items is derived as `starting - funds` without scanning the table.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::types::{BankConfig, Currency, FundConfig};

/// One currency's pool. Lock-free; every update is a single atomic add.
#[derive(Debug)]
pub struct Fund {
    funds: AtomicI64,
    starting: i64,
    target: i64,
    buffer: i64,
}

impl Fund {
    pub fn new(config: &FundConfig) -> Self {
        Self {
            funds: AtomicI64::new(config.starting_funds),
            starting: config.starting_funds,
            target: config.target_funds,
            buffer: config.buffer,
        }
    }

    /// Add `amount` to the pool and return the resulting level.
    ///
    /// No bounds are enforced; the level may go negative transiently.
    pub fn credit(&self, amount: i64) -> i64 {
        self.funds.fetch_add(amount, Ordering::AcqRel).wrapping_add(amount)
    }

    /// Remove `amount` from the pool and return the resulting level.
    pub fn debit(&self, amount: i64) -> i64 {
        self.credit(amount.wrapping_neg())
    }

    /// Current pool level.
    pub fn available(&self) -> i64 {
        self.funds.load(Ordering::Acquire)
    }

    /// Importance currently held by items: `starting - available`.
    pub fn total_spent(&self) -> i64 {
        self.starting - self.available()
    }

    pub fn starting(&self) -> i64 {
        self.starting
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    pub fn buffer(&self) -> i64 {
        self.buffer
    }
}

/// The STI and LTI pools side by side. The two never share synchronization.
#[derive(Debug)]
pub struct FundPool {
    sti: Fund,
    lti: Fund,
}

impl FundPool {
    pub fn new(config: &BankConfig) -> Self {
        Self {
            sti: Fund::new(&config.sti),
            lti: Fund::new(&config.lti),
        }
    }

    /// The pool for one currency.
    pub fn fund(&self, currency: Currency) -> &Fund {
        match currency {
            Currency::Sti => &self.sti,
            Currency::Lti => &self.lti,
        }
    }

    pub fn credit(&self, currency: Currency, amount: i64) -> i64 {
        self.fund(currency).credit(amount)
    }

    pub fn debit(&self, currency: Currency, amount: i64) -> i64 {
        self.fund(currency).debit(amount)
    }

    pub fn available(&self, currency: Currency) -> i64 {
        self.fund(currency).available()
    }

    pub fn total_spent(&self, currency: Currency) -> i64 {
        self.fund(currency).total_spent()
    }
}
