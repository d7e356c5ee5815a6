//! Homeostatic wage controller.
//!
//! The wage is a proportional control law on the fund level:
//!
//! ```text
//! ratio = 1.0                          if |available - target| <= buffer
//!       = available / target           otherwise
//! wage  = base_wage * clamp(ratio, min_wage_ratio, max_wage_ratio)
//! ```
//!
//! A pool drained below target pays less per stimulus, a pool above target
//! pays more, and the buffer keeps small excursions from moving the wage.

use crate::funds::FundPool;
use crate::types::{BankConfig, Currency, FundConfig};

#[derive(Debug, Clone, Copy)]
struct WageLaw {
    base: f64,
    min_ratio: f64,
    max_ratio: f64,
}

impl WageLaw {
    fn new(config: &FundConfig) -> Self {
        Self {
            base: config.base_wage,
            min_ratio: config.min_wage_ratio,
            max_ratio: config.max_wage_ratio,
        }
    }
}

/// Computes per-stimulus payouts from the current fund levels.
///
/// Stateless apart from the configured constants: the wage is recomputed
/// on demand because the funds move with every stimulation.
#[derive(Debug, Clone)]
pub struct WageCalculator {
    sti: WageLaw,
    lti: WageLaw,
}

impl WageCalculator {
    pub fn new(config: &BankConfig) -> Self {
        Self {
            sti: WageLaw::new(&config.sti),
            lti: WageLaw::new(&config.lti),
        }
    }

    fn law(&self, currency: Currency) -> &WageLaw {
        match currency {
            Currency::Sti => &self.sti,
            Currency::Lti => &self.lti,
        }
    }

    /// Importance awarded per unit of stimulus in `currency` right now.
    pub fn compute_wage(&self, currency: Currency, pool: &FundPool) -> f64 {
        let fund = pool.fund(currency);
        let law = self.law(currency);
        let available = fund.available();
        let target = fund.target();

        let ratio = if available.abs_diff(target) <= fund.buffer().unsigned_abs() {
            1.0
        } else {
            available as f64 / target as f64
        };
        let clamped = ratio.clamp(law.min_ratio, law.max_ratio);
        if clamped != ratio {
            log::debug!(
                "{} wage saturated: available={} target={} ratio={:.3}",
                currency,
                available,
                target,
                ratio
            );
        }
        law.base * clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> BankConfig {
        let mut cfg = BankConfig::default();
        cfg.sti = FundConfig {
            starting_funds: 10_000,
            target_funds: 10_000,
            buffer: 500,
            base_wage: 10.0,
            min_wage_ratio: 0.5,
            max_wage_ratio: 1.5,
        };
        cfg
    }

    #[test]
    fn at_target_pays_base() {
        let cfg = make_config();
        let pool = FundPool::new(&cfg);
        let wages = WageCalculator::new(&cfg);
        assert_eq!(wages.compute_wage(Currency::Sti, &pool), 10.0);
    }

    #[test]
    fn inside_buffer_pays_base() {
        let cfg = make_config();
        let pool = FundPool::new(&cfg);
        let wages = WageCalculator::new(&cfg);
        pool.debit(Currency::Sti, 500);
        assert_eq!(wages.compute_wage(Currency::Sti, &pool), 10.0);
        pool.credit(Currency::Sti, 1_000);
        assert_eq!(wages.compute_wage(Currency::Sti, &pool), 10.0);
    }

    #[test]
    fn drained_pool_pays_less() {
        let cfg = make_config();
        let pool = FundPool::new(&cfg);
        let wages = WageCalculator::new(&cfg);
        pool.debit(Currency::Sti, 2_000);
        let wage = wages.compute_wage(Currency::Sti, &pool);
        assert!((wage - 8.0).abs() < 1e-9);
    }

    #[test]
    fn flush_pool_pays_more() {
        let cfg = make_config();
        let pool = FundPool::new(&cfg);
        let wages = WageCalculator::new(&cfg);
        pool.credit(Currency::Sti, 2_000);
        let wage = wages.compute_wage(Currency::Sti, &pool);
        assert!((wage - 12.0).abs() < 1e-9);
    }

    #[test]
    fn saturates_at_bounds() {
        let cfg = make_config();
        let pool = FundPool::new(&cfg);
        let wages = WageCalculator::new(&cfg);
        pool.debit(Currency::Sti, 30_000);
        assert_eq!(wages.compute_wage(Currency::Sti, &pool), 5.0);
        pool.credit(Currency::Sti, 80_000);
        assert_eq!(wages.compute_wage(Currency::Sti, &pool), 15.0);
    }

    #[test]
    fn currencies_use_their_own_law() {
        let cfg = make_config();
        let pool = FundPool::new(&cfg);
        let wages = WageCalculator::new(&cfg);
        pool.debit(Currency::Sti, 30_000);
        // LTI keeps the default law and an untouched pool.
        assert_eq!(wages.compute_wage(Currency::Lti, &pool), 10.0);
    }
}
