//! Property-based tests for the attention bank.
//!
//! Verifies conservation of importance under arbitrary stimulation and
//! direct writes, monotonicity of the wage controller, the range and
//! boundary identity of normalization, exactly-once focus crossings and
//! convergence of the decaying extrema.

use attention_bank::*;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

// ============================================================================
// Strategies
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Stimulate { item: u64, stimulus: f64 },
    Write { item: u64, sti: i64, lti: i64 },
    Remove { item: u64 },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u64..8, 0.0f64..5.0).prop_map(|(item, stimulus)| Op::Stimulate { item, stimulus }),
        2 => (0u64..8, -200i64..2_000, -200i64..2_000)
            .prop_map(|(item, sti, lti)| Op::Write { item, sti, lti }),
        1 => (0u64..8).prop_map(|item| Op::Remove { item }),
    ]
}

fn arb_fund() -> impl Strategy<Value = FundConfig> {
    (1i64..50_000, 0i64..5_000, 0.0f64..50.0, 0.0f64..1.0, 1.0f64..4.0).prop_map(
        |(target, buffer, base_wage, min_wage_ratio, max_wage_ratio)| FundConfig {
            starting_funds: target,
            target_funds: target,
            buffer,
            base_wage,
            min_wage_ratio,
            max_wage_ratio,
        },
    )
}

// ============================================================================
// Conservation
// ============================================================================

proptest! {
    /// **Core invariant**: whatever mix of stimulation, direct writes and
    /// removals reaches the table, the pool plus the items always hold
    /// exactly the starting funds, and the derived total matches a scan.
    #[test]
    fn importance_is_conserved(ops in prop::collection::vec(arb_op(), 0..60)) {
        let table = Arc::new(MemoryTable::new());
        let bank = AttentionBank::new(table.clone(), BankConfig::default()).unwrap();
        for item in 0..8 {
            table.insert(Handle::from_raw(item), AttentionValue::default());
        }

        for op in ops {
            match op {
                Op::Stimulate { item, stimulus } => {
                    let handle = Handle::from_raw(item);
                    let result = bank.stimulate(handle, stimulus);
                    if table.value(handle).is_some() {
                        prop_assert!(result.is_ok());
                    }
                }
                Op::Write { item, sti, lti } => {
                    let handle = Handle::from_raw(item);
                    let value = AttentionValue::new(sti, lti, 0);
                    if table.set_value(handle, value).is_err() {
                        table.insert(handle, value);
                    }
                }
                Op::Remove { item } => {
                    table.remove(Handle::from_raw(item));
                }
            }
        }

        for c in Currency::ALL {
            prop_assert_eq!(table.total(c), bank.total_importance(c));
            prop_assert_eq!(bank.total_importance(c) + bank.funds(c), 10_000);
        }
    }
}

// ============================================================================
// Wage controller
// ============================================================================

proptest! {
    /// The wage never decreases as the pool grows, and always lies in
    /// `[base * min_ratio, base * max_ratio]`.
    #[test]
    fn wage_is_monotone_and_bounded(
        fund in arb_fund(),
        a in -100_000i64..100_000,
        b in -100_000i64..100_000,
    ) {
        let cfg = BankConfig { sti: fund.clone(), ..BankConfig::default() };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let low_pool = FundPool::new(&cfg);
        low_pool.credit(Currency::Sti, lo - fund.starting_funds);
        let high_pool = FundPool::new(&cfg);
        high_pool.credit(Currency::Sti, hi - fund.starting_funds);

        let wages = WageCalculator::new(&cfg);
        let w_lo = wages.compute_wage(Currency::Sti, &low_pool);
        let w_hi = wages.compute_wage(Currency::Sti, &high_pool);

        prop_assert!(w_lo <= w_hi, "wage fell from {} to {} as funds rose", w_lo, w_hi);
        for w in [w_lo, w_hi] {
            prop_assert!(w >= fund.base_wage * fund.min_wage_ratio - 1e-9);
            prop_assert!(w <= fund.base_wage * fund.max_wage_ratio + 1e-9);
        }
    }

    /// Far enough outside the clamp range the wage sits exactly on a bound.
    #[test]
    fn wage_saturates_outside_clamp(fund in arb_fund()) {
        let cfg = BankConfig { sti: fund.clone(), ..BankConfig::default() };
        let wages = WageCalculator::new(&cfg);

        let drained = FundPool::new(&cfg);
        drained.debit(Currency::Sti, fund.starting_funds * 10 + fund.buffer);
        prop_assert_eq!(
            wages.compute_wage(Currency::Sti, &drained),
            fund.base_wage * fund.min_wage_ratio
        );

        let flooded = FundPool::new(&cfg);
        flooded.credit(Currency::Sti, fund.target_funds * 10 + fund.buffer);
        prop_assert_eq!(
            wages.compute_wage(Currency::Sti, &flooded),
            fund.base_wage * fund.max_wage_ratio
        );
    }
}

// ============================================================================
// Normalization
// ============================================================================

fn bank_with_extrema(min: i64, boundary: i64, max: i64) -> (Arc<MemoryTable>, Arc<AttentionBank>) {
    let table = Arc::new(MemoryTable::new());
    let cfg = BankConfig { initial_boundary: boundary, ..BankConfig::default() };
    let bank = AttentionBank::new(table.clone(), cfg).unwrap();
    bank.update_min_sti(min);
    bank.update_max_sti(max);
    (table, bank)
}

proptest! {
    /// The boundary always maps to 0 (and 0.5), whatever the extrema.
    #[test]
    fn boundary_maps_to_midpoint(
        min in -10_000i64..10_000,
        boundary in -10_000i64..10_000,
        max in -10_000i64..10_000,
        use_average in any::<bool>(),
        clip in any::<bool>(),
    ) {
        let (_table, bank) = bank_with_extrema(min, boundary, max);
        let v = AttentionValue::new(boundary, 0, 0);
        prop_assert_eq!(bank.normalized_sti(&v, use_average, clip), 0.0);
        prop_assert_eq!(bank.normalized_zero_to_one_sti(&v, use_average, clip), 0.5);
    }

    /// Clipped results stay in range and keep the sign of `sti - boundary`.
    #[test]
    fn clipped_normalization_in_range(
        min in -10_000i64..0,
        max in 1i64..10_000,
        sti in -50_000i64..50_000,
    ) {
        let (_table, bank) = bank_with_extrema(min, 0, max);
        let v = AttentionValue::new(sti, 0, 0);
        let n = bank.normalized_sti(&v, false, true);
        prop_assert!((-1.0..=1.0).contains(&n));
        prop_assert_eq!(n >= 0.0, sti >= 0);
        let z = bank.normalized_zero_to_one_sti(&v, false, true);
        prop_assert!((0.0..=1.0).contains(&z));
        prop_assert_eq!(z >= 0.5, sti >= 0);
    }
}

// ============================================================================
// Focus crossings
// ============================================================================

proptest! {
    /// Along any STI walk, exactly one event fires per side change, events
    /// alternate in/out, and each carries the change that caused it.
    #[test]
    fn crossings_fire_once_per_side_change(
        boundary in -100i64..100,
        walk in prop::collection::vec(-300i64..300, 1..80),
    ) {
        let table = Arc::new(MemoryTable::new());
        let cfg = BankConfig { initial_boundary: boundary, ..BankConfig::default() };
        let bank = AttentionBank::new(table.clone(), cfg).unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        bank.entered_focus().connect(move |e| sink.lock().unwrap().push((true, e.old.sti, e.new.sti)));
        let sink = Arc::clone(&events);
        bank.left_focus().connect(move |e| sink.lock().unwrap().push((false, e.old.sti, e.new.sti)));

        let handle = Handle::from_raw(1);
        table.insert(handle, AttentionValue::default());

        let mut expected = Vec::new();
        let mut prev = 0i64;
        for sti in walk {
            table.set_value(handle, AttentionValue::new(sti, 0, 0)).unwrap();
            match crossed(prev, sti, boundary) {
                Crossing::EnteredFocus => expected.push((true, prev, sti)),
                Crossing::LeftFocus => expected.push((false, prev, sti)),
                Crossing::NoChange => {}
            }
            prev = sti;
        }

        let events = events.lock().unwrap();
        prop_assert_eq!(&*events, &expected);
        for pair in events.windows(2) {
            prop_assert_ne!(pair[0].0, pair[1].0);
        }
    }
}

// ============================================================================
// Decaying extrema
// ============================================================================

proptest! {
    /// A constant feed drives the average to the constant; the raw value is
    /// the constant from the first observation of it.
    #[test]
    fn extremum_converges_to_constant(
        window in 1u32..50,
        seed in -10_000i64..10_000,
        c in -10_000i64..10_000,
    ) {
        let tracker = DecayingExtremum::new(window);
        tracker.observe(seed);
        tracker.observe(c);
        prop_assert_eq!(tracker.read(false), c);
        for _ in 0..(window as usize * 40) {
            tracker.observe(c);
        }
        prop_assert!((tracker.smoothed() - c as f64).abs() < 1e-3);
        prop_assert_eq!(tracker.read(true), c);
    }
}
