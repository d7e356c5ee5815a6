use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};

use crate::boundary::{Crossing, FocusBoundary};
use crate::error::{AttentionBankError, Result};
use crate::extremum::DecayingExtremum;
use crate::funds::FundPool;
use crate::signal::{FocusEvent, FocusSignal};
use crate::table::{ItemTable, SubscriptionId, ValueChangeListener};
use crate::types::{AttentionValue, BankConfig, Currency, Handle};
use crate::wage::WageCalculator;

/// Lifecycle of a bank. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Stimulations accepted, notifications processed.
    Active,
    /// New stimulations ignored; in-flight ones drain and their
    /// notifications are still booked.
    ShuttingDown,
    /// Everything ignored. The bank is unsubscribed from its table.
    Inert,
}

#[derive(Debug, Clone, Copy)]
enum Activity {
    Stimulation,
    Notification,
}

#[derive(Debug)]
struct Lifecycle {
    phase: Phase,
    stimulations: usize,
    notifications: usize,
}

/// Admission ticket for one stimulation or notification. Releases its
/// slot on drop, waking a pending shutdown.
struct InFlight<'a> {
    bank: &'a AttentionBank,
    activity: Activity,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut lc = self.bank.lifecycle();
        let remaining = match self.activity {
            Activity::Stimulation => {
                lc.stimulations -= 1;
                lc.stimulations
            }
            Activity::Notification => {
                lc.notifications -= 1;
                lc.notifications
            }
        };
        if remaining == 0 && lc.phase != Phase::Active {
            self.bank.idle.notify_all();
        }
    }
}

/// The attention bank: conserved STI/LTI funds shared by every item of an
/// item table, and the attentional focus those funds define.
///
/// Importance is never created or destroyed here. Every committed change
/// the table reports moves the difference between the item and the pool,
/// so `total_importance(c) + funds(c) == starting_funds(c)` whenever no
/// change is in flight. `stimulate` only asks the table for a credit; the
/// matching debit is booked when the table reports the commit.
///
/// Items whose STI is at or above the focus boundary are in focus. Every
/// boundary crossing is published exactly once on `entered_focus` or
/// `left_focus`, synchronously with the change that caused it.
pub struct AttentionBank {
    /// Construction-time configuration.
    config: BankConfig,
    /// Store owning every item's value.
    table: Arc<dyn ItemTable>,
    /// Conserved STI and LTI pools.
    funds: FundPool,
    /// Homeostatic wage law per currency.
    wages: WageCalculator,
    /// Attentional focus boundary.
    boundary: FocusBoundary,
    /// Smoothed maximum STI, fed by maintenance passes.
    max_sti: DecayingExtremum,
    /// Smoothed minimum STI, fed by maintenance passes.
    min_sti: DecayingExtremum,
    /// Subscribers for items rising to the boundary.
    entered_focus: FocusSignal,
    /// Subscribers for items dropping below the boundary.
    left_focus: FocusSignal,
    /// Phase and in-flight counters.
    state: Mutex<Lifecycle>,
    /// Signalled when an in-flight count drains to zero during shutdown.
    idle: Condvar,
    /// Registration on `table`, taken by shutdown.
    subscription: Mutex<Option<SubscriptionId>>,
}

impl AttentionBank {
    /// Create a bank over `table` and subscribe it to the table's changes.
    pub fn new(table: Arc<dyn ItemTable>, config: BankConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let bank = Arc::new(Self {
            funds: FundPool::new(&config),
            wages: WageCalculator::new(&config),
            boundary: FocusBoundary::new(config.initial_boundary),
            max_sti: DecayingExtremum::new(config.extremum_window),
            min_sti: DecayingExtremum::new(config.extremum_window),
            entered_focus: FocusSignal::new(),
            left_focus: FocusSignal::new(),
            state: Mutex::new(Lifecycle {
                phase: Phase::Active,
                stimulations: 0,
                notifications: 0,
            }),
            idle: Condvar::new(),
            subscription: Mutex::new(None),
            table,
            config,
        });

        let weak = Arc::downgrade(&bank);
        let listener: Weak<dyn ValueChangeListener> = weak;
        let id = bank.table.subscribe(listener);
        *bank.subscription.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);

        log::info!(
            "attention bank created: sti funds={} lti funds={} boundary={}",
            bank.config.sti.starting_funds,
            bank.config.lti.starting_funds,
            bank.config.initial_boundary
        );
        Ok(bank)
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, activity: Activity) -> Option<InFlight<'_>> {
        let mut lc = self.lifecycle();
        match activity {
            Activity::Stimulation if lc.phase == Phase::Active => lc.stimulations += 1,
            Activity::Notification if lc.phase != Phase::Inert => lc.notifications += 1,
            _ => return None,
        }
        Some(InFlight {
            bank: self,
            activity,
        })
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.lifecycle().phase
    }

    pub fn is_active(&self) -> bool {
        self.phase() == Phase::Active
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Stimulation
    // -----------------------------------------------------------------------

    /// Pay an item `wage * stimulus` in both currencies.
    ///
    /// The stimulus must be finite and non-negative. Once shutdown has begun
    /// this does nothing and returns `Ok`.
    ///
    /// An unknown handle is rejected before any credit is requested. If the
    /// item is removed while the two credits are in progress, the STI credit
    /// may already be committed (and booked) when the LTI credit fails with
    /// `UnknownItem`.
    pub fn stimulate(&self, handle: Handle, stimulus: f64) -> Result<()> {
        if !stimulus.is_finite() || stimulus < 0.0 {
            return Err(AttentionBankError::InvalidStimulus { stimulus });
        }
        let Some(_ticket) = self.enter(Activity::Stimulation) else {
            log::trace!("stimulate {} ignored: bank is shutting down", handle);
            return Ok(());
        };

        if self.table.value(handle).is_none() {
            return Err(AttentionBankError::UnknownItem { handle });
        }

        // Both wages are priced before either credit moves the funds.
        let awards = Currency::ALL.map(|c| (c, (self.compute_wage(c) * stimulus) as i64));
        for (currency, award) in awards {
            if award == 0 {
                continue;
            }
            log::trace!("stimulate {}: {} award {}", handle, currency, award);
            self.table.request_credit(handle, currency, award)?;
        }
        Ok(())
    }

    /// Importance paid per unit of stimulus in `currency` at current funds.
    pub fn compute_wage(&self, currency: Currency) -> f64 {
        self.wages.compute_wage(currency, &self.funds)
    }

    // -----------------------------------------------------------------------
    // Funds
    // -----------------------------------------------------------------------

    /// Importance available in the pool.
    pub fn funds(&self, currency: Currency) -> i64 {
        self.funds.available(currency)
    }

    /// Importance held by all items together.
    pub fn total_importance(&self, currency: Currency) -> i64 {
        self.funds.total_spent(currency)
    }

    /// Adjust the pool directly, returning the new level.
    ///
    /// For callers that move importance in or out of the item population
    /// without a table notification. Ignored once the bank is inert.
    pub fn update_funds(&self, currency: Currency, diff: i64) -> i64 {
        if self.phase() == Phase::Inert {
            return self.funds.available(currency);
        }
        self.funds.credit(currency, diff)
    }

    // -----------------------------------------------------------------------
    // Attentional focus
    // -----------------------------------------------------------------------

    pub fn boundary(&self) -> i64 {
        self.boundary.get()
    }

    /// Move the focus boundary, returning the previous one.
    ///
    /// Items are not re-evaluated; a crossing against the new boundary is
    /// reported on the item's next value change. Ignored once inert.
    pub fn set_boundary(&self, value: i64) -> i64 {
        if self.phase() == Phase::Inert {
            return self.boundary.get();
        }
        let previous = self.boundary.set(value);
        log::debug!("focus boundary moved {} -> {}", previous, value);
        previous
    }

    /// Whether a value is in focus under the current boundary.
    pub fn in_focus(&self, value: &AttentionValue) -> bool {
        self.boundary.in_focus(value.sti)
    }

    /// Subscribers told when an item's STI rises to the boundary.
    ///
    /// Callbacks run synchronously inside the table's change notification.
    /// They may read the table and this bank; whether they may write back
    /// into the table depends on the table (`MemoryTable` does not allow
    /// it), and they must never call `shutdown` on this bank.
    pub fn entered_focus(&self) -> &FocusSignal {
        &self.entered_focus
    }

    /// Subscribers told when an item's STI drops below the boundary. Same
    /// callback rules as `entered_focus`.
    pub fn left_focus(&self) -> &FocusSignal {
        &self.left_focus
    }

    // -----------------------------------------------------------------------
    // Extrema
    // -----------------------------------------------------------------------

    /// Largest STI observed, smoothed if `use_average`.
    pub fn max_sti(&self, use_average: bool) -> i64 {
        self.max_sti.read(use_average)
    }

    /// Smallest STI observed, smoothed if `use_average`.
    pub fn min_sti(&self, use_average: bool) -> i64 {
        self.min_sti.read(use_average)
    }

    /// Feed the maximum STI seen by a maintenance pass.
    pub fn update_max_sti(&self, value: i64) {
        if self.phase() != Phase::Inert {
            self.max_sti.observe(value);
        }
    }

    /// Feed the minimum STI seen by a maintenance pass.
    pub fn update_min_sti(&self, value: i64) {
        if self.phase() != Phase::Inert {
            self.min_sti.observe(value);
        }
    }

    // -----------------------------------------------------------------------
    // Normalization
    // -----------------------------------------------------------------------

    /// Map STI onto `[-1, 1]`: `[min, boundary)` linearly onto `[-1, 0)`,
    /// `[boundary, max]` linearly onto `[0, 1]`.
    ///
    /// Smoothed extrema lag the true ones, so without `clip` the result may
    /// leave the range.
    pub fn normalized_sti(&self, value: &AttentionValue, use_average: bool, clip: bool) -> f64 {
        let n = normalize_two_segment(
            value.sti,
            self.min_sti(use_average),
            self.boundary(),
            self.max_sti(use_average),
        );
        if clip {
            n.clamp(-1.0, 1.0)
        } else {
            n
        }
    }

    /// `normalized_sti(value, true, false)`.
    pub fn normalized_sti_default(&self, value: &AttentionValue) -> f64 {
        self.normalized_sti(value, true, false)
    }

    /// The two-segment mapping rescaled to `[0, 1]`; the boundary sits at 0.5.
    pub fn normalized_zero_to_one_sti(
        &self,
        value: &AttentionValue,
        use_average: bool,
        clip: bool,
    ) -> f64 {
        (self.normalized_sti(value, use_average, clip) + 1.0) / 2.0
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Stop the bank: `Active -> ShuttingDown -> Inert`, then unsubscribe.
    ///
    /// Waits for in-flight stimulations and notifications to finish, so no
    /// change is booked after this returns. Idempotent. Must not be called
    /// from a focus-event callback of this bank.
    pub fn shutdown(&self) {
        let mut lc = self.lifecycle();
        if lc.phase != Phase::Active {
            return;
        }
        lc.phase = Phase::ShuttingDown;
        log::info!("attention bank shutting down");

        let mut lc = self
            .idle
            .wait_while(lc, |lc| lc.stimulations > 0)
            .unwrap_or_else(PoisonError::into_inner);
        lc.phase = Phase::Inert;
        let lc = self
            .idle
            .wait_while(lc, |lc| lc.notifications > 0)
            .unwrap_or_else(PoisonError::into_inner);
        drop(lc);

        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = subscription {
            self.table.unsubscribe(id);
        }
        log::info!(
            "attention bank inert: sti funds={} lti funds={}",
            self.funds.available(Currency::Sti),
            self.funds.available(Currency::Lti)
        );
    }
}

impl ValueChangeListener for AttentionBank {
    fn on_value_changed(&self, handle: Handle, old: &AttentionValue, new: &AttentionValue) {
        let Some(_ticket) = self.enter(Activity::Notification) else {
            return;
        };

        for currency in Currency::ALL {
            let diff = old.get(currency).wrapping_sub(new.get(currency));
            if diff == 0 {
                continue;
            }
            let level = self.funds.credit(currency, diff);
            if level < 0 && level.wrapping_sub(diff) >= 0 {
                log::warn!("{} funds overdrawn: {}", currency, level);
            }
        }

        let event = FocusEvent {
            handle,
            old: *old,
            new: *new,
        };
        match self.boundary.classify(old.sti, new.sti) {
            Crossing::EnteredFocus => {
                log::debug!("{} entered focus: {} -> {}", handle, old.sti, new.sti);
                self.entered_focus.emit(&event);
            }
            Crossing::LeftFocus => {
                log::debug!("{} left focus: {} -> {}", handle, old.sti, new.sti);
                self.left_focus.emit(&event);
            }
            Crossing::NoChange => {}
        }
    }
}

impl Drop for AttentionBank {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AttentionBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttentionBank")
            .field("phase", &self.phase())
            .field("sti_funds", &self.funds.available(Currency::Sti))
            .field("lti_funds", &self.funds.available(Currency::Lti))
            .field("boundary", &self.boundary.get())
            .finish()
    }
}

/// Two-segment linear normalization around `boundary`.
///
/// A zero-width segment saturates: the boundary itself maps to 0 and any
/// other value on that side to -1 or 1.
fn normalize_two_segment(sti: i64, min: i64, boundary: i64, max: i64) -> f64 {
    if sti >= boundary {
        let width = max as f64 - boundary as f64;
        if sti == boundary {
            0.0
        } else if width <= 0.0 {
            1.0
        } else {
            (sti as f64 - boundary as f64) / width
        }
    } else {
        let width = boundary as f64 - min as f64;
        if width <= 0.0 {
            -1.0
        } else {
            (sti as f64 - boundary as f64) / width
        }
    }
}
