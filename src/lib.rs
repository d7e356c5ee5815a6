//! Economic attention allocation for knowledge graphs.
//!
//! An attention bank holds the conserved short-term (STI) and long-term
//! (LTI) importance funds shared by every item of an external item table.
//! Stimulating an item pays it a wage drawn from the funds; the wage is
//! steered so the funds hover around a target. Items whose STI reaches the
//! focus boundary form the attentional focus, and every crossing of that
//! boundary is published to subscribers.

pub mod bank;
pub mod boundary;
pub mod error;
pub mod extremum;
pub mod funds;
pub mod signal;
pub mod table;
pub mod types;
pub mod wage;

pub use bank::{AttentionBank, Phase};
pub use boundary::{crossed, Crossing, FocusBoundary};
pub use error::{AttentionBankError, Result};
pub use extremum::DecayingExtremum;
pub use funds::{Fund, FundPool};
pub use signal::{ConnectionId, FocusEvent, FocusSignal};
pub use table::{ItemTable, MemoryTable, SubscriptionId, ValueChangeListener};
pub use types::{AttentionValue, BankConfig, Currency, FundConfig, Handle};
pub use wage::WageCalculator;
