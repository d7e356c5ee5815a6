use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

/// How an STI change moved an item relative to the focus boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crossing {
    /// `old < boundary <= new`.
    EnteredFocus,
    /// `old >= boundary > new`.
    LeftFocus,
    NoChange,
}

/// Classify a change from `old_sti` to `new_sti` against `boundary`.
///
/// Focus membership is a threshold crossing, so both values are needed:
/// an update that stays on one side (including `old == new`) is `NoChange`.
pub fn crossed(old_sti: i64, new_sti: i64, boundary: i64) -> Crossing {
    let was_in = old_sti >= boundary;
    let is_in = new_sti >= boundary;
    match (was_in, is_in) {
        (false, true) => Crossing::EnteredFocus,
        (true, false) => Crossing::LeftFocus,
        _ => Crossing::NoChange,
    }
}

/// The attentional focus boundary on STI.
///
/// Written rarely, read on every value change. Each read is used for a
/// single comparison, so an atomic scalar is enough.
#[derive(Debug)]
pub struct FocusBoundary {
    value: AtomicI64,
}

impl FocusBoundary {
    pub fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
        }
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    /// Replace the boundary, returning the previous one.
    pub fn set(&self, value: i64) -> i64 {
        self.value.swap(value, Ordering::AcqRel)
    }

    /// Classify a change against the current boundary.
    pub fn classify(&self, old_sti: i64, new_sti: i64) -> Crossing {
        crossed(old_sti, new_sti, self.get())
    }

    /// Whether an STI is in focus under the current boundary.
    pub fn in_focus(&self, sti: i64) -> bool {
        sti >= self.get()
    }
}
