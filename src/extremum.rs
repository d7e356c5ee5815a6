use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, Default)]
struct ExtremumState {
    /// Last value fed, `None` until the first observation.
    raw: Option<i64>,
    /// Exponential moving average of every value fed.
    smoothed: f64,
}

/// Exponentially smoothed running extreme of an STI stream.
///
/// The caller decides what an "extreme" is and feeds it with `observe`;
/// the tracker keeps the last value fed and a moving average with window
/// `N`: `smoothed += (candidate - smoothed) / N`. The first observation
/// seeds the average directly.
///
/// Each tracker owns its lock, so the max and min trackers never contend.
#[derive(Debug)]
pub struct DecayingExtremum {
    window: f64,
    state: Mutex<ExtremumState>,
}

impl DecayingExtremum {
    /// Create a tracker with smoothing window `window` (clamped to at least 1).
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1) as f64,
            state: Mutex::new(ExtremumState::default()),
        }
    }

    /// Feed a new extreme. The whole read-modify-write runs under the lock.
    pub fn observe(&self, candidate: i64) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let c = candidate as f64;
        state.smoothed = match state.raw {
            None => c,
            Some(_) => state.smoothed + (c - state.smoothed) / self.window,
        };
        state.raw = Some(candidate);
    }

    /// The smoothed value if `use_average`, else the last value fed.
    /// Reads 0 before the first observation.
    pub fn read(&self, use_average: bool) -> i64 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if use_average {
            state.smoothed.round() as i64
        } else {
            state.raw.unwrap_or(0)
        }
    }

    /// The unrounded moving average.
    pub fn smoothed(&self) -> f64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .smoothed
    }

    /// Whether anything has been observed yet.
    pub fn is_seeded(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .raw
            .is_some()
    }
}
