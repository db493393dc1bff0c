//! Sliding time-window extreme (min or max) tracker.
//!
//! Keeps the running minimum (or maximum) of all values observed within a
//! trailing time horizon. Samples are held in a monotonic deque so that
//! insertion is amortized O(1) and the extreme is always at the front.
//!
//! ## Design
//!
//! - On insert, every sample at the back that the new value dominates is
//!   dropped: it can never become the extreme again.
//! - After insert, samples older than `now - horizon` are dropped from the
//!   front, but the last remaining sample is always kept even when stale.
//! - The horizon is owned by the caller and may change between inserts.

use std::collections::VecDeque;

use crate::config::MIN_HORIZON;

/// Which extreme a [`SlidingExtremeWindow`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Min,
    Max,
}

impl Polarity {
    /// Value reported before any sample has been inserted.
    pub const fn sentinel(self) -> f64 {
        match self {
            Polarity::Min => f64::INFINITY,
            Polarity::Max => f64::NEG_INFINITY,
        }
    }

    /// Whether `candidate` is at least as extreme as `existing`.
    #[inline]
    fn dominates(self, candidate: f64, existing: f64) -> bool {
        match self {
            Polarity::Min => existing >= candidate,
            Polarity::Max => existing <= candidate,
        }
    }

    /// Whether `candidate` is strictly more extreme than `existing`.
    #[inline]
    fn improves(self, candidate: f64, existing: f64) -> bool {
        match self {
            Polarity::Min => candidate < existing,
            Polarity::Max => candidate > existing,
        }
    }
}

/// A `(timestamp, value)` pair held by the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub value: f64,
}

/// Windowed minimum or maximum over a trailing time horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingExtremeWindow {
    polarity: Polarity,
    /// Trailing duration within which samples stay eligible.
    horizon: f64,
    /// Monotonic run: front holds the extreme, values get strictly less
    /// extreme toward the back.
    samples: VecDeque<Sample>,
    /// Always equals `samples.front().value`, or the sentinel when empty.
    extreme: f64,
}

impl SlidingExtremeWindow {
    pub fn new(polarity: Polarity) -> Self {
        Self {
            polarity,
            horizon: MIN_HORIZON,
            samples: VecDeque::new(),
            extreme: polarity.sentinel(),
        }
    }

    pub fn new_min() -> Self {
        Self::new(Polarity::Min)
    }

    pub fn new_max() -> Self {
        Self::new(Polarity::Max)
    }

    /// Insert `value` observed at `now`, then drop stale history.
    ///
    /// Non-finite input would break the monotonic run, so debug builds
    /// panic on it and release builds ignore the sample.
    pub fn new_sample(&mut self, value: f64, now: f64) {
        debug_assert!(
            value.is_finite() && now.is_finite(),
            "window sample ({value} at {now}) must be finite"
        );
        if !value.is_finite() || !now.is_finite() {
            tracing::warn!(value, now, "Ignoring non-finite window sample");
            return;
        }
        let now = self.checked_now(now);

        while let Some(back) = self.samples.back() {
            if !self.polarity.dominates(value, back.value) {
                break;
            }
            self.samples.pop_back();
        }

        self.samples.push_back(Sample { time: now, value });
        // The dominated run may have held the extreme, in which case the
        // new value now sits at the front.
        if self.samples.len() == 1 || self.polarity.improves(value, self.extreme) {
            self.extreme = value;
        }

        self.evict_stale(now);
    }

    /// Drop samples older than `now - horizon`, always keeping at least one.
    pub fn evict_stale(&mut self, now: f64) {
        let cutoff = now - self.horizon;
        let mut recompute = false;

        while self.samples.len() > 1 {
            let Some(front) = self.samples.front() else {
                break;
            };
            if front.time >= cutoff {
                break;
            }
            if self.polarity.dominates(front.value, self.extreme) {
                recompute = true;
            }
            self.samples.pop_front();
        }

        if recompute {
            // Monotonic run: the new front is the extreme of what remains.
            if let Some(front) = self.samples.front() {
                tracing::trace!(
                    polarity = ?self.polarity,
                    old = self.extreme,
                    new = front.value,
                    horizon = self.horizon,
                    "Extreme expired from window"
                );
                self.extreme = front.value;
            }
        }
    }

    /// Set the horizon used by the next eviction. Does not evict.
    pub fn update_horizon(&mut self, horizon: f64) {
        debug_assert!(
            horizon >= 0.0,
            "window horizon ({horizon}) must be non-negative"
        );
        self.horizon = if horizon >= 0.0 { horizon } else { 0.0 };
    }

    /// Reset to the freshly constructed state.
    pub fn clear(&mut self) {
        self.horizon = MIN_HORIZON;
        self.samples.clear();
        self.extreme = self.polarity.sentinel();
    }

    /// Current extreme, or the polarity's sentinel before any sample.
    ///
    /// The sentinel (`+inf` / `-inf`) is not a measurement; check
    /// [`is_empty`](Self::is_empty) first when that matters.
    pub fn extreme(&self) -> f64 {
        self.extreme
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Retained samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter()
    }

    /// Timestamps must be non-decreasing; a late `now` is clamped to the
    /// newest retained timestamp.
    fn checked_now(&self, now: f64) -> f64 {
        match self.samples.back() {
            Some(back) => {
                debug_assert!(
                    now >= back.time,
                    "timestamp moved backwards ({now} < {})",
                    back.time
                );
                now.max(back.time)
            }
            None => now,
        }
    }
}

impl From<&SlidingExtremeWindow> for f64 {
    fn from(window: &SlidingExtremeWindow) -> Self {
        window.extreme()
    }
}
