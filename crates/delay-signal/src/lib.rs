//! Delay-based congestion signals for end-to-end senders.
//!
//! Every acknowledged packet yields an RTT sample. From that stream this
//! crate derives the signals a delay-based sending policy reads:
//!
//! - the minimum RTT over a long horizon (propagation delay estimate)
//! - a jitter-filtered RTT (minimum over half a smoothed RTT)
//! - a queue-building classifier, optionally gated by the RTT gradient
//! - a weighted RTT baseline with a debounced, bounded tuning parameter
//!
//! [`FlowDelaySignals`] bundles all of them for a single flow. The building
//! blocks ([`SlidingExtremeWindow`], [`DelaySignalWindow`] and
//! [`AdaptiveDelayBaseline`]) are public for callers that only need part of
//! the pipeline.
//!
//! Time and RTT share whatever unit the caller uses, consistently (the
//! built-in horizon floor of `10_000` assumes milliseconds).

pub mod baseline;
pub mod config;
mod error;
pub mod extreme_window;
pub mod rtt_window;
mod signals;
mod stats;

pub use baseline::{standard_deviation, weighted_moving_average, AdaptiveDelayBaseline};
pub use config::{BaselineConfig, DelaySignalConfig, MAX_DELTA, MIN_DELTA};
pub use error::{DelaySignalError, Result};
pub use extreme_window::{Polarity, Sample, SlidingExtremeWindow};
pub use rtt_window::DelaySignalWindow;
pub use signals::FlowDelaySignals;
pub use stats::DelaySignalStats;
