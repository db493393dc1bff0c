//! Least-squares slope of RTT over time.

use std::collections::VecDeque;

use crate::error::{DelaySignalError, Result};
use crate::extreme_window::Sample;

/// Slope of the simple linear regression of `value` on `time`:
///
/// `Σ(tᵢ − t̄)(rᵢ − r̄) / Σ(tᵢ − t̄)²`
///
/// Needs at least two distinct timestamps, otherwise the denominator is
/// zero and `InsufficientData` is returned.
pub(crate) fn least_squares_slope(samples: &VecDeque<Sample>) -> Result<f64> {
    let n = samples.len();
    if n < 2 {
        return Err(DelaySignalError::insufficient(2, n));
    }

    let count = n as f64;
    let mean_t = samples.iter().map(|s| s.time).sum::<f64>() / count;
    let mean_v = samples.iter().map(|s| s.value).sum::<f64>() / count;

    let (numerator, denominator) =
        samples
            .iter()
            .fold((0.0, 0.0), |(num, den), Sample { time, value }| {
                let dt = time - mean_t;
                (num + dt * (value - mean_v), den + dt * dt)
            });

    if denominator == 0.0 {
        // Every sample shares one timestamp
        return Err(DelaySignalError::insufficient(2, 1));
    }

    Ok(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(points: &[(f64, f64)]) -> VecDeque<Sample> {
        points
            .iter()
            .map(|&(time, value)| Sample { time, value })
            .collect()
    }

    #[test]
    fn test_perfect_line() -> testresult::TestResult {
        let samples = history(&[(0.0, 10.0), (1.0, 12.0), (2.0, 14.0), (3.0, 16.0)]);
        assert!((least_squares_slope(&samples)? - 2.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_flat_rtt_has_zero_slope() -> testresult::TestResult {
        let samples = history(&[(0.0, 50.0), (10.0, 50.0), (20.0, 50.0)]);
        assert_eq!(least_squares_slope(&samples)?, 0.0);
        Ok(())
    }

    #[test]
    fn test_noisy_decreasing() -> testresult::TestResult {
        let samples = history(&[(0.0, 100.0), (1.0, 90.0), (2.0, 85.0), (3.0, 70.0)]);
        // t̄ = 1.5, r̄ = 86.25, Σdt·dr = -47.5, Σdt² = 5
        assert!((least_squares_slope(&samples)? + 9.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_single_sample_is_insufficient() {
        let err = least_squares_slope(&history(&[(0.0, 1.0)])).unwrap_err();
        assert!(matches!(
            err,
            DelaySignalError::InsufficientData {
                required: 2,
                available: 1
            }
        ));
    }

    #[test]
    fn test_identical_timestamps_are_insufficient() {
        let samples = history(&[(5.0, 10.0), (5.0, 20.0), (5.0, 30.0)]);
        let err = least_squares_slope(&samples).unwrap_err();
        assert!(err.is_insufficient_data());
    }
}
