//! Threshold detector over the smoothed rate of change of a weight matrix.
//!
//! # Algorithm
//!
//! For a weight matrix W with T rows:
//!
//! ```text
//! change[t-1] = Σ_j |W[t,j] - W[t-1,j]|          t = 1..T-1
//! smoothed    = centered moving average of change (partial windows at the edges)
//! threshold   = median(smoothed) + m · s(smoothed)   s = sample std, m = multiplier
//! candidates  = { i : smoothed[i] > threshold }
//! ```
//!
//! Candidates are reported in ascending order. With a merge distance `d`, a
//! candidate within `d` of the previously kept candidate is dropped.

use serde::Serialize;
use tracing::debug;

use crate::config::PhaseConfig;
use crate::data::WeightMatrix;
use crate::error::{AnalysisError, Result};
use crate::stats;

/// Change-point detector parameters.
///
/// # Examples
///
/// ```
/// use u_stability::data::WeightMatrix;
/// use u_stability::detection::ChangePointDetector;
///
/// let mut rows = vec![vec![0.0, 0.0]; 30];
/// for row in rows.iter_mut().skip(15) {
///     *row = vec![1.0, 1.0];
/// }
/// let weights = WeightMatrix::new(rows).unwrap();
/// let detector = ChangePointDetector::new(3).unwrap();
/// let candidates = detector.detect(&weights).unwrap();
/// assert!(candidates.iter().all(|&i| (12..=16).contains(&i)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePointDetector {
    smoothing_window: usize,
    threshold_multiplier: f64,
    merge_distance: Option<usize>,
}

/// The derived signal and threshold of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSignal {
    /// L1 change per step, length T-1.
    pub raw: Vec<f64>,
    /// Centered moving average of `raw`.
    pub smoothed: Vec<f64>,
    pub median: f64,
    /// Sample standard deviation of `smoothed`.
    pub std_dev: f64,
    pub threshold: f64,
    /// Indices into `smoothed` above the threshold, after merging.
    pub candidates: Vec<usize>,
}

impl ChangePointDetector {
    /// Detector with the given window, multiplier 2 and no merging.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] if `smoothing_window` is 0.
    pub fn new(smoothing_window: usize) -> Result<Self> {
        Self::with_params(smoothing_window, 2.0, None)
    }

    /// Detector with every parameter explicit.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] for a zero window or a negative
    /// or non-finite multiplier.
    pub fn with_params(
        smoothing_window: usize,
        threshold_multiplier: f64,
        merge_distance: Option<usize>,
    ) -> Result<Self> {
        if smoothing_window == 0 {
            return Err(AnalysisError::invalid_parameter(
                "smoothing_window",
                smoothing_window,
                "must be at least 1",
            ));
        }
        if !threshold_multiplier.is_finite() || threshold_multiplier < 0.0 {
            return Err(AnalysisError::invalid_parameter(
                "threshold_multiplier",
                threshold_multiplier,
                "must be finite and non-negative",
            ));
        }
        Ok(Self {
            smoothing_window,
            threshold_multiplier,
            merge_distance,
        })
    }

    /// Detector configured from the `[phases]` section.
    pub fn from_config(config: &PhaseConfig) -> Result<Self> {
        Self::with_params(
            config.smoothing_window,
            config.threshold_multiplier,
            config.merge_distance,
        )
    }

    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    pub fn threshold_multiplier(&self) -> f64 {
        self.threshold_multiplier
    }

    pub fn merge_distance(&self) -> Option<usize> {
        self.merge_distance
    }

    /// Computes the full change signal.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InsufficientData`] with fewer than 3 time steps
    /// (the threshold needs at least two smoothed values).
    pub fn signal(&self, weights: &WeightMatrix) -> Result<ChangeSignal> {
        let raw = change_magnitudes(weights);
        let insufficient = || AnalysisError::InsufficientData {
            what: "change-point threshold",
            needed: 3,
            available: weights.len(),
        };
        if raw.len() < 2 {
            return Err(insufficient());
        }

        let smoothed = centered_moving_average(&raw, self.smoothing_window);
        let median = stats::median(&smoothed).ok_or_else(insufficient)?;
        let std_dev = stats::sample_std_dev(&smoothed).ok_or_else(insufficient)?;
        let threshold = median + self.threshold_multiplier * std_dev;

        let above: Vec<usize> = smoothed
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v > threshold)
            .map(|(i, _)| i)
            .collect();
        let candidates = match self.merge_distance {
            Some(distance) => merge_nearby(&above, distance),
            None => above,
        };

        debug!(
            steps = weights.len(),
            window = self.smoothing_window,
            median,
            std_dev,
            threshold,
            candidates = candidates.len(),
            "change signal computed"
        );

        Ok(ChangeSignal {
            raw,
            smoothed,
            median,
            std_dev,
            threshold,
            candidates,
        })
    }

    /// Candidate boundary indices in ascending order.
    pub fn detect(&self, weights: &WeightMatrix) -> Result<Vec<usize>> {
        Ok(self.signal(weights)?.candidates)
    }
}

/// Sum of absolute differences between consecutive rows.
///
/// Returns T-1 values; empty for fewer than 2 rows.
pub fn change_magnitudes(weights: &WeightMatrix) -> Vec<f64> {
    weights
        .rows()
        .windows(2)
        .map(|pair| {
            pair[1]
                .iter()
                .zip(pair[0].iter())
                .map(|(b, a)| (b - a).abs())
                .sum::<f64>()
        })
        .collect()
}

/// Centered moving average with partial windows at the edges.
///
/// For window `w` the average at `i` covers `[i - w/2, i + (w-1)/2]`,
/// clipped to the data; edge values average fewer samples.
///
/// # Examples
///
/// ```
/// use u_stability::detection::centered_moving_average;
///
/// let s = centered_moving_average(&[0.0, 3.0, 6.0, 9.0], 3);
/// assert_eq!(s, vec![1.5, 3.0, 6.0, 7.5]);
/// ```
pub fn centered_moving_average(data: &[f64], window: usize) -> Vec<f64> {
    let n = data.len();
    if window == 0 || n == 0 {
        return Vec::new();
    }
    let before = window / 2;
    let after = (window - 1) / 2;

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(before);
            let hi = (i + after + 1).min(n);
            data[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}

/// Keeps the first of every run of candidates closer than `distance`.
fn merge_nearby(candidates: &[usize], distance: usize) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::with_capacity(candidates.len());
    for &c in candidates {
        match kept.last() {
            Some(&last) if c - last <= distance => {}
            _ => kept.push(c),
        }
    }
    kept
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn detection_is_deterministic(
            rows in proptest::collection::vec(
                proptest::collection::vec(-10.0_f64..10.0, 3), 3..60),
            window in 1_usize..15,
        ) {
            let weights = WeightMatrix::new(rows).expect("finite rows");
            let detector = ChangePointDetector::new(window).expect("valid");
            let a = detector.signal(&weights).expect("T >= 3");
            let b = detector.signal(&weights).expect("T >= 3");
            prop_assert_eq!(&a, &b);
            prop_assert!(a.candidates.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(a.candidates.iter().all(|&i| i < weights.len() - 1));
        }

        #[test]
        fn smoothed_values_stay_within_raw_bounds(
            data in proptest::collection::vec(0.0_f64..100.0, 1..80),
            window in 1_usize..20,
        ) {
            let s = centered_moving_average(&data, window);
            prop_assert_eq!(s.len(), data.len());
            let lo = data.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            for v in s {
                prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
            }
        }
    }
}
