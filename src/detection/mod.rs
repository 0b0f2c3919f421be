//! Change-point detection.
//!
//! Structural breaks are located on an auxiliary weight matrix (latent state
//! weights over time) rather than on the measurement series itself. The
//! detector makes a single deterministic pass over a derived univariate
//! signal: the L1 rate of change, smoothed by a centered moving average, is
//! compared against a threshold taken from its own distribution.
//!
//! # Detectors
//!
//! - [`ChangePointDetector`] — median + m·std threshold on the smoothed change signal
//!
//! # References
//!
//! - Aminikhanghahi, S. & Cook, D.J. (2017). "A survey of methods for time series
//!   change point detection", *Knowledge and Information Systems* 51(2), pp. 339-367.

mod change_point;

pub use change_point::{
    centered_moving_average, change_magnitudes, ChangePointDetector, ChangeSignal,
};
