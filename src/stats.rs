//! Descriptive statistics over `f64` slices.
//!
//! Thin wrappers over `statrs::statistics` that return `None` instead of
//! `NaN` for empty or non-finite input, so callers can surface a typed error.

use statrs::statistics::{Data, Median, Statistics};

fn all_finite(data: &[f64]) -> bool {
    data.iter().all(|v| v.is_finite())
}

/// Arithmetic mean.
///
/// # Returns
///
/// `None` if `data` is empty or contains non-finite values.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !all_finite(data) {
        return None;
    }
    Some(data.iter().mean())
}

/// Sample standard deviation (Bessel-corrected, divisor n-1).
///
/// # Returns
///
/// `None` if fewer than 2 observations or non-finite values.
pub fn sample_std_dev(data: &[f64]) -> Option<f64> {
    if data.len() < 2 || !all_finite(data) {
        return None;
    }
    Some(data.iter().std_dev())
}

/// Population standard deviation (divisor n).
///
/// # Returns
///
/// `None` if `data` is empty or contains non-finite values.
pub fn population_std_dev(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !all_finite(data) {
        return None;
    }
    if data.len() == 1 {
        return Some(0.0);
    }
    Some(data.iter().population_std_dev())
}

/// Median (average of the two middle values for even lengths).
pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !all_finite(data) {
        return None;
    }
    Some(Data::new(data.to_vec()).median())
}

/// Range (max - min).
pub fn range(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !all_finite(data) {
        return None;
    }
    let (lo, hi) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    Some(hi - lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]).expect("mean") - 2.5).abs() < 1e-12);
        assert!(mean(&[]).is_none());
        assert!(mean(&[1.0, f64::NAN]).is_none());
    }

    #[test]
    fn test_sample_vs_population_std_dev() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let pop = population_std_dev(&data).expect("pop");
        assert!((pop - 2.0).abs() < 1e-12, "pop = {pop}");
        let sample = sample_std_dev(&data).expect("sample");
        assert!((sample - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12, "sample = {sample}");
        assert!(sample_std_dev(&[1.0]).is_none());
        assert_eq!(population_std_dev(&[3.0]), Some(0.0));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert!((median(&[3.0, 1.0, 2.0]).expect("odd") - 2.0).abs() < 1e-12);
        assert!((median(&[4.0, 1.0, 3.0, 2.0]).expect("even") - 2.5).abs() < 1e-12);
        assert!(median(&[]).is_none());
    }

    #[test]
    fn test_range() {
        assert!((range(&[1.0, 5.0, 3.0]).expect("range") - 4.0).abs() < f64::EPSILON);
        assert!(range(&[10.0, 10.0]).expect("range").abs() < f64::EPSILON);
        assert!(range(&[]).is_none());
    }
}
