//! Two-sample Welch t-test.

use serde::Serialize;

use crate::distribution::DistributionProvider;
use crate::error::{AnalysisError, Result};
use crate::stats;

/// Result of a two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTestResult {
    /// t statistic.
    pub statistic: f64,
    /// Welch–Satterthwaite degrees of freedom (fractional).
    pub df: f64,
    /// Two-tailed p-value.
    pub p_value: f64,
    /// mean(a) - mean(b).
    pub mean_difference: f64,
}

/// Welch t-test: H₀: μ₁ = μ₂ without assuming equal variances.
///
/// # Algorithm
///
/// t = (x̄₁ - x̄₂) / √(s₁²/n₁ + s₂²/n₂)
/// df = Welch-Satterthwaite approximation.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] if either sample has fewer than 2 observations.
/// - [`AnalysisError::DegenerateGroup`] for non-finite values.
/// - [`AnalysisError::ZeroVariance`] if both samples are constant.
///
/// # References
///
/// Welch (1947). "The generalization of Student's problem when several
/// different population variances are involved". Biometrika, 34, 28–35.
///
/// # Examples
///
/// ```
/// use u_stability::distribution::StatrsDistributions;
/// use u_stability::testing::welch_t_test;
///
/// let a = [5.1, 4.9, 5.2, 5.0, 4.8];
/// let b = [7.1, 6.9, 7.2, 7.0, 6.8];
/// let r = welch_t_test(&a, &b, &StatrsDistributions).unwrap();
/// assert!(r.p_value < 0.01);
/// ```
pub fn welch_t_test<D: DistributionProvider>(
    a: &[f64],
    b: &[f64],
    distributions: &D,
) -> Result<TTestResult> {
    for (group, sample) in [a, b].iter().enumerate() {
        if sample.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                what: "t-test sample",
                needed: 2,
                available: sample.len(),
            });
        }
        if sample.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::DegenerateGroup {
                group,
                reason: "sample contains non-finite values".into(),
            });
        }
    }

    let insufficient = || AnalysisError::InsufficientData {
        what: "t-test sample",
        needed: 2,
        available: a.len().min(b.len()),
    };
    let mean1 = stats::mean(a).ok_or_else(insufficient)?;
    let mean2 = stats::mean(b).ok_or_else(insufficient)?;
    let var1 = stats::sample_std_dev(a).ok_or_else(insufficient)?.powi(2);
    let var2 = stats::sample_std_dev(b).ok_or_else(insufficient)?.powi(2);

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let v1 = var1 / n1;
    let v2 = var2 / n2;
    let se_sq = v1 + v2;
    if se_sq < 1e-300 {
        return Err(AnalysisError::ZeroVariance {
            what: "t-test samples",
        });
    }

    let diff = mean1 - mean2;
    let t = diff / se_sq.sqrt();
    let df = se_sq.powi(2) / (v1 * v1 / (n1 - 1.0) + v2 * v2 / (n2 - 1.0));
    let p_value = (2.0 * distributions.t_upper_tail(t.abs(), df)).min(1.0);

    Ok(TTestResult {
        statistic: t,
        df,
        p_value,
        mean_difference: diff,
    })
}
