//! Tukey–Kramer honestly significant difference (HSD) post-hoc test.
//!
//! For every unordered pair (i, j), i < j:
//!
//! ```text
//! diff   = mean_j - mean_i
//! se     = sqrt(MS_within / 2 · (1/n_i + 1/n_j))
//! q      = |diff| / se                       ~ studentized range (k, N-k)
//! CI     = diff ± q_crit · se,   q_crit = Q⁻¹(1 - α; k, N-k)
//! ```
//!
//! The harmonic-style standard error handles unbalanced designs; with equal
//! group sizes it reduces to the classical Tukey HSD.
//!
//! # References
//!
//! - Tukey, J.W. (1949). "Comparing individual means in the analysis of variance",
//!   *Biometrics* 5(2), pp. 99-114.
//! - Kramer, C.Y. (1956). "Extension of multiple range tests to group means with
//!   unequal numbers of replications", *Biometrics* 12(3), pp. 307-310.

use serde::Serialize;

use crate::distribution::DistributionProvider;
use crate::error::{AnalysisError, Result};

use super::anova::one_way_anova;

/// Comparison of one pair of groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseComparison {
    /// Index of the first group.
    pub group_a: usize,
    /// Index of the second group (`group_a < group_b`).
    pub group_b: usize,
    /// mean_b - mean_a.
    pub mean_difference: f64,
    /// Standard error of the difference.
    pub std_error: f64,
    /// Studentized range statistic |diff| / se.
    pub q_statistic: f64,
    /// Lower bound of the simultaneous confidence interval.
    pub lower: f64,
    /// Upper bound of the simultaneous confidence interval.
    pub upper: f64,
    /// Family-wise adjusted p-value.
    pub p_adjusted: f64,
    /// Whether the pair differs at the family-wise level (CI excludes 0).
    pub reject: bool,
}

/// All pairwise comparisons of a Tukey–Kramer test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostHocResult {
    /// Family-wise significance level.
    pub alpha: f64,
    /// Number of groups compared.
    pub groups: usize,
    /// Error degrees of freedom (N-k).
    pub df_within: usize,
    /// Pooled within-group mean square.
    pub ms_within: f64,
    /// Critical studentized range value at `1 - alpha`.
    pub q_critical: f64,
    /// One entry per unordered pair, ordered (0,1), (0,2), ..., (k-2,k-1).
    pub comparisons: Vec<PairwiseComparison>,
}

impl PostHocResult {
    /// Pairs flagged as significantly different.
    pub fn significant_pairs(&self) -> Vec<(usize, usize)> {
        self.comparisons
            .iter()
            .filter(|c| c.reject)
            .map(|c| (c.group_a, c.group_b))
            .collect()
    }

    /// The comparison of groups `a` and `b`, in either order.
    pub fn pair(&self, a: usize, b: usize) -> Option<&PairwiseComparison> {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        self.comparisons
            .iter()
            .find(|c| c.group_a == lo && c.group_b == hi)
    }
}

/// Tukey–Kramer HSD over `groups` at family-wise level `alpha`.
///
/// # Errors
///
/// - Any error of [`one_way_anova`] (too few groups, empty groups, N = k).
/// - [`AnalysisError::InvalidParameter`] if `alpha` is not in (0, 1).
/// - [`AnalysisError::ZeroVariance`] if the pooled within-group variance is
///   zero, which leaves the standard error undefined.
///
/// # Examples
///
/// ```
/// use u_stability::distribution::StatrsDistributions;
/// use u_stability::testing::tukey_hsd;
///
/// let a = [5.0, 6.0, 7.0, 5.5, 6.5];
/// let b = [5.2, 6.1, 6.8, 5.9, 6.4];
/// let c = [9.0, 10.0, 9.5, 10.5, 9.8];
/// let r = tukey_hsd(&[&a, &b, &c], 0.05, &StatrsDistributions).unwrap();
/// assert_eq!(r.comparisons.len(), 3);
/// assert_eq!(r.significant_pairs(), vec![(0, 2), (1, 2)]);
/// ```
pub fn tukey_hsd<D: DistributionProvider>(
    groups: &[&[f64]],
    alpha: f64,
    distributions: &D,
) -> Result<PostHocResult> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(AnalysisError::invalid_parameter(
            "alpha",
            alpha,
            "must lie strictly between 0 and 1",
        ));
    }
    let anova = one_way_anova(groups, distributions)?;
    if anova.ms_within <= 0.0 {
        return Err(AnalysisError::ZeroVariance {
            what: "pooled within-group variance",
        });
    }

    let k = groups.len();
    let df = anova.df_within as f64;
    let q_critical = distributions.studentized_range_quantile(1.0 - alpha, k, df);

    let mut comparisons = Vec::with_capacity(k * (k - 1) / 2);
    for a in 0..k {
        for b in (a + 1)..k {
            let na = anova.group_sizes[a] as f64;
            let nb = anova.group_sizes[b] as f64;
            let diff = anova.group_means[b] - anova.group_means[a];
            let std_error = (anova.ms_within / 2.0 * (1.0 / na + 1.0 / nb)).sqrt();
            let q_statistic = diff.abs() / std_error;
            let half_width = q_critical * std_error;

            comparisons.push(PairwiseComparison {
                group_a: a,
                group_b: b,
                mean_difference: diff,
                std_error,
                q_statistic,
                lower: diff - half_width,
                upper: diff + half_width,
                p_adjusted: distributions.studentized_range_upper_tail(q_statistic, k, df),
                reject: q_statistic > q_critical,
            });
        }
    }

    Ok(PostHocResult {
        alpha,
        groups: k,
        df_within: anova.df_within,
        ms_within: anova.ms_within,
        q_critical,
        comparisons,
    })
}
