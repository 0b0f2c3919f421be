//! One-way analysis of variance.

use serde::Serialize;

use crate::distribution::DistributionProvider;
use crate::error::{AnalysisError, Result};
use crate::stats;

/// Result of one-way ANOVA.
///
/// # Invariants
///
/// - `df_between + df_within == N - 1`
/// - `f_statistic` and `p_value` are `NaN` when every observation in every
///   group is the same constant (the test is undefined)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaResult {
    /// F-statistic.
    pub f_statistic: f64,
    /// Right-tailed p-value.
    pub p_value: f64,
    /// Degrees of freedom between groups (k-1).
    pub df_between: usize,
    /// Degrees of freedom within groups (N-k).
    pub df_within: usize,
    /// Sum of squares between groups.
    pub ss_between: f64,
    /// Sum of squares within groups.
    pub ss_within: f64,
    /// Mean square between.
    pub ms_between: f64,
    /// Mean square within.
    pub ms_within: f64,
    /// Group means.
    pub group_means: Vec<f64>,
    /// Group sizes.
    pub group_sizes: Vec<usize>,
    /// Grand mean.
    pub grand_mean: f64,
}

impl AnovaResult {
    /// Total number of observations.
    pub fn total_observations(&self) -> usize {
        self.group_sizes.iter().sum()
    }

    /// Whether F and p are defined (not the all-constant case).
    pub fn is_defined(&self) -> bool {
        !self.f_statistic.is_nan()
    }

    /// Whether H₀ is rejected at `alpha`. Undefined results never reject.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Validates test groups: at least 2, each non-empty and finite.
pub(crate) fn check_groups(groups: &[&[f64]]) -> Result<()> {
    if groups.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            what: "group comparison",
            needed: 2,
            available: groups.len(),
        });
    }
    for (i, g) in groups.iter().enumerate() {
        if g.is_empty() {
            return Err(AnalysisError::DegenerateGroup {
                group: i,
                reason: "group has no observations".into(),
            });
        }
        if g.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::DegenerateGroup {
                group: i,
                reason: "group contains non-finite values".into(),
            });
        }
    }
    Ok(())
}

/// One-way ANOVA: H₀: all group means are equal.
///
/// # Algorithm
///
/// F = MS_between / MS_within where
/// MS_between = SS_between / (k-1),
/// MS_within = SS_within / (N-k).
///
/// Groups may have unequal sizes, including single observations, as long
/// as N > k. When every group is constant, SS_within is exactly zero:
/// F is `NaN` if the constants coincide, and `+∞` (p = 0) otherwise.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientData`] for fewer than 2 groups or N = k.
/// - [`AnalysisError::DegenerateGroup`] for an empty or non-finite group.
///
/// # References
///
/// Fisher (1925). "Statistical Methods for Research Workers".
///
/// # Examples
///
/// ```
/// use u_stability::distribution::StatrsDistributions;
/// use u_stability::testing::one_way_anova;
///
/// let group1 = [5.0, 6.0, 7.0, 5.5, 6.5];
/// let group2 = [8.0, 9.0, 8.5, 9.5, 8.0];
/// let group3 = [4.0, 3.0, 3.5, 4.5, 4.0];
/// let r = one_way_anova(&[&group1, &group2, &group3], &StatrsDistributions).unwrap();
/// assert!(r.p_value < 0.01); // means clearly differ
/// assert_eq!(r.df_between + r.df_within, 14);
/// ```
pub fn one_way_anova<D: DistributionProvider>(
    groups: &[&[f64]],
    distributions: &D,
) -> Result<AnovaResult> {
    check_groups(groups)?;

    let k = groups.len();
    let total_n: usize = groups.iter().map(|g| g.len()).sum();
    let df_between = k - 1;
    let df_within = total_n - k;
    if df_within == 0 {
        return Err(AnalysisError::InsufficientData {
            what: "within-group degrees of freedom",
            needed: k + 1,
            available: total_n,
        });
    }

    let grand_sum: f64 = groups.iter().flat_map(|g| g.iter()).sum();
    let grand_mean = grand_sum / total_n as f64;

    let group_means: Vec<f64> = groups
        .iter()
        .map(|g| g.iter().sum::<f64>() / g.len() as f64)
        .collect();
    let group_sizes: Vec<usize> = groups.iter().map(|g| g.len()).collect();

    // Constant groups are detected exactly; floating-point means of repeated
    // values need not reproduce the value.
    let all_constant = groups
        .iter()
        .all(|g| stats::range(g).map_or(false, |r| r == 0.0));
    let same_constant = all_constant && groups.iter().all(|g| g[0] == groups[0][0]);

    let ss_between: f64 = if same_constant {
        0.0
    } else {
        groups
            .iter()
            .zip(group_means.iter())
            .map(|(g, &gm)| g.len() as f64 * (gm - grand_mean).powi(2))
            .sum()
    };
    let ss_within: f64 = if all_constant {
        0.0
    } else {
        groups
            .iter()
            .zip(group_means.iter())
            .map(|(g, &gm)| g.iter().map(|&x| (x - gm).powi(2)).sum::<f64>())
            .sum()
    };

    let ms_between = ss_between / df_between as f64;
    let ms_within = ss_within / df_within as f64;

    let (f_statistic, p_value) = if same_constant {
        (f64::NAN, f64::NAN)
    } else if all_constant {
        (f64::INFINITY, 0.0)
    } else {
        let f = ms_between / ms_within;
        (
            f,
            distributions.f_upper_tail(f, df_between as f64, df_within as f64),
        )
    };

    Ok(AnovaResult {
        f_statistic,
        p_value,
        df_between,
        df_within,
        ss_between,
        ss_within,
        ms_between,
        ms_within,
        group_means,
        group_sizes,
        grand_mean,
    })
}
