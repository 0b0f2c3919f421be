//! Hypothesis testing for group means.
//!
//! One-way ANOVA as the omnibus test, Tukey–Kramer HSD as the post-hoc
//! comparison, and the Welch t-test for two samples. [`SignificanceTester`]
//! chains ANOVA and the post-hoc test: the pairwise table is produced only
//! when the omnibus p-value falls below the significance level.
//!
//! # Examples
//!
//! ```
//! use u_stability::testing::SignificanceTester;
//!
//! let a = [10.0, 10.2, 9.9, 10.1, 9.8];
//! let b = [10.1, 9.9, 10.0, 10.2, 9.9];
//! let c = [12.0, 12.1, 11.9, 12.2, 11.8];
//! let report = SignificanceTester::new(0.05).unwrap().test(&[&a, &b, &c]).unwrap();
//! assert!(report.anova.p_value < 0.001);
//! let post_hoc = report.post_hoc.unwrap();
//! assert_eq!(post_hoc.significant_pairs(), vec![(0, 2), (1, 2)]);
//! ```

mod anova;
mod tukey;
mod welch;

pub use anova::{one_way_anova, AnovaResult};
pub use tukey::{tukey_hsd, PairwiseComparison, PostHocResult};
pub use welch::{welch_t_test, TTestResult};

use serde::Serialize;
use tracing::{debug, warn};

use crate::distribution::{DistributionProvider, StatrsDistributions};
use crate::error::{AnalysisError, Result};
use crate::stats;

/// Descriptive summary of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupSummary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation (divisor n).
    pub std_dev: f64,
}

/// Count, mean and population standard deviation per group.
///
/// Empty groups report a count of 0 with `NaN` moments.
pub fn describe_groups(groups: &[&[f64]]) -> Vec<GroupSummary> {
    groups
        .iter()
        .map(|g| GroupSummary {
            count: g.len(),
            mean: stats::mean(g).unwrap_or(f64::NAN),
            std_dev: stats::population_std_dev(g).unwrap_or(f64::NAN),
        })
        .collect()
}

/// Omnibus and post-hoc results for one set of groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificanceReport {
    pub alpha: f64,
    pub groups: Vec<GroupSummary>,
    pub anova: AnovaResult,
    /// Present only when the ANOVA rejects at `alpha` and the pooled
    /// variance is non-zero.
    pub post_hoc: Option<PostHocResult>,
}

impl SignificanceReport {
    /// Whether the omnibus test rejects equality of means.
    pub fn is_significant(&self) -> bool {
        self.anova.is_significant(self.alpha)
    }
}

/// Two-stage ANOVA → Tukey–Kramer pipeline.
///
/// Generic over the [`DistributionProvider`] so tests can substitute
/// tabulated reference values.
#[derive(Debug, Clone)]
pub struct SignificanceTester<D = StatrsDistributions> {
    alpha: f64,
    distributions: D,
}

impl SignificanceTester<StatrsDistributions> {
    /// Tester at significance level `alpha` with the default distributions.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] unless `0 < alpha < 1`.
    pub fn new(alpha: f64) -> Result<Self> {
        Self::with_distributions(alpha, StatrsDistributions)
    }
}

impl<D: DistributionProvider> SignificanceTester<D> {
    /// Tester backed by a custom distribution provider.
    pub fn with_distributions(alpha: f64, distributions: D) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(AnalysisError::invalid_parameter(
                "alpha",
                alpha,
                "must lie strictly between 0 and 1",
            ));
        }
        Ok(Self {
            alpha,
            distributions,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn distributions(&self) -> &D {
        &self.distributions
    }

    /// Runs ANOVA and, when significant, the Tukey–Kramer comparison.
    ///
    /// # Errors
    ///
    /// Propagates [`one_way_anova`] errors. A significant ANOVA with zero
    /// pooled variance (distinct constant groups) skips the post-hoc stage
    /// instead of failing.
    pub fn test(&self, groups: &[&[f64]]) -> Result<SignificanceReport> {
        let anova = one_way_anova(groups, &self.distributions)?;
        debug!(
            groups = groups.len(),
            f = anova.f_statistic,
            p = anova.p_value,
            df_between = anova.df_between,
            df_within = anova.df_within,
            "one-way ANOVA"
        );

        let post_hoc = if !anova.is_significant(self.alpha) {
            None
        } else if anova.ms_within <= 0.0 {
            warn!(
                groups = groups.len(),
                "pooled within-group variance is zero; post-hoc comparison skipped"
            );
            None
        } else {
            let result = tukey_hsd(groups, self.alpha, &self.distributions)?;
            debug!(
                q_critical = result.q_critical,
                rejected = result.significant_pairs().len(),
                "Tukey-Kramer comparison"
            );
            Some(result)
        };

        Ok(SignificanceReport {
            alpha: self.alpha,
            groups: describe_groups(groups),
            anova,
            post_hoc,
        })
    }
}
