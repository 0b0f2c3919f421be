//! Control limit estimation strategies.
//!
//! Two interchangeable policies share one contract: given the per-subgroup
//! statistics, produce {CL, UCL, LCL} for a chart kind.
//!
//! # Empirical policy
//!
//! CL = mean of the plotted statistic, sigma = its sample standard deviation
//! (divisor m-1 over m subgroups), limits = CL ± 3·sigma. Needs m ≥ 2.
//!
//! # Constants-based policy
//!
//! - X-bar: CL = X-double-bar, UCL/LCL = CL ± A2 · R-bar
//! - R: CL = R-bar, UCL = D4 · R-bar, LCL = D3 · R-bar
//! - P: CL = p-bar, UCL/LCL = p-bar ± 3·sqrt(p-bar(1-p-bar)/n_i)
//!
//! where n_i is the constant number of binary observations per subgroup.
//!
//! For Range and Proportion charts the lower limit is floored at zero under
//! both policies; the Mean chart is never floored.
//!
//! # Reference
//!
//! Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.,
//! Chapters 6–7.

use crate::config::LimitPolicy;
use crate::error::{AnalysisError, Result};
use crate::stats;

use super::chart::{ChartKind, ControlLimits};
use super::factors::ShewhartConstants;
use super::subgroup::SubgroupStatistics;

/// Sigma multiplier for Shewhart limits.
const SIGMA_MULTIPLIER: f64 = 3.0;

/// A control-limit estimation strategy.
///
/// # Examples
///
/// ```
/// use u_stability::data::MeasurementTable;
/// use u_stability::spc::{ChartKind, LimitStrategy, SubgroupStatistics, Subgrouper};
///
/// let table = MeasurementTable::from_series(&[10.0, 12.0, 11.0, 13.0, 9.0, 11.0]).unwrap();
/// let partition = Subgrouper::new(2).unwrap().partition(&table).unwrap();
/// let stats = SubgroupStatistics::from_subgroups(2, &partition.subgroups).unwrap();
///
/// let limits = LimitStrategy::constants().compute(ChartKind::Mean, &stats).unwrap();
/// assert!((limits.cl - 11.0).abs() < 1e-12);
/// assert!(limits.ucl > limits.cl && limits.cl > limits.lcl);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum LimitStrategy {
    /// CL ± 3 sample standard deviations of the plotted statistic.
    Empirical,
    /// Classical Shewhart factors from the given table.
    ConstantsBased(ShewhartConstants),
}

impl LimitStrategy {
    /// Constants-based strategy with the ASTM factor table.
    pub fn constants() -> Self {
        Self::ConstantsBased(ShewhartConstants::astm())
    }

    /// Strategy for a configured policy.
    pub fn from_policy(policy: LimitPolicy) -> Self {
        match policy {
            LimitPolicy::Empirical => Self::Empirical,
            LimitPolicy::Constants => Self::constants(),
        }
    }

    /// The policy this strategy implements.
    pub fn policy(&self) -> LimitPolicy {
        match self {
            Self::Empirical => LimitPolicy::Empirical,
            Self::ConstantsBased(_) => LimitPolicy::Constants,
        }
    }

    /// Computes the limits of `kind` from subgroup statistics.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::InsufficientData`] with fewer than 2 subgroups under
    ///   the empirical policy, no subgroups under the constants policy, or a
    ///   Proportion chart requested for data without indicators.
    /// - [`AnalysisError::UnsupportedSubgroupSize`] if the constants table
    ///   has no entry for the observations per subgroup.
    pub fn compute(&self, kind: ChartKind, stats: &SubgroupStatistics) -> Result<ControlLimits> {
        let limits = match self {
            Self::Empirical => empirical(kind, plotted_values(kind, stats)?)?,
            Self::ConstantsBased(table) => constants_based(table, kind, stats)?,
        };
        Ok(if kind.is_non_negative() {
            limits.floored()
        } else {
            limits
        })
    }
}

/// The per-subgroup statistic a chart plots.
pub(crate) fn plotted_values(kind: ChartKind, stats: &SubgroupStatistics) -> Result<&[f64]> {
    match kind {
        ChartKind::Mean => Ok(&stats.means),
        ChartKind::Range => Ok(&stats.ranges),
        ChartKind::Proportion => {
            stats
                .proportions
                .as_deref()
                .ok_or(AnalysisError::InsufficientData {
                    what: "proportion chart (in-spec indicators)",
                    needed: 1,
                    available: 0,
                })
        }
    }
}

fn empirical(kind: ChartKind, values: &[f64]) -> Result<ControlLimits> {
    let insufficient = || AnalysisError::InsufficientData {
        what: match kind {
            ChartKind::Mean => "empirical mean-chart limits",
            ChartKind::Range => "empirical range-chart limits",
            ChartKind::Proportion => "empirical proportion-chart limits",
        },
        needed: 2,
        available: values.len(),
    };
    let cl = stats::mean(values).ok_or_else(insufficient)?;
    let sigma = stats::sample_std_dev(values).ok_or_else(insufficient)?;
    Ok(ControlLimits::symmetric(cl, SIGMA_MULTIPLIER * sigma))
}

fn constants_based(
    table: &ShewhartConstants,
    kind: ChartKind,
    stats: &SubgroupStatistics,
) -> Result<ControlLimits> {
    let none = |what| AnalysisError::InsufficientData {
        what,
        needed: 1,
        available: 0,
    };

    match kind {
        ChartKind::Mean | ChartKind::Range => {
            let factors = table.for_subgroup(stats.subgroup_size, stats.observations_per_subgroup)?;
            let r_bar = stats::mean(&stats.ranges).ok_or_else(|| none("average range"))?;
            if kind == ChartKind::Mean {
                let grand_mean = stats::mean(&stats.means).ok_or_else(|| none("grand mean"))?;
                Ok(ControlLimits::symmetric(grand_mean, factors.a2 * r_bar))
            } else {
                Ok(ControlLimits {
                    ucl: factors.d4 * r_bar,
                    cl: r_bar,
                    lcl: factors.d3 * r_bar,
                })
            }
        }
        ChartKind::Proportion => {
            let proportions = plotted_values(kind, stats)?;
            let p_bar = stats::mean(proportions).ok_or_else(|| none("average proportion"))?;
            let n_i = stats.indicators_per_subgroup as f64;
            let sigma = (p_bar * (1.0 - p_bar) / n_i).sqrt();
            Ok(ControlLimits::symmetric(p_bar, SIGMA_MULTIPLIER * sigma))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MeasurementRow, MeasurementTable};
    use crate::error::ErrorKind;
    use crate::spc::Subgrouper;

    fn stats_for(table: &MeasurementTable, n: usize) -> SubgroupStatistics {
        let p = Subgrouper::new(n).expect("valid").partition(table).expect("partition");
        SubgroupStatistics::from_subgroups(n, &p.subgroups).expect("stats")
    }

    fn three_batch_table() -> MeasurementTable {
        let data = [
            ([100.2, 99.8, 100.5], [true, true, true]),
            ([101.4, 100.1, 99.7], [false, true, true]),
            ([99.5, 100.0, 100.3], [true, true, true]),
            ([100.8, 98.7, 100.1], [true, false, true]),
            ([100.0, 100.4, 99.9], [true, true, true]),
            ([99.2, 100.6, 101.2], [true, true, false]),
        ];
        let rows = data
            .iter()
            .map(|(m, s)| MeasurementRow::new(m.to_vec(), s.to_vec()))
            .collect();
        MeasurementTable::new(
            vec!["Batch1".into(), "Batch2".into(), "Batch3".into()],
            vec!["Batch1_spec".into(), "Batch2_spec".into(), "Batch3_spec".into()],
            rows,
        )
        .expect("valid")
    }

    #[test]
    fn test_empirical_mean_chart_moments() {
        let table = MeasurementTable::from_series(&[1.0, 3.0, 5.0, 7.0]).expect("valid");
        let stats = stats_for(&table, 1);
        let limits = LimitStrategy::Empirical
            .compute(ChartKind::Mean, &stats)
            .expect("limits");
        // mean = 4, sample sd = sqrt(20/3)
        let sigma = (20.0_f64 / 3.0).sqrt();
        assert!((limits.cl - 4.0).abs() < 1e-12);
        assert!((limits.ucl - (4.0 + 3.0 * sigma)).abs() < 1e-12);
        assert!((limits.lcl - (4.0 - 3.0 * sigma)).abs() < 1e-12);
        assert!(limits.lcl < 0.0, "mean chart LCL is not floored");
    }

    #[test]
    fn test_empirical_range_chart_floored() {
        let table = three_batch_table();
        let stats = stats_for(&table, 1);
        let limits = LimitStrategy::Empirical
            .compute(ChartKind::Range, &stats)
            .expect("limits");
        assert!(limits.lcl >= 0.0);
        assert!(limits.ucl >= limits.cl && limits.cl >= limits.lcl);
        let cl = stats::mean(&stats.ranges).expect("mean");
        assert!((limits.cl - cl).abs() < 1e-12);
    }

    #[test]
    fn test_empirical_proportion_chart() {
        let table = three_batch_table();
        let stats = stats_for(&table, 1);
        let limits = LimitStrategy::Empirical
            .compute(ChartKind::Proportion, &stats)
            .expect("limits");
        // Proportions: 0, 1/3, 0, 1/3, 0, 1/3
        assert!((limits.cl - 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(limits.lcl, 0.0);
    }

    #[test]
    fn test_empirical_needs_two_subgroups() {
        let table = MeasurementTable::from_series(&[1.0, 2.0, 3.0]).expect("valid");
        let stats = stats_for(&table, 3);
        let err = LimitStrategy::Empirical
            .compute(ChartKind::Mean, &stats)
            .expect_err("one subgroup");
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
        assert!(matches!(
            err,
            AnalysisError::InsufficientData {
                needed: 2,
                available: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_constants_n3_matches_textbook() {
        // One row of three batches per subgroup: n = 3 observations.
        let table = three_batch_table();
        let stats = stats_for(&table, 1);
        assert_eq!(stats.observations_per_subgroup, 3);
        let strategy = LimitStrategy::constants();

        let xbar = strategy.compute(ChartKind::Mean, &stats).expect("xbar");
        let r = strategy.compute(ChartKind::Range, &stats).expect("r");
        let r_bar = stats::mean(&stats.ranges).expect("r-bar");
        let grand = stats::mean(&stats.means).expect("grand mean");

        assert!((xbar.cl - grand).abs() < 1e-12);
        assert!((xbar.ucl - (grand + 1.023 * r_bar)).abs() < 1e-12);
        assert!((xbar.lcl - (grand - 1.023 * r_bar)).abs() < 1e-12);
        assert!((r.cl - r_bar).abs() < 1e-12);
        assert!((r.ucl - 2.575 * r_bar).abs() < 1e-12);
        assert_eq!(r.lcl, 0.0);
    }

    #[test]
    fn test_constants_proportion_binomial_sigma() {
        let table = three_batch_table();
        let stats = stats_for(&table, 1);
        let p = LimitStrategy::constants()
            .compute(ChartKind::Proportion, &stats)
            .expect("p");
        let p_bar = 1.0 / 6.0;
        let sigma = (p_bar * (1.0 - p_bar) / 3.0_f64).sqrt();
        assert!((p.cl - p_bar).abs() < 1e-12);
        assert!((p.ucl - (p_bar + 3.0 * sigma)).abs() < 1e-12);
        assert_eq!(p.lcl, 0.0);
    }

    #[test]
    fn test_constants_works_with_single_subgroup() {
        let table = MeasurementTable::from_series(&[45.0, 47.0, 50.0, 53.0, 55.0]).expect("valid");
        let stats = stats_for(&table, 5);
        let limits = LimitStrategy::constants()
            .compute(ChartKind::Mean, &stats)
            .expect("limits");
        assert!((limits.cl - 50.0).abs() < 1e-12);
        assert!((limits.ucl - 55.77).abs() < 1e-9);
        assert!((limits.lcl - 44.23).abs() < 1e-9);
    }

    #[test]
    fn test_constants_unsupported_size() {
        let table = MeasurementTable::from_series(&[1.0, 2.0, 3.0, 4.0]).expect("valid");
        let stats = stats_for(&table, 1);
        let err = LimitStrategy::constants()
            .compute(ChartKind::Range, &stats)
            .expect_err("n=1 has no factors");
        assert_eq!(
            err,
            AnalysisError::UnsupportedSubgroupSize {
                subgroup_size: 1,
                observations: 1
            }
        );
    }

    #[test]
    fn test_constants_error_carries_configured_rows() {
        let rows = (0..8)
            .map(|i| MeasurementRow::measurements_only(vec![10.0 + i as f64, 11.0, 12.0]))
            .collect();
        let table = MeasurementTable::new(
            vec!["Batch1".into(), "Batch2".into(), "Batch3".into()],
            Vec::new(),
            rows,
        )
        .expect("valid");
        let stats = stats_for(&table, 4);
        let err = LimitStrategy::constants()
            .compute(ChartKind::Mean, &stats)
            .expect_err("12 observations per subgroup");
        assert_eq!(
            err,
            AnalysisError::UnsupportedSubgroupSize {
                subgroup_size: 4,
                observations: 12
            }
        );
    }

    #[test]
    fn test_proportion_without_indicators() {
        let table = MeasurementTable::from_series(&[1.0, 2.0, 3.0, 4.0]).expect("valid");
        let stats = stats_for(&table, 2);
        assert!(LimitStrategy::Empirical
            .compute(ChartKind::Proportion, &stats)
            .is_err());
    }

    #[test]
    fn test_policy_round_trip() {
        assert_eq!(
            LimitStrategy::from_policy(LimitPolicy::Constants).policy(),
            LimitPolicy::Constants
        );
        assert_eq!(LimitStrategy::from_policy(LimitPolicy::Empirical), LimitStrategy::Empirical);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::data::MeasurementTable;
    use crate::spc::Subgrouper;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn empirical_limits_symmetric_before_flooring(
            data in proptest::collection::vec(-1e3_f64..1e3, 4..=60),
            n in 1_usize..=4,
        ) {
            let table = MeasurementTable::from_series(&data).expect("finite");
            let p = Subgrouper::new(n).expect("n").partition(&table).expect("n <= len");
            let stats = SubgroupStatistics::from_subgroups(n, &p.subgroups).expect("stats");
            prop_assume!(stats.count() >= 2);

            let mean = LimitStrategy::Empirical.compute(ChartKind::Mean, &stats).expect("mean");
            let upper = mean.ucl - mean.cl;
            let lower = mean.cl - mean.lcl;
            prop_assert!((upper - lower).abs() <= 1e-9 * (1.0 + upper.abs()));

            let range = LimitStrategy::Empirical.compute(ChartKind::Range, &stats).expect("range");
            prop_assert!(range.lcl >= 0.0);
            prop_assert!(range.ucl >= range.cl && range.cl >= range.lcl);
        }

        #[test]
        fn constants_range_lcl_zero_when_d3_zero(
            data in proptest::collection::vec(0.0_f64..100.0, 12..=60),
            n in 2_usize..=6,
        ) {
            let table = MeasurementTable::from_series(&data).expect("finite");
            let p = Subgrouper::new(n).expect("n").partition(&table).expect("n <= len");
            let stats = SubgroupStatistics::from_subgroups(n, &p.subgroups).expect("stats");
            let r = LimitStrategy::constants().compute(ChartKind::Range, &stats).expect("range");
            prop_assert_eq!(r.lcl, 0.0);
            prop_assert!(r.ucl >= r.cl);
        }
    }
}
