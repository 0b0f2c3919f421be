//! Mean, range, and proportion charts computed together from one table.

use serde::Serialize;
use tracing::debug;

use crate::data::MeasurementTable;
use crate::error::Result;

use super::chart::{ChartKind, ControlChart};
use super::limits::{plotted_values, LimitStrategy};
use super::subgroup::{SubgroupStatistics, Subgrouper};

/// The X-bar, R and (when indicators exist) P charts of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlChartSet {
    /// Rows per subgroup.
    pub subgroup_size: usize,
    /// Number of complete subgroups.
    pub subgroup_count: usize,
    /// Trailing rows that did not fill a subgroup.
    pub dropped_rows: usize,
    pub mean: ControlChart,
    pub range: ControlChart,
    /// Present only when the table carries in-spec indicators.
    pub proportion: Option<ControlChart>,
}

impl ControlChartSet {
    /// Subgroups `table` and computes every applicable chart.
    ///
    /// Fails fast: a subgrouping error prevents any chart from being
    /// computed, and the first chart error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_stability::data::MeasurementTable;
    /// use u_stability::spc::{ControlChartSet, LimitStrategy, Subgrouper};
    ///
    /// let table = MeasurementTable::from_series(&[10.0, 10.4, 9.8, 10.1, 9.9, 10.3, 10.0, 9.7]).unwrap();
    /// let charts = ControlChartSet::compute(&table, Subgrouper::new(2).unwrap(), &LimitStrategy::Empirical).unwrap();
    /// assert_eq!(charts.subgroup_count, 4);
    /// assert!(charts.proportion.is_none());
    /// assert!(charts.range.limits.lcl >= 0.0);
    /// ```
    pub fn compute(
        table: &MeasurementTable,
        subgrouper: Subgrouper,
        strategy: &LimitStrategy,
    ) -> Result<Self> {
        let partition = subgrouper.partition(table)?;
        let stats = SubgroupStatistics::from_subgroups(subgrouper.subgroup_size(), &partition.subgroups)?;

        let chart = |kind: ChartKind| -> Result<ControlChart> {
            let limits = strategy.compute(kind, &stats)?;
            debug!(
                chart = ?kind,
                policy = ?strategy.policy(),
                cl = limits.cl,
                ucl = limits.ucl,
                lcl = limits.lcl,
                "computed control limits"
            );
            Ok(ControlChart::new(
                kind,
                strategy.policy(),
                limits,
                plotted_values(kind, &stats)?,
            ))
        };

        let mean = chart(ChartKind::Mean)?;
        let range = chart(ChartKind::Range)?;
        let proportion = if stats.proportions.is_some() {
            Some(chart(ChartKind::Proportion)?)
        } else {
            None
        };

        Ok(Self {
            subgroup_size: subgrouper.subgroup_size(),
            subgroup_count: stats.count(),
            dropped_rows: partition.dropped_rows,
            mean,
            range,
            proportion,
        })
    }

    /// All computed charts.
    pub fn charts(&self) -> impl Iterator<Item = &ControlChart> {
        [Some(&self.mean), Some(&self.range), self.proportion.as_ref()]
            .into_iter()
            .flatten()
    }
}
