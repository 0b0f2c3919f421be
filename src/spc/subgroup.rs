//! Rational subgrouping of a time-ordered measurement table.
//!
//! A table of `k` rows is cut into `g = floor(k / n)` contiguous subgroups of
//! exactly `n` rows; the trailing `k mod n` rows are dropped. Every numeric
//! value of every row in a subgroup contributes to its statistics, so a
//! subgroup of `n` rows over `m` measurement fields holds `n * m` observations.

use serde::Serialize;
use tracing::{debug, warn};

use crate::data::{MeasurementRow, MeasurementTable};
use crate::error::{AnalysisError, Result};
use crate::stats;

/// A contiguous run of rows treated as one sampling unit.
#[derive(Debug, Clone, Copy)]
pub struct Subgroup<'a> {
    index: usize,
    rows: &'a [MeasurementRow],
}

impl<'a> Subgroup<'a> {
    /// Zero-based position of the subgroup.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The rows in this subgroup.
    pub fn rows(&self) -> &'a [MeasurementRow] {
        self.rows
    }

    /// All measurement values, row-major.
    pub fn values(&self) -> Vec<f64> {
        self.rows
            .iter()
            .flat_map(|r| r.measurements.iter().copied())
            .collect()
    }

    /// Number of measurement values.
    pub fn observation_count(&self) -> usize {
        self.rows.iter().map(|r| r.measurements.len()).sum()
    }

    /// Number of in-spec indicator values.
    pub fn indicator_count(&self) -> usize {
        self.rows.iter().map(|r| r.in_spec.len()).sum()
    }

    /// Number of indicators flagged in-spec.
    pub fn in_spec_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.in_spec.iter())
            .filter(|&&ok| ok)
            .count()
    }

    /// Mean of all measurement values.
    pub fn mean(&self) -> Option<f64> {
        stats::mean(&self.values())
    }

    /// Range (max - min) over all measurement values.
    pub fn range(&self) -> Option<f64> {
        stats::range(&self.values())
    }

    /// Defect proportion: 1 minus the in-spec fraction.
    ///
    /// `None` when the rows carry no indicators.
    pub fn defect_proportion(&self) -> Option<f64> {
        let total = self.indicator_count();
        if total == 0 {
            return None;
        }
        Some(1.0 - self.in_spec_count() as f64 / total as f64)
    }
}

/// Per-subgroup statistics feeding the limit calculator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubgroupStatistics {
    /// Rows per subgroup.
    pub subgroup_size: usize,
    /// Measurement values per subgroup (rows × measurement fields).
    pub observations_per_subgroup: usize,
    /// Indicator values per subgroup (rows × indicator fields).
    pub indicators_per_subgroup: usize,
    pub means: Vec<f64>,
    pub ranges: Vec<f64>,
    /// Defect proportions; `None` when the table has no indicators.
    pub proportions: Option<Vec<f64>>,
}

impl SubgroupStatistics {
    /// Number of subgroups.
    pub fn count(&self) -> usize {
        self.means.len()
    }

    /// Computes means, ranges and (if available) proportions.
    pub fn from_subgroups(subgroup_size: usize, subgroups: &[Subgroup<'_>]) -> Result<Self> {
        let first = subgroups.first().ok_or(AnalysisError::InsufficientData {
            what: "subgroup statistics",
            needed: 1,
            available: 0,
        })?;

        let mut means = Vec::with_capacity(subgroups.len());
        let mut ranges = Vec::with_capacity(subgroups.len());
        for sg in subgroups {
            let degenerate = || AnalysisError::DegenerateGroup {
                group: sg.index(),
                reason: "subgroup has no finite measurements".into(),
            };
            means.push(sg.mean().ok_or_else(degenerate)?);
            ranges.push(sg.range().ok_or_else(degenerate)?);
        }
        let proportions = subgroups
            .iter()
            .map(Subgroup::defect_proportion)
            .collect::<Option<Vec<f64>>>();

        Ok(Self {
            subgroup_size,
            observations_per_subgroup: first.observation_count(),
            indicators_per_subgroup: first.indicator_count(),
            means,
            ranges,
            proportions,
        })
    }
}

/// Result of partitioning a table.
#[derive(Debug, Clone)]
pub struct SubgroupPartition<'a> {
    pub subgroups: Vec<Subgroup<'a>>,
    /// Trailing rows that did not fill a complete subgroup.
    pub dropped_rows: usize,
}

/// Partitions a table into fixed-size contiguous subgroups.
///
/// # Examples
///
/// ```
/// use u_stability::data::MeasurementTable;
/// use u_stability::spc::Subgrouper;
///
/// let table = MeasurementTable::from_series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]).unwrap();
/// let partition = Subgrouper::new(3).unwrap().partition(&table).unwrap();
/// assert_eq!(partition.subgroups.len(), 2);
/// assert_eq!(partition.dropped_rows, 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Subgrouper {
    subgroup_size: usize,
}

impl Subgrouper {
    /// Creates a subgrouper for `subgroup_size` rows per subgroup.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] if `subgroup_size == 0`.
    pub fn new(subgroup_size: usize) -> Result<Self> {
        if subgroup_size == 0 {
            return Err(AnalysisError::invalid_parameter(
                "subgroup_size",
                0,
                "must be at least 1",
            ));
        }
        Ok(Self { subgroup_size })
    }

    pub fn subgroup_size(&self) -> usize {
        self.subgroup_size
    }

    /// Splits `table` into `floor(k / n)` subgroups.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::SubgroupSizeExceedsData`] if the subgroup size is
    /// larger than the number of rows.
    pub fn partition<'a>(&self, table: &'a MeasurementTable) -> Result<SubgroupPartition<'a>> {
        let rows = table.rows();
        let n = self.subgroup_size;
        if n > rows.len() {
            return Err(AnalysisError::SubgroupSizeExceedsData {
                subgroup_size: n,
                available: rows.len(),
            });
        }

        let subgroups: Vec<Subgroup<'a>> = rows
            .chunks_exact(n)
            .enumerate()
            .map(|(index, rows)| Subgroup { index, rows })
            .collect();
        let dropped_rows = rows.len() % n;

        if dropped_rows > 0 {
            warn!(
                subgroup_size = n,
                dropped_rows, "trailing rows do not fill a subgroup and are ignored"
            );
        }
        debug!(
            subgroup_size = n,
            subgroups = subgroups.len(),
            rows = rows.len(),
            "partitioned table into subgroups"
        );

        Ok(SubgroupPartition {
            subgroups,
            dropped_rows,
        })
    }
}
