//! End-to-end analysis driven by an [`AnalysisConfig`].
//!
//! [`ProcessAnalyzer`] wires the pipelines together:
//!
//! ```text
//! table   → Subgrouper → SubgroupStatistics → LimitStrategy → ControlChartSet
//! weights → ChangePointDetector → segment → SignificanceTester → PhaseReport
//! ```
//!
//! Each call is a single-pass batch computation over immutable input and
//! fails on the first error.

use serde::Serialize;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::data::{MeasurementTable, WeightMatrix};
use crate::detection::{ChangePointDetector, ChangeSignal};
use crate::error::{AnalysisError, Result};
use crate::segmentation::{segment, PhaseSummary};
use crate::spc::{ControlChartSet, LimitStrategy, Subgrouper};
use crate::testing::{SignificanceReport, SignificanceTester};

/// Output of the phase pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseReport {
    pub signal: ChangeSignal,
    /// Boundary set including the 0 and series-length sentinels.
    pub boundaries: Vec<usize>,
    /// Candidates beyond the series, ignored.
    pub discarded: Vec<usize>,
    pub phases: Vec<PhaseSummary>,
    /// ANOVA (and post-hoc) across phases; `None` for a single phase.
    pub significance: Option<SignificanceReport>,
}

/// Comparison of the measurement columns of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnComparison {
    pub fields: Vec<String>,
    pub report: SignificanceReport,
}

/// Serializes any report to pretty-printed JSON.
pub fn to_json<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| AnalysisError::Report(e.to_string()))
}

/// Configured entry point for control-chart and phase analyses.
///
/// # Examples
///
/// ```
/// use u_stability::analyzer::ProcessAnalyzer;
/// use u_stability::config::AnalysisConfig;
/// use u_stability::data::MeasurementTable;
///
/// let mut config = AnalysisConfig::default();
/// config.control_chart.subgroup_size = 2;
/// let analyzer = ProcessAnalyzer::new(config).unwrap();
///
/// let table = MeasurementTable::from_series(&[10.0, 10.2, 9.9, 10.1, 10.3, 9.8, 10.0, 10.1]).unwrap();
/// let charts = analyzer.control_charts(&table).unwrap();
/// assert_eq!(charts.subgroup_count, 4);
/// ```
#[derive(Debug, Clone)]
pub struct ProcessAnalyzer {
    config: AnalysisConfig,
    strategy: LimitStrategy,
    detector: ChangePointDetector,
    tester: SignificanceTester,
}

impl ProcessAnalyzer {
    /// Validates `config` and builds the pipeline stages.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let strategy = LimitStrategy::from_policy(config.control_chart.policy);
        let detector = ChangePointDetector::from_config(&config.phases)?;
        let tester = SignificanceTester::new(config.significance.alpha)?;
        Ok(Self {
            config,
            strategy,
            detector,
            tester,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Mean, range and proportion charts for `table`.
    ///
    /// When the configuration carries a specification and the table has no
    /// indicator columns, in-spec flags are derived from the specification.
    ///
    /// # Errors
    ///
    /// Subgrouping and limit errors of [`ControlChartSet::compute`].
    pub fn control_charts(&self, table: &MeasurementTable) -> Result<ControlChartSet> {
        let subgrouper = Subgrouper::new(self.config.control_chart.subgroup_size)?;
        let charts = match &self.config.specification {
            Some(spec) if !table.has_indicators() => {
                let flagged = table.clone().with_specification(&spec.limits());
                ControlChartSet::compute(&flagged, subgrouper, &self.strategy)?
            }
            _ => ControlChartSet::compute(table, subgrouper, &self.strategy)?,
        };

        info!(
            rows = table.len(),
            subgroup_size = charts.subgroup_size,
            subgroups = charts.subgroup_count,
            policy = ?self.strategy.policy(),
            out_of_control = charts.charts().map(|c| c.out_of_control().len()).sum::<usize>(),
            "control charts computed"
        );
        Ok(charts)
    }

    /// Detects phases in `series` from `weights` and tests phase means.
    ///
    /// Row `t` of `weights` is aligned with `series[t]`.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::EmptySeries`] for an empty series.
    /// - [`AnalysisError::InsufficientData`] for fewer than 3 weight rows.
    /// - Errors of the significance test when there are two or more phases.
    pub fn phases(&self, series: &[f64], weights: &WeightMatrix) -> Result<PhaseReport> {
        if series.is_empty() {
            return Err(AnalysisError::EmptySeries);
        }
        let signal = self.detector.signal(weights)?;
        let segmentation = segment(series, &signal.candidates)?;

        let significance = if segmentation.phases.len() >= 2 {
            Some(self.tester.test(&segmentation.groups())?)
        } else {
            None
        };

        info!(
            series_len = series.len(),
            threshold = signal.threshold,
            phases = segmentation.phases.len(),
            significant = significance.as_ref().map_or(false, |s| s.is_significant()),
            "phase analysis complete"
        );

        Ok(PhaseReport {
            boundaries: segmentation.boundaries.clone(),
            discarded: segmentation.discarded.clone(),
            phases: segmentation.summaries(),
            significance,
            signal,
        })
    }

    /// ANOVA and, when significant, Tukey–Kramer over arbitrary groups.
    pub fn compare_groups(&self, groups: &[&[f64]]) -> Result<SignificanceReport> {
        let report = self.tester.test(groups)?;
        info!(
            groups = groups.len(),
            p = report.anova.p_value,
            post_hoc = report.post_hoc.is_some(),
            "group comparison complete"
        );
        Ok(report)
    }

    /// Compares the measurement columns of `table` as groups.
    pub fn compare_columns(&self, table: &MeasurementTable) -> Result<ColumnComparison> {
        let columns = table.columns();
        let groups: Vec<&[f64]> = columns.iter().map(Vec::as_slice).collect();
        Ok(ColumnComparison {
            fields: table.measurement_fields().to_vec(),
            report: self.compare_groups(&groups)?,
        })
    }
}
