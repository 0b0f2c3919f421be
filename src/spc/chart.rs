//! Core control chart types.
//!
//! Defines the building blocks shared by every chart: control limits, chart
//! points with out-of-control annotations, and the computed [`ControlChart`]
//! record handed to renderers.
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587 — Standard Practice for Use of Control Charts

use serde::Serialize;

use crate::config::LimitPolicy;

/// Control limits for a chart.
///
/// Represents the upper control limit (UCL), center line (CL), and lower
/// control limit (LCL) computed from the process data.
///
/// # Invariants
///
/// - `lcl <= cl <= ucl`
/// - `lcl >= 0` for charts whose statistic cannot be negative
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlLimits {
    /// Upper control limit.
    pub ucl: f64,
    /// Center line.
    pub cl: f64,
    /// Lower control limit.
    pub lcl: f64,
}

impl ControlLimits {
    /// Symmetric limits `cl ± width`.
    pub(crate) fn symmetric(cl: f64, width: f64) -> Self {
        Self {
            ucl: cl + width,
            cl,
            lcl: cl - width,
        }
    }

    /// Clamps the lower limit at zero.
    pub(crate) fn floored(self) -> Self {
        Self {
            lcl: self.lcl.max(0.0),
            ..self
        }
    }

    /// Whether `value` lies outside `[lcl, ucl]`.
    pub fn is_beyond(&self, value: f64) -> bool {
        value > self.ucl || value < self.lcl
    }
}

/// Which statistic a chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Subgroup means (X-bar chart).
    Mean,
    /// Subgroup ranges (R chart).
    Range,
    /// Subgroup defect proportions (P chart).
    Proportion,
}

impl ChartKind {
    /// Whether the plotted statistic is bounded below by zero.
    pub fn is_non_negative(self) -> bool {
        matches!(self, Self::Range | Self::Proportion)
    }
}

/// A single point on a control chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// The zero-based subgroup index.
    pub index: usize,
    /// The plotted statistic (subgroup mean, range, or proportion).
    pub value: f64,
    /// Whether the point falls outside the control limits.
    pub beyond_limits: bool,
}

/// A computed control chart: limits plus the per-subgroup statistic sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlChart {
    pub kind: ChartKind,
    pub policy: LimitPolicy,
    pub limits: ControlLimits,
    pub points: Vec<ChartPoint>,
}

impl ControlChart {
    pub(crate) fn new(
        kind: ChartKind,
        policy: LimitPolicy,
        limits: ControlLimits,
        values: &[f64],
    ) -> Self {
        let points = values
            .iter()
            .enumerate()
            .map(|(index, &value)| ChartPoint {
                index,
                value,
                beyond_limits: limits.is_beyond(value),
            })
            .collect();
        Self {
            kind,
            policy,
            limits,
            points,
        }
    }

    /// The plotted statistic values, in subgroup order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Indices of points outside the control limits.
    pub fn out_of_control(&self) -> Vec<usize> {
        self.points
            .iter()
            .filter(|p| p.beyond_limits)
            .map(|p| p.index)
            .collect()
    }

    /// Check if the process is in statistical control.
    pub fn is_in_control(&self) -> bool {
        self.points.iter().all(|p| !p.beyond_limits)
    }
}
