//! Statistical Process Control (SPC) charts.
//!
//! A time-ordered measurement table is cut into fixed-size subgroups
//! ([`Subgrouper`]); per-subgroup means, ranges and defect proportions are
//! plotted on X-bar, R and P charts whose limits come from a
//! [`LimitStrategy`].
//!
//! # Limit strategies
//!
//! - [`LimitStrategy::Empirical`] — CL ± 3 sample standard deviations of the plotted statistic
//! - [`LimitStrategy::ConstantsBased`] — Shewhart A2/D3/D4 factors ([`ShewhartConstants`])
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587 — Standard Practice for Use of Control Charts

mod chart;
mod chart_set;
mod factors;
mod limits;
mod subgroup;

pub use chart::{ChartKind, ChartPoint, ControlChart, ControlLimits};
pub use chart_set::ControlChartSet;
pub use factors::{ShewhartConstants, ShewhartFactors};
pub use limits::LimitStrategy;
pub use subgroup::{Subgroup, SubgroupPartition, SubgroupStatistics, Subgrouper};
