//! Shewhart control chart factor table (A2, D3, D4).
//!
//! The table is an explicit immutable value handed to the constants-based
//! limit strategy at construction, keyed by the number of observations per
//! subgroup.
//!
//! # Reference
//!
//! ASTM E2587 — Standard Practice for Use of Control Charts in Statistical
//! Process Control.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{AnalysisError, Result};

/// Factors for one subgroup size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShewhartFactors {
    /// X-bar chart: UCL/LCL = X-double-bar ± A2 · R-bar.
    pub a2: f64,
    /// R chart: LCL = D3 · R-bar.
    pub d3: f64,
    /// R chart: UCL = D4 · R-bar.
    pub d4: f64,
}

// Index 0 corresponds to n=2.
const A2: [f64; 9] = [1.880, 1.023, 0.729, 0.577, 0.483, 0.419, 0.373, 0.337, 0.308];
const D3: [f64; 9] = [0.0, 0.0, 0.0, 0.0, 0.0, 0.076, 0.136, 0.184, 0.223];
const D4: [f64; 9] = [3.267, 2.575, 2.282, 2.114, 2.004, 1.924, 1.864, 1.816, 1.777];

/// Lookup table of [`ShewhartFactors`] by subgroup size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShewhartConstants {
    table: BTreeMap<usize, ShewhartFactors>,
}

impl ShewhartConstants {
    /// The ASTM E2587 table for subgroup sizes 2..=10.
    pub fn astm() -> Self {
        let table = (0..A2.len())
            .map(|i| {
                (
                    i + 2,
                    ShewhartFactors {
                        a2: A2[i],
                        d3: D3[i],
                        d4: D4[i],
                    },
                )
            })
            .collect();
        Self { table }
    }

    /// A custom table.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidParameter`] for a subgroup size below 2 or a
    /// negative / non-finite factor.
    pub fn from_entries(entries: impl IntoIterator<Item = (usize, ShewhartFactors)>) -> Result<Self> {
        let mut table = BTreeMap::new();
        for (n, f) in entries {
            if n < 2 {
                return Err(AnalysisError::invalid_parameter(
                    "subgroup_size",
                    n,
                    "Shewhart factors need at least 2 observations per subgroup",
                ));
            }
            if [f.a2, f.d3, f.d4].iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(AnalysisError::invalid_parameter(
                    "shewhart_factors",
                    format!("{f:?}"),
                    "factors must be finite and non-negative",
                ));
            }
            table.insert(n, f);
        }
        Ok(Self { table })
    }

    /// Factors for subgroups of `observations` values.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::UnsupportedSubgroupSize`] if not tabulated.
    pub fn get(&self, observations: usize) -> Result<ShewhartFactors> {
        self.for_subgroup(observations, observations)
    }

    /// Factors for subgroups of `subgroup_size` rows holding `observations`
    /// values in total. The lookup is keyed by `observations`; both counts
    /// are reported on failure.
    pub fn for_subgroup(&self, subgroup_size: usize, observations: usize) -> Result<ShewhartFactors> {
        self.table
            .get(&observations)
            .copied()
            .ok_or(AnalysisError::UnsupportedSubgroupSize {
                subgroup_size,
                observations,
            })
    }

    /// Tabulated subgroup sizes, ascending.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.table.keys().copied()
    }
}

impl Default for ShewhartConstants {
    fn default() -> Self {
        Self::astm()
    }
}
