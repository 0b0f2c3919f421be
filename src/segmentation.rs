//! Phase segmentation of a series at change-point boundaries.
//!
//! The boundary set is `{0} ∪ candidates ∪ {L}`, sorted and deduplicated;
//! every pair of adjacent boundaries delimits one phase. Phases are borrowed
//! slices of the input, so concatenating them reproduces the series exactly.
//!
//! # Examples
//!
//! ```
//! use u_stability::segmentation::segment;
//!
//! let series = [1.0, 1.1, 0.9, 5.0, 5.2, 4.8, 5.1];
//! let seg = segment(&series, &[3]).unwrap();
//! assert_eq!(seg.boundaries, vec![0, 3, 7]);
//! assert_eq!(seg.phases.len(), 2);
//! assert_eq!(seg.phases[1].values, &[5.0, 5.2, 4.8, 5.1]);
//! ```

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::stats;

/// A contiguous slice `[start, end)` of the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phase<'a> {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub values: &'a [f64],
}

impl Phase<'_> {
    /// Number of observations (always at least 1).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean of the phase, `None` if it contains non-finite values.
    pub fn mean(&self) -> Option<f64> {
        stats::mean(self.values)
    }

    pub fn summary(&self) -> PhaseSummary {
        PhaseSummary {
            index: self.index,
            start: self.start,
            end: self.end,
            count: self.len(),
            mean: self.mean().unwrap_or(f64::NAN),
        }
    }
}

/// Owned per-phase `{count, mean}` record for reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseSummary {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub count: usize,
    pub mean: f64,
}

/// Boundaries and the phases they delimit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segmentation<'a> {
    /// Strictly increasing, first 0, last the series length.
    pub boundaries: Vec<usize>,
    pub phases: Vec<Phase<'a>>,
    /// Candidates at or beyond the series length, ignored.
    pub discarded: Vec<usize>,
}

impl<'a> Segmentation<'a> {
    /// Phase values as test groups.
    pub fn groups(&self) -> Vec<&'a [f64]> {
        self.phases.iter().map(|p| p.values).collect()
    }

    pub fn summaries(&self) -> Vec<PhaseSummary> {
        self.phases.iter().map(Phase::summary).collect()
    }
}

/// Builds the sorted, deduplicated boundary set for a series of length `len`.
///
/// Returns the boundaries and the candidates discarded as out of range.
pub fn boundary_set(len: usize, candidates: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let (inside, discarded): (Vec<usize>, Vec<usize>) =
        candidates.iter().partition(|&&c| c < len);

    let mut boundaries = Vec::with_capacity(inside.len() + 2);
    boundaries.push(0);
    boundaries.extend(inside);
    boundaries.push(len);
    boundaries.sort_unstable();
    boundaries.dedup();
    (boundaries, discarded)
}

/// Slices `series` into contiguous phases at `candidates`.
///
/// Candidates may be unsorted and may repeat. A candidate of 0 coincides
/// with the start sentinel; candidates `>= series.len()` are discarded with
/// a warning. No candidates yields a single phase.
///
/// # Errors
///
/// [`AnalysisError::EmptySeries`] if `series` is empty.
pub fn segment<'a>(series: &'a [f64], candidates: &[usize]) -> Result<Segmentation<'a>> {
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }

    let (boundaries, discarded) = boundary_set(series.len(), candidates);
    if !discarded.is_empty() {
        warn!(
            series_len = series.len(),
            discarded = ?discarded,
            "boundary candidates beyond the series are ignored"
        );
    }

    let phases: Vec<Phase<'a>> = boundaries
        .windows(2)
        .enumerate()
        .map(|(index, pair)| Phase {
            index,
            start: pair[0],
            end: pair[1],
            values: &series[pair[0]..pair[1]],
        })
        .collect();

    debug!(
        series_len = series.len(),
        boundaries = boundaries.len(),
        phases = phases.len(),
        "segmented series"
    );

    Ok(Segmentation {
        boundaries,
        phases,
        discarded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_phase_without_candidates() {
        let series = [1.0, 2.0, 3.0];
        let seg = segment(&series, &[]).expect("valid");
        assert_eq!(seg.boundaries, vec![0, 3]);
        assert_eq!(seg.phases.len(), 1);
        assert_eq!(seg.phases[0].values, &series[..]);
    }

    #[test]
    fn test_unsorted_duplicate_candidates() {
        let series: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let seg = segment(&series, &[6, 2, 6, 0]).expect("valid");
        assert_eq!(seg.boundaries, vec![0, 2, 6, 10]);
        let lens: Vec<usize> = seg.phases.iter().map(Phase::len).collect();
        assert_eq!(lens, vec![2, 4, 4]);
    }

    #[test]
    fn test_adjacent_candidates_make_single_element_phases() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0];
        let seg = segment(&series, &[2, 3]).expect("valid");
        assert_eq!(seg.boundaries, vec![0, 2, 3, 5]);
        assert_eq!(seg.phases[1].values, &[3.0]);
    }

    #[test]
    fn test_out_of_range_candidates_discarded() {
        let series = [1.0, 2.0, 3.0];
        let seg = segment(&series, &[1, 3, 7]).expect("valid");
        assert_eq!(seg.boundaries, vec![0, 1, 3]);
        assert_eq!(seg.discarded, vec![3, 7]);
    }

    #[test]
    fn test_empty_series() {
        assert_eq!(segment(&[], &[1]), Err(AnalysisError::EmptySeries));
    }

    #[test]
    fn test_summaries() {
        let series = [1.0, 3.0, 10.0, 20.0];
        let seg = segment(&series, &[2]).expect("valid");
        let s = seg.summaries();
        assert_eq!(s[0].count, 2);
        assert!((s[0].mean - 2.0).abs() < 1e-12);
        assert_eq!((s[1].start, s[1].end), (2, 4));
        assert!((s[1].mean - 15.0).abs() < 1e-12);
        assert_eq!(seg.groups(), vec![&series[..2], &series[2..]]);
    }
}
