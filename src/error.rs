//! Error types shared by every analysis stage.
//!
//! All failures are raised synchronously at the point of detection and carry
//! the offending values so the caller can correct the input immediately.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Coarse classification of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or incompatible parameters.
    Configuration,
    /// Too few subgroups or observations to estimate dispersion.
    InsufficientData,
    /// Empty, non-finite, or zero-variance group feeding a statistical test.
    DegenerateGroup,
    /// Zero-length input to segmentation.
    EmptySeries,
    /// Malformed tabular input or unserializable output.
    Input,
}

/// Errors produced by the control-chart and phase pipelines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("subgroup size {subgroup_size} exceeds available rows ({available}); no complete subgroup can be formed")]
    SubgroupSizeExceedsData { subgroup_size: usize, available: usize },

    #[error("no Shewhart constants tabulated for {observations} observations per subgroup (subgroup size {subgroup_size})")]
    UnsupportedSubgroupSize {
        subgroup_size: usize,
        observations: usize,
    },

    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("insufficient data for {what}: need {needed}, have {available}")]
    InsufficientData {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("degenerate group {group}: {reason}")]
    DegenerateGroup { group: usize, reason: String },

    #[error("zero variance in {what}")]
    ZeroVariance { what: &'static str },

    #[error("cannot segment an empty series")]
    EmptySeries,

    #[error("invalid input at line {line}: {message}")]
    InvalidInput { line: usize, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("report serialization failed: {0}")]
    Report(String),
}

impl AnalysisError {
    /// Maps the error onto the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SubgroupSizeExceedsData { .. }
            | Self::UnsupportedSubgroupSize { .. }
            | Self::InvalidParameter { .. }
            | Self::Config(_) => ErrorKind::Configuration,
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
            Self::DegenerateGroup { .. } | Self::ZeroVariance { .. } => ErrorKind::DegenerateGroup,
            Self::EmptySeries => ErrorKind::EmptySeries,
            Self::InvalidInput { .. } | Self::Report(_) => ErrorKind::Input,
        }
    }

    pub(crate) fn invalid_parameter(
        name: &'static str,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
