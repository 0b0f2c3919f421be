//! Analysis configuration.
//!
//! Every option has a default, so an empty TOML document is a valid
//! configuration. Values are checked by [`AnalysisConfig::validate`] before
//! any analysis runs.
//!
//! ```toml
//! [control_chart]
//! subgroup_size = 1
//! policy = "empirical"     # or "constants"
//!
//! [specification]
//! target = 100.0
//! tolerance = 1.0
//!
//! [phases]
//! smoothing_window = 10
//! threshold_multiplier = 2.0
//! # merge_distance = 10
//!
//! [significance]
//! alpha = 0.05
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::SpecificationLimits;
use crate::error::{AnalysisError, Result};

/// Control-limit estimation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitPolicy {
    /// CL ± 3 sample standard deviations of the plotted statistic.
    #[default]
    Empirical,
    /// Classical Shewhart A2/D3/D4 factors.
    #[serde(alias = "constants_based", alias = "shewhart")]
    Constants,
}

/// `[control_chart]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlChartConfig {
    /// Number of consecutive rows per subgroup.
    pub subgroup_size: usize,
    pub policy: LimitPolicy,
}

impl Default for ControlChartConfig {
    fn default() -> Self {
        Self {
            subgroup_size: 1,
            policy: LimitPolicy::Empirical,
        }
    }
}

/// `[specification]` section: nominal target and symmetric tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationConfig {
    pub target: f64,
    pub tolerance: f64,
}

impl SpecificationConfig {
    /// Converts to the `[target - tolerance, target + tolerance]` predicate.
    pub fn limits(&self) -> SpecificationLimits {
        SpecificationLimits::from_target(self.target, self.tolerance)
    }
}

/// `[phases]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Centered moving-average window applied to the change signal.
    pub smoothing_window: usize,
    /// Threshold = median + `threshold_multiplier` × std of the smoothed signal.
    pub threshold_multiplier: f64,
    /// Candidates closer than this to the previously kept one are merged.
    /// `None` keeps every index above threshold.
    pub merge_distance: Option<usize>,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 10,
            threshold_multiplier: 2.0,
            merge_distance: None,
        }
    }
}

/// `[significance]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignificanceConfig {
    /// Family-wise significance level.
    pub alpha: f64,
}

impl Default for SignificanceConfig {
    fn default() -> Self {
        Self { alpha: 0.05 }
    }
}

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub control_chart: ControlChartConfig,
    pub specification: Option<SpecificationConfig>,
    pub phases: PhaseConfig,
    pub significance: SignificanceConfig,
}

impl AnalysisConfig {
    /// Parses a TOML document and validates it.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Serializes back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AnalysisError::Config(e.to_string()))
    }

    /// Checks every range constraint.
    ///
    /// A single violation is reported as [`AnalysisError::InvalidParameter`];
    /// several are joined into one [`AnalysisError::Config`].
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.control_chart.subgroup_size == 0 {
            errors.push(AnalysisError::invalid_parameter(
                "control_chart.subgroup_size",
                0,
                "must be at least 1",
            ));
        }
        if let Some(spec) = &self.specification {
            if !spec.target.is_finite() {
                errors.push(AnalysisError::invalid_parameter(
                    "specification.target",
                    spec.target,
                    "must be finite",
                ));
            }
            if !spec.tolerance.is_finite() || spec.tolerance < 0.0 {
                errors.push(AnalysisError::invalid_parameter(
                    "specification.tolerance",
                    spec.tolerance,
                    "must be finite and non-negative",
                ));
            }
        }
        if self.phases.smoothing_window == 0 {
            errors.push(AnalysisError::invalid_parameter(
                "phases.smoothing_window",
                0,
                "must be at least 1",
            ));
        }
        let m = self.phases.threshold_multiplier;
        if !m.is_finite() || m < 0.0 {
            errors.push(AnalysisError::invalid_parameter(
                "phases.threshold_multiplier",
                m,
                "must be finite and non-negative",
            ));
        }
        let alpha = self.significance.alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            errors.push(AnalysisError::invalid_parameter(
                "significance.alpha",
                alpha,
                "must lie strictly between 0 and 1",
            ));
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(AnalysisError::Config(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = AnalysisConfig::from_toml_str("").expect("empty TOML should parse");
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.control_chart.subgroup_size, 1);
        assert_eq!(config.control_chart.policy, LimitPolicy::Empirical);
        assert_eq!(config.phases.smoothing_window, 10);
        assert!((config.phases.threshold_multiplier - 2.0).abs() < f64::EPSILON);
        assert!(config.phases.merge_distance.is_none());
        assert!((config.significance.alpha - 0.05).abs() < f64::EPSILON);
        assert!(config.specification.is_none());
    }

    #[test]
    fn test_full_toml() {
        let toml = r#"
            [control_chart]
            subgroup_size = 3
            policy = "constants"

            [specification]
            target = 100.0
            tolerance = 1.0

            [phases]
            smoothing_window = 5
            threshold_multiplier = 3.0
            merge_distance = 5

            [significance]
            alpha = 0.01
        "#;
        let config = AnalysisConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.control_chart.subgroup_size, 3);
        assert_eq!(config.control_chart.policy, LimitPolicy::Constants);
        assert_eq!(config.phases.merge_distance, Some(5));
        let limits = config.specification.expect("spec").limits();
        assert!(limits.contains(99.0));
        assert!(limits.contains(101.0));
        assert!(!limits.contains(101.01));
    }

    #[test]
    fn test_rejects_zero_subgroup_size() {
        let err = AnalysisConfig::from_toml_str("[control_chart]\nsubgroup_size = 0")
            .expect_err("should reject");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("subgroup_size"), "{err}");
    }

    #[test]
    fn test_rejects_alpha_out_of_range() {
        let err = AnalysisConfig::from_toml_str("[significance]\nalpha = 1.5")
            .expect_err("should reject");
        assert!(matches!(err, AnalysisError::InvalidParameter { name: "significance.alpha", .. }));
    }

    #[test]
    fn test_multiple_violations_are_joined() {
        let toml = "[phases]\nsmoothing_window = 0\n[significance]\nalpha = 0.0";
        let err = AnalysisConfig::from_toml_str(toml).expect_err("should reject");
        let msg = err.to_string();
        assert!(msg.contains("smoothing_window"), "{msg}");
        assert!(msg.contains("alpha"), "{msg}");
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        let err = AnalysisConfig::from_toml_str("[control_chart]\npolicy = \"bayesian\"")
            .expect_err("should reject");
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn test_load_from_file_and_round_trip() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[control_chart]\nsubgroup_size = 2\npolicy = \"constants\"")
            .expect("write");
        let config = AnalysisConfig::load_from_file(file.path()).expect("should load");
        assert_eq!(config.control_chart.subgroup_size, 2);

        let text = config.to_toml().expect("serialize");
        let reparsed = AnalysisConfig::from_toml_str(&text).expect("reparse");
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_missing_file() {
        let err = AnalysisConfig::load_from_file(Path::new("/nonexistent/u-stability.toml"))
            .expect_err("missing file");
        assert!(matches!(err, AnalysisError::Config(_)));
    }
}
