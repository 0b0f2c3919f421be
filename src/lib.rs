//! # u-stability
//!
//! Statistical process control and phase-stability analysis for
//! manufacturing measurement streams.
//!
//! Two pipelines share one data model. The control-chart pipeline cuts a
//! time-ordered measurement table into subgroups and computes X-bar, R and P
//! chart limits under an empirical or a Shewhart-constants policy. The phase
//! pipeline detects structural breaks in an auxiliary weight matrix, slices
//! the measurement series into phases at those breaks, and tests whether
//! phase means differ (one-way ANOVA, then Tukey–Kramer HSD).
//!
//! ## Modules
//!
//! - [`spc`] — Subgrouping, control limits (empirical / A2-D3-D4), X-bar, R and P charts
//! - [`detection`] — Change-point detection on a smoothed rate-of-change signal
//! - [`segmentation`] — Phase boundaries and contiguous phases
//! - [`testing`] — ANOVA, Tukey–Kramer HSD, Welch t-test
//! - [`distribution`] — F, Student t and studentized range distributions
//! - [`stats`] — Descriptive statistics
//! - [`data`] / [`input`] — Measurement tables, weight matrices, delimited-text parsing
//! - [`config`] — TOML analysis configuration
//! - [`analyzer`] — Configured end-to-end entry point
//!
//! ## Example
//!
//! ```
//! use u_stability::analyzer::ProcessAnalyzer;
//! use u_stability::config::AnalysisConfig;
//! use u_stability::input::parse_measurement_table;
//!
//! let text = "Batch1;Batch2;Batch1_spec;Batch2_spec\n\
//!             100.1;99.8;1;1\n\
//!             100.3;100.0;1;1\n\
//!             99.9;101.2;1;0\n\
//!             100.0;100.2;1;1\n";
//! let table = parse_measurement_table(text, ';').unwrap();
//!
//! let mut config = AnalysisConfig::default();
//! config.control_chart.subgroup_size = 2;
//! let charts = ProcessAnalyzer::new(config).unwrap().control_charts(&table).unwrap();
//! assert_eq!(charts.subgroup_count, 2);
//! assert!(charts.proportion.is_some());
//! ```

pub mod analyzer;
pub mod config;
pub mod data;
pub mod detection;
pub mod distribution;
pub mod error;
pub mod input;
pub mod segmentation;
pub mod spc;
pub mod stats;
pub mod testing;

pub use error::{AnalysisError, ErrorKind, Result};
