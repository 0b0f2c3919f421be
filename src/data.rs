//! In-memory data model: measurement tables and weight matrices.
//!
//! Rows are kept in time order. Construction validates the schema once, so
//! downstream stages can rely on every row having the same shape.

use serde::Serialize;

use crate::error::{AnalysisError, Result};

/// Closed specification interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpecificationLimits {
    pub lower: f64,
    pub upper: f64,
}

impl SpecificationLimits {
    /// Builds `[target - tolerance, target + tolerance]`.
    pub fn from_target(target: f64, tolerance: f64) -> Self {
        Self {
            lower: target - tolerance,
            upper: target + tolerance,
        }
    }

    /// Whether `x` satisfies the specification.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.lower && x <= self.upper
    }
}

/// One time step: measured values plus binary in-spec indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRow {
    pub measurements: Vec<f64>,
    pub in_spec: Vec<bool>,
}

impl MeasurementRow {
    pub fn new(measurements: Vec<f64>, in_spec: Vec<bool>) -> Self {
        Self {
            measurements,
            in_spec,
        }
    }

    /// A row without indicator fields.
    pub fn measurements_only(measurements: Vec<f64>) -> Self {
        Self::new(measurements, Vec::new())
    }
}

/// Time-ordered rows sharing one field schema.
///
/// # Invariants
///
/// - At least one measurement field.
/// - Every row has `measurement_fields.len()` finite measurements and
///   `indicator_fields.len()` indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementTable {
    measurement_fields: Vec<String>,
    indicator_fields: Vec<String>,
    rows: Vec<MeasurementRow>,
}

impl MeasurementTable {
    /// Creates a table, checking every row against the schema.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidInput`] if there are no measurement fields, a
    /// row has the wrong number of values, or a measurement is not finite.
    /// The reported line is the 1-based row number.
    pub fn new(
        measurement_fields: Vec<String>,
        indicator_fields: Vec<String>,
        rows: Vec<MeasurementRow>,
    ) -> Result<Self> {
        if measurement_fields.is_empty() {
            return Err(AnalysisError::InvalidInput {
                line: 0,
                message: "table needs at least one measurement field".into(),
            });
        }
        for (i, row) in rows.iter().enumerate() {
            if row.measurements.len() != measurement_fields.len()
                || row.in_spec.len() != indicator_fields.len()
            {
                return Err(AnalysisError::InvalidInput {
                    line: i + 1,
                    message: format!(
                        "expected {} measurements and {} indicators, got {} and {}",
                        measurement_fields.len(),
                        indicator_fields.len(),
                        row.measurements.len(),
                        row.in_spec.len()
                    ),
                });
            }
            if let Some(v) = row.measurements.iter().find(|v| !v.is_finite()) {
                return Err(AnalysisError::InvalidInput {
                    line: i + 1,
                    message: format!("non-finite measurement {v}"),
                });
            }
        }
        Ok(Self {
            measurement_fields,
            indicator_fields,
            rows,
        })
    }

    /// Wraps a univariate series as a one-column table named `value`.
    pub fn from_series(values: &[f64]) -> Result<Self> {
        let rows = values
            .iter()
            .map(|&v| MeasurementRow::measurements_only(vec![v]))
            .collect();
        Self::new(vec!["value".into()], Vec::new(), rows)
    }

    /// Replaces the indicator columns with flags derived from `limits`,
    /// one `<field>_spec` column per measurement field.
    pub fn with_specification(self, limits: &SpecificationLimits) -> Self {
        let indicator_fields = self
            .measurement_fields
            .iter()
            .map(|f| format!("{f}_spec"))
            .collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                let in_spec = row.measurements.iter().map(|&x| limits.contains(x)).collect();
                MeasurementRow::new(row.measurements, in_spec)
            })
            .collect();
        Self {
            measurement_fields: self.measurement_fields,
            indicator_fields,
            rows,
        }
    }

    pub fn measurement_fields(&self) -> &[String] {
        &self.measurement_fields
    }

    pub fn indicator_fields(&self) -> &[String] {
        &self.indicator_fields
    }

    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the table carries in-spec indicators.
    pub fn has_indicators(&self) -> bool {
        !self.indicator_fields.is_empty()
    }

    /// Values of one measurement column, in time order.
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.measurement_fields.len() {
            return None;
        }
        Some(self.rows.iter().map(|r| r.measurements[index]).collect())
    }

    /// All measurement columns, in field order.
    pub fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.measurement_fields.len())
            .filter_map(|i| self.column(i))
            .collect()
    }
}

/// Latent state weights: one fixed-width vector per time step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightMatrix {
    width: usize,
    rows: Vec<Vec<f64>>,
}

impl WeightMatrix {
    /// Creates a matrix, checking that all rows share a width and are finite.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(AnalysisError::InvalidInput {
                    line: i + 1,
                    message: format!("expected {width} weights, got {}", row.len()),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(AnalysisError::InvalidInput {
                    line: i + 1,
                    message: "non-finite weight".into(),
                });
            }
        }
        Ok(Self { width, rows })
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of weight columns.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_table_schema_mismatch() {
        let rows = vec![
            MeasurementRow::new(vec![1.0, 2.0], vec![true, true]),
            MeasurementRow::new(vec![1.0], vec![true, true]),
        ];
        let err = MeasurementTable::new(fields(&["a", "b"]), fields(&["a_spec", "b_spec"]), rows)
            .expect_err("should reject");
        assert!(matches!(err, AnalysisError::InvalidInput { line: 2, .. }));
    }

    #[test]
    fn test_table_rejects_nan() {
        let rows = vec![MeasurementRow::measurements_only(vec![f64::NAN])];
        assert!(MeasurementTable::new(fields(&["a"]), Vec::new(), rows).is_err());
    }

    #[test]
    fn test_table_requires_measurement_field() {
        assert!(MeasurementTable::new(Vec::new(), Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn test_with_specification_derives_flags() {
        let rows = vec![
            MeasurementRow::measurements_only(vec![99.5, 101.2]),
            MeasurementRow::measurements_only(vec![98.9, 100.0]),
        ];
        let table = MeasurementTable::new(fields(&["Batch1", "Batch2"]), Vec::new(), rows)
            .expect("valid")
            .with_specification(&SpecificationLimits::from_target(100.0, 1.0));
        assert_eq!(table.indicator_fields(), &["Batch1_spec", "Batch2_spec"]);
        assert_eq!(table.rows()[0].in_spec, vec![true, false]);
        assert_eq!(table.rows()[1].in_spec, vec![false, true]);
    }

    #[test]
    fn test_columns() {
        let rows = vec![
            MeasurementRow::measurements_only(vec![1.0, 10.0]),
            MeasurementRow::measurements_only(vec![2.0, 20.0]),
        ];
        let table = MeasurementTable::new(fields(&["a", "b"]), Vec::new(), rows).expect("valid");
        assert_eq!(table.column(1), Some(vec![10.0, 20.0]));
        assert!(table.column(2).is_none());
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_weight_matrix_ragged() {
        let err = WeightMatrix::new(vec![vec![1.0, 2.0], vec![1.0]]).expect_err("ragged");
        assert!(matches!(err, AnalysisError::InvalidInput { line: 2, .. }));
        let m = WeightMatrix::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).expect("valid");
        assert_eq!(m.len(), 2);
        assert_eq!(m.width(), 2);
    }
}
