//! Delimited text parsing for measurement tables, series, and weight matrices.
//!
//! Operates on text already in memory; reading files is left to the caller.
//! Line numbers in errors are 1-based and count the header line.

use crate::data::{MeasurementRow, MeasurementTable, WeightMatrix};
use crate::error::{AnalysisError, Result};

/// Suffix that marks a binary in-spec indicator column.
pub const INDICATOR_SUFFIX: &str = "_spec";

fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

fn split(line: &str, delimiter: char) -> Vec<&str> {
    line.split(delimiter).map(str::trim).collect()
}

fn parse_number(field: &str, line: usize) -> Result<f64> {
    field.parse::<f64>().map_err(|_| AnalysisError::InvalidInput {
        line,
        message: format!("`{field}` is not a number"),
    })
}

/// Parses a table with a header row.
///
/// Columns whose name ends in `_spec` are binary in-spec indicators (values
/// `0` or `1`); all other columns are measurements. Indicator columns may
/// appear anywhere in the header.
///
/// # Examples
///
/// ```
/// use u_stability::input::parse_measurement_table;
///
/// let text = "Batch1;Batch2;Batch1_spec;Batch2_spec\n100.2;99.1;1;0\n";
/// let table = parse_measurement_table(text, ';').unwrap();
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.rows()[0].in_spec, vec![true, false]);
/// ```
pub fn parse_measurement_table(text: &str, delimiter: char) -> Result<MeasurementTable> {
    let mut lines = data_lines(text);
    let (_, header) = lines.next().ok_or(AnalysisError::InvalidInput {
        line: 1,
        message: "missing header row".into(),
    })?;
    let names = split(header, delimiter);

    let mut measurement_idx = Vec::new();
    let mut indicator_idx = Vec::new();
    for (i, name) in names.iter().enumerate() {
        if name.ends_with(INDICATOR_SUFFIX) {
            indicator_idx.push(i);
        } else {
            measurement_idx.push(i);
        }
    }
    let measurement_fields = measurement_idx.iter().map(|&i| names[i].to_string()).collect();
    let indicator_fields = indicator_idx.iter().map(|&i| names[i].to_string()).collect();

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        let fields = split(line, delimiter);
        if fields.len() != names.len() {
            return Err(AnalysisError::InvalidInput {
                line: line_no,
                message: format!("expected {} fields, got {}", names.len(), fields.len()),
            });
        }
        let measurements = measurement_idx
            .iter()
            .map(|&i| parse_number(fields[i], line_no))
            .collect::<Result<Vec<_>>>()?;
        let in_spec = indicator_idx
            .iter()
            .map(|&i| match parse_number(fields[i], line_no)? {
                v if v == 1.0 => Ok(true),
                v if v == 0.0 => Ok(false),
                v => Err(AnalysisError::InvalidInput {
                    line: line_no,
                    message: format!("indicator `{}` must be 0 or 1, got {v}", names[i]),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(MeasurementRow::new(measurements, in_spec));
    }

    MeasurementTable::new(measurement_fields, indicator_fields, rows)
}

/// Parses the first column of a delimited text as a numeric series.
///
/// A first line that does not parse as a number is treated as a header.
pub fn parse_series(text: &str, delimiter: char) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for (idx, (line_no, line)) in data_lines(text).enumerate() {
        let first = split(line, delimiter).first().copied().unwrap_or_default();
        match first.parse::<f64>() {
            Ok(v) => values.push(v),
            Err(_) if idx == 0 => continue,
            Err(_) => {
                return Err(AnalysisError::InvalidInput {
                    line: line_no,
                    message: format!("`{first}` is not a number"),
                })
            }
        }
    }
    Ok(values)
}

/// Parses a weight matrix with a header row.
///
/// If any value in the first column is non-numeric, that column is taken to
/// be an index (timestamps, labels) and dropped.
///
/// # Examples
///
/// ```
/// use u_stability::input::parse_weight_matrix;
///
/// let text = "t,w1,w2\nt0,0.5,0.5\nt1,0.4,0.6\n";
/// let m = parse_weight_matrix(text, ',').unwrap();
/// assert_eq!(m.width(), 2);
/// assert_eq!(m.rows()[1], vec![0.4, 0.6]);
/// ```
pub fn parse_weight_matrix(text: &str, delimiter: char) -> Result<WeightMatrix> {
    let records: Vec<(usize, Vec<&str>)> = data_lines(text)
        .skip(1)
        .map(|(n, l)| (n, split(l, delimiter)))
        .collect();

    let has_index = records
        .iter()
        .any(|(_, fields)| fields.first().map_or(false, |f| f.parse::<f64>().is_err()));
    let skip = usize::from(has_index);

    let rows = records
        .iter()
        .map(|(line_no, fields)| {
            fields
                .iter()
                .skip(skip)
                .map(|f| parse_number(f, *line_no))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    WeightMatrix::new(rows)
}
