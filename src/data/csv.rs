//! CSV format dataset implementation
//!
//! Supports loading datasets from CSV files where:
//! - The last column is the integer class
//! - All other columns are features
//! - First row can be headers (automatically detected)

use crate::core::{Dataset, RFError, Result, Sample, SparseVector};
use crate::data::libsvm::parse_class;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dataset implementation for CSV format files
#[derive(Debug, Clone)]
pub struct CsvDataset {
    data: Vec<SparseVector>,
    classes: Vec<i32>,
    dimensions: usize,
}

impl CsvDataset {
    /// Load a dataset from a CSV file
    ///
    /// The last column is assumed to be the class.
    /// Headers are automatically detected if present.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from a reader, detecting a header row
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, true)
    }

    /// Load a dataset from a reader with explicit header option
    pub fn from_reader_with_options<R: BufRead>(
        reader: R,
        auto_detect_header: bool,
    ) -> Result<Self> {
        let mut data = Vec::new();
        let mut classes = Vec::new();
        let mut dimensions = None;
        let mut first_row = true;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if std::mem::take(&mut first_row) && auto_detect_header && is_header_line(line) {
                continue;
            }

            let (sample, width) = parse_data_line(line).map_err(|e| {
                RFError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;
            match dimensions {
                None => dimensions = Some(width),
                Some(expected) if expected != width => {
                    return Err(RFError::DimensionMismatch {
                        expected,
                        actual: width,
                    })
                }
                Some(_) => {}
            }
            data.push(sample.features);
            classes.push(sample.class);
        }

        match dimensions {
            Some(dimensions) => Ok(Self {
                data,
                classes,
                dimensions,
            }),
            None => Err(RFError::EmptyDataset),
        }
    }

    /// Split back into owned samples
    pub fn into_samples(self) -> Vec<Sample> {
        self.data
            .into_iter()
            .zip(self.classes)
            .map(|(features, class)| Sample::new(features, class))
            .collect()
    }
}

/// Check if a line appears to be a header
fn is_header_line(line: &str) -> bool {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 2 {
        return false;
    }

    // Most feature columns non-numeric means names, not values
    let non_numeric_count = fields
        .iter()
        .take(fields.len() - 1)
        .filter(|field| field.trim().parse::<f64>().is_err())
        .count();

    non_numeric_count > fields.len() / 2
}

/// Parse a CSV data line into a sample and its feature column count
fn parse_data_line(line: &str) -> Result<(Sample, usize)> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let Some((class, features)) = fields.split_last() else {
        return Err(RFError::ParseError("Empty line".to_string()));
    };
    if features.is_empty() {
        return Err(RFError::ParseError(format!("Line has too few fields: {line}")));
    }

    let class = parse_class(class)?;
    let dense = features
        .iter()
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|_| RFError::ParseError(format!("Invalid feature value: {field}")))
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok((Sample::new(SparseVector::from_dense(&dense), class), dense.len()))
}

impl Dataset for CsvDataset {
    fn data(&self) -> &[SparseVector] {
        &self.data
    }

    fn classes(&self) -> &[i32] {
        &self.classes
    }

    fn dim(&self) -> usize {
        self.dimensions
    }
}
