//! LibSVM format dataset implementation
//!
//! Supports loading datasets in the libsvm format:
//! class index:value index:value ...
//!
//! Example:
//! 1 1:0.5 3:1.2 7:0.8
//! 0 2:0.3 5:2.1
//!
//! Classes are integers and kept as written; feature indices are 1-based in
//! the file and 0-based in memory.

use crate::core::{Dataset, RFError, Result, Sample, SparseVector};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dataset implementation for LibSVM format files
#[derive(Debug, Clone)]
pub struct LibSvmDataset {
    data: Vec<SparseVector>,
    classes: Vec<i32>,
    dimensions: usize,
}

impl LibSvmDataset {
    /// Load a dataset from a LibSVM format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from a reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut data = Vec::new();
        let mut classes = Vec::new();
        let mut dimensions = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let sample = parse_line(line).map_err(|e| {
                RFError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;
            dimensions = dimensions.max(sample.features.dim_hint());
            data.push(sample.features);
            classes.push(sample.class);
        }

        if data.is_empty() {
            return Err(RFError::EmptyDataset);
        }

        Ok(Self {
            data,
            classes,
            dimensions,
        })
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

/// Parse an integer class, accepting `+1` and integral floats such as `1.0`
pub(crate) fn parse_class(token: &str) -> Result<i32> {
    if let Ok(class) = token.parse::<i32>() {
        return Ok(class);
    }
    match token.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.abs() <= f64::from(i32::MAX) => {
            Ok(value as i32)
        }
        _ => Err(RFError::ParseError(format!("Invalid class: {token}"))),
    }
}

/// Parse a single line in libsvm format
fn parse_line(line: &str) -> Result<Sample> {
    let mut parts = line.split_whitespace();
    let class = match parts.next() {
        Some(token) => parse_class(token)?,
        None => return Err(RFError::ParseError("Empty line".to_string())),
    };

    let mut indices = Vec::new();
    let mut values = Vec::new();
    for feature in parts {
        let (index, value) = feature
            .split_once(':')
            .ok_or_else(|| RFError::ParseError(format!("Invalid feature format: {feature}")))?;

        let index = index
            .parse::<usize>()
            .map_err(|_| RFError::ParseError(format!("Invalid feature index: {index}")))?;
        let value = value
            .parse::<f64>()
            .map_err(|_| RFError::ParseError(format!("Invalid feature value: {value}")))?;

        // libsvm uses 1-based indexing
        if index == 0 {
            return Err(RFError::ParseError(
                "Feature index must be positive: 0".to_string(),
            ));
        }

        indices.push(index - 1);
        values.push(value);
    }

    Ok(Sample::new(SparseVector::new(indices, values), class))
}

impl Dataset for LibSvmDataset {
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
