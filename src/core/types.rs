//! Core type definitions

use serde::{Deserialize, Serialize};

/// Prediction result containing class and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label
    pub class: i32,
    /// Raw decision function value of the winning class
    pub decision_value: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(class: i32, decision_value: f64) -> Self {
        Self {
            class,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    ///
    /// # Panics
    /// Panics if `indices` and `values` differ in length
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from a dense slice, dropping exact zeros
    pub fn from_dense(dense: &[f64]) -> Self {
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (i, &v) in dense.iter().enumerate() {
            if v != 0.0 {
                indices.push(i);
                values.push(v);
            }
        }
        Self { indices, values }
    }

    /// Expand into a dense vector of length `dim`
    ///
    /// Entries at indices `>= dim` are dropped.
    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dim];
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            if let Some(slot) = dense.get_mut(i) {
                *slot = v;
            }
        }
        dense
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Dot product with another sparse vector
    ///
    /// Both index lists are sorted, so this is a single merge pass.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let mut result = 0.0;
        let mut i = 0;
        let mut j = 0;

        while i < self.indices.len() && j < other.indices.len() {
            let a = self.indices[i];
            let b = other.indices[j];
            if a == b {
                result += self.values[i] * other.values[j];
                i += 1;
                j += 1;
            } else if a < b {
                i += 1;
            } else {
                j += 1;
            }
        }

        result
    }

    /// Dot product with a dense weight vector; indices past its end count as 0
    pub fn dot_dense(&self, weights: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .filter_map(|(&i, &v)| weights.get(i).map(|w| w * v))
            .sum()
    }

    /// Add `scale * self` into a dense vector
    pub fn axpy_into(&self, scale: f64, target: &mut [f64]) {
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            if let Some(slot) = target.get_mut(i) {
                *slot += scale * v;
            }
        }
    }

    /// One past the largest stored index (0 when empty)
    pub fn dim_hint(&self) -> usize {
        self.indices.last().map_or(0, |&i| i + 1)
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Compute L2 norm
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Labelled raw sample as read from a patient file
#[derive(Clone, Debug)]
pub struct Sample {
    /// Feature vector (sparse representation)
    pub features: SparseVector,
    /// Class label, kept verbatim from the source file
    pub class: i32,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: SparseVector, class: i32) -> Self {
        Self { features, class }
    }
}

/// Result of one binary dual coordinate descent run
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Dual variables, one per training sample
    pub alpha: Vec<f64>,
    /// Primal weights recovered from the dual
    pub weights: Vec<f64>,
    /// Intercept (0 when the intercept is not fitted)
    pub bias: f64,
    /// Number of passes over the data
    pub iterations: usize,
    /// Whether the projected gradient fell under tolerance
    pub converged: bool,
    /// Final dual objective value
    pub objective_value: f64,
}

/// Configuration for the linear SVC solver
///
/// Defaults follow scikit-learn's `LinearSVC`: squared hinge loss, `C = 1`,
/// `tol = 1e-4`, at most 1000 passes, intercept fitted with scaling 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearSvcConfig {
    /// Regularization parameter
    pub c: f64,
    /// Stopping tolerance on the projected gradient spread
    pub tolerance: f64,
    /// Maximum number of passes over the data
    pub max_iterations: usize,
    /// Learn an intercept through a synthetic constant feature
    pub fit_intercept: bool,
    /// Value of the synthetic constant feature
    pub intercept_scaling: f64,
    /// Seed for the per-pass coordinate permutation
    pub seed: u64,
}

impl Default for LinearSvcConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            tolerance: 1e-4,
            max_iterations: 1000,
            fit_intercept: true,
            intercept_scaling: 1.0,
            seed: 0,
        }
    }
}
