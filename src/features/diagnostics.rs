//! How well a feature map reproduces its target kernel

use crate::core::{RFError, Result, SparseVector};
use crate::features::FeatureMap;
use crate::kernel::Kernel;

/// Absolute error between feature inner products and exact kernel values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximationError {
    /// Mean |zᵀz' - k| over all unordered pairs, diagonal included
    pub mean_abs: f64,
    /// Largest |zᵀz' - k|
    pub max_abs: f64,
    /// Number of pairs compared
    pub pairs: usize,
}

/// Compare `feature` against `kernel` on every pair of `samples`
pub fn approximation_error(
    feature: &dyn FeatureMap,
    kernel: &dyn Kernel,
    samples: &[SparseVector],
) -> Result<ApproximationError> {
    if samples.is_empty() {
        return Err(RFError::EmptyDataset);
    }

    let mapped = feature.transform_batch(samples)?;

    let mut total = 0.0;
    let mut max_abs: f64 = 0.0;
    let mut pairs = 0;
    for i in 0..samples.len() {
        for j in i..samples.len() {
            let exact = kernel.compute(&samples[i], &samples[j]);
            let error = (mapped[i].dot(&mapped[j]) - exact).abs();
            total += error;
            max_abs = max_abs.max(error);
            pairs += 1;
        }
    }

    Ok(ApproximationError {
        mean_abs: total / pairs as f64,
        max_abs,
        pairs,
    })
}
