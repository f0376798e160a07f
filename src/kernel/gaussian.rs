//! Gaussian kernel implementation
//!
//! K(x, y) = exp(-||x - y||² / (2σ²)), with σ the bandwidth. This is the
//! kernel random Fourier features approximate under kernel code `G`.

use crate::core::SparseVector;
use crate::kernel::Kernel;

/// Gaussian (RBF) kernel parameterised by its bandwidth σ
#[derive(Debug, Clone, Copy)]
pub struct GaussianKernel {
    bandwidth: f64,
}

impl GaussianKernel {
    /// Create a new Gaussian kernel
    ///
    /// # Panics
    /// Panics if bandwidth is not positive
    pub fn new(bandwidth: f64) -> Self {
        assert!(
            bandwidth > 0.0,
            "Bandwidth must be positive, got: {}",
            bandwidth
        );
        Self { bandwidth }
    }

    /// Get the bandwidth parameter
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Equivalent `gamma` in the exp(-γ||x - y||²) parameterisation
    pub fn gamma(&self) -> f64 {
        1.0 / (2.0 * self.bandwidth * self.bandwidth)
    }
}

impl Default for GaussianKernel {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Kernel for GaussianKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (-self.gamma() * squared_euclidean_distance(x, y)).exp()
    }
}

/// Compute squared Euclidean distance between two sparse vectors
///
/// Indices present in only one vector contribute that value squared.
pub(crate) fn squared_euclidean_distance(x: &SparseVector, y: &SparseVector) -> f64 {
    let mut distance_sq = 0.0;
    let mut i = 0;
    let mut j = 0;

    while i < x.indices.len() && j < y.indices.len() {
        let x_idx = x.indices[i];
        let y_idx = y.indices[j];

        if x_idx == y_idx {
            let diff = x.values[i] - y.values[j];
            distance_sq += diff * diff;
            i += 1;
            j += 1;
        } else if x_idx < y_idx {
            distance_sq += x.values[i] * x.values[i];
            i += 1;
        } else {
            distance_sq += y.values[j] * y.values[j];
            j += 1;
        }
    }

    distance_sq += x.values[i..].iter().map(|v| v * v).sum::<f64>();
    distance_sq += y.values[j..].iter().map(|v| v * v).sum::<f64>();

    distance_sq
}
