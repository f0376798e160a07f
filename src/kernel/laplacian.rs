//! Laplacian kernel implementation
//!
//! K(x, y) = exp(-||x - y||₁ / σ). Random binning features always target
//! this kernel; random Fourier features target it under kernel code `L`.

use crate::core::SparseVector;
use crate::kernel::Kernel;

/// Laplacian kernel parameterised by its bandwidth σ
#[derive(Debug, Clone, Copy)]
pub struct LaplacianKernel {
    bandwidth: f64,
}

impl LaplacianKernel {
    /// Create a new Laplacian kernel
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
}

impl Kernel for LaplacianKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (-manhattan_distance(x, y) / self.bandwidth).exp()
    }
}

/// L1 distance between two sparse vectors
pub(crate) fn manhattan_distance(x: &SparseVector, y: &SparseVector) -> f64 {
    let mut distance = 0.0;
    let mut i = 0;
    let mut j = 0;

    while i < x.indices.len() && j < y.indices.len() {
        let x_idx = x.indices[i];
        let y_idx = y.indices[j];

        if x_idx == y_idx {
            distance += (x.values[i] - y.values[j]).abs();
            i += 1;
            j += 1;
        } else if x_idx < y_idx {
            distance += x.values[i].abs();
            i += 1;
        } else {
            distance += y.values[j].abs();
            j += 1;
        }
    }

    distance += x.values[i..].iter().map(|v| v.abs()).sum::<f64>();
    distance += y.values[j..].iter().map(|v| v.abs()).sum::<f64>();

    distance
}
