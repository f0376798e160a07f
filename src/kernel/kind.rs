//! Kernel selection codes

use crate::core::{RFError, Result};
use crate::kernel::{GaussianKernel, Kernel, LaplacianKernel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shift-invariant kernels a random feature map can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelType {
    /// exp(-||x - y||² / 2σ²), code `G`
    #[default]
    Gaussian,
    /// exp(-||x - y||₁ / σ), code `L`
    Laplacian,
}

impl KernelType {
    /// Single-character code used on the command line and in configs
    pub fn code(self) -> char {
        match self {
            KernelType::Gaussian => 'G',
            KernelType::Laplacian => 'L',
        }
    }

    /// Parse a kernel code
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'G' => Ok(KernelType::Gaussian),
            'L' => Ok(KernelType::Laplacian),
            other => Err(RFError::UnknownKernel(other)),
        }
    }

    /// Exact kernel with the given bandwidth
    pub fn exact(self, bandwidth: f64) -> Result<Box<dyn Kernel>> {
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(RFError::InvalidParameter(format!(
                "bandwidth must be positive and finite, got: {bandwidth}"
            )));
        }
        Ok(match self {
            KernelType::Gaussian => Box::new(GaussianKernel::new(bandwidth)),
            KernelType::Laplacian => Box::new(LaplacianKernel::new(bandwidth)),
        })
    }
}

impl TryFrom<char> for KernelType {
    type Error = RFError;

    fn try_from(code: char) -> Result<Self> {
        Self::from_code(code)
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelType::Gaussian => write!(f, "gaussian"),
            KernelType::Laplacian => write!(f, "laplacian"),
        }
    }
}
