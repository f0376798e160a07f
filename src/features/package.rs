//! Transferable generator parameters

use crate::core::{RFError, Result};
use crate::features::FeatureType;
use crate::kernel::{Kernel, KernelType};
use serde::{Deserialize, Serialize};

/// Everything needed to regenerate a random feature map exactly
///
/// Sampling is seeded, so the package stays small no matter how large the
/// projection it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeaturePackage {
    Fourier {
        idim: usize,
        fdim: usize,
        kernel: KernelType,
        bandwidth: f64,
        seed: u64,
    },
    Binning {
        idim: usize,
        fdim: usize,
        bandwidth: f64,
        seed: u64,
    },
}

impl FeaturePackage {
    /// Generator this package belongs to
    pub fn feature_type(&self) -> FeatureType {
        match self {
            FeaturePackage::Fourier { .. } => FeatureType::Fourier,
            FeaturePackage::Binning { .. } => FeatureType::Binning,
        }
    }

    /// Input dimensionality
    pub fn idim(&self) -> usize {
        match self {
            FeaturePackage::Fourier { idim, .. } | FeaturePackage::Binning { idim, .. } => *idim,
        }
    }

    /// Output dimensionality
    pub fn fdim(&self) -> usize {
        match self {
            FeaturePackage::Fourier { fdim, .. } | FeaturePackage::Binning { fdim, .. } => *fdim,
        }
    }

    /// Kernel bandwidth σ
    pub fn bandwidth(&self) -> f64 {
        match self {
            FeaturePackage::Fourier { bandwidth, .. }
            | FeaturePackage::Binning { bandwidth, .. } => *bandwidth,
        }
    }

    /// Exact kernel the described map approximates
    ///
    /// Binning features always target the Laplacian kernel. A package read
    /// from disk may carry a non-positive bandwidth, which is rejected here.
    pub fn exact_kernel(&self) -> Result<Box<dyn Kernel>> {
        match *self {
            FeaturePackage::Fourier {
                kernel, bandwidth, ..
            } => kernel.exact(bandwidth),
            FeaturePackage::Binning { bandwidth, .. } => KernelType::Laplacian.exact(bandwidth),
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| RFError::SerializationError(e.to_string()))
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RFError::SerializationError(e.to_string()))
    }
}

/// Optional knobs shared by both generators
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureOptions {
    /// Kernel bandwidth σ; defaults to sqrt(idim)
    pub bandwidth: Option<f64>,
    /// Sampling seed; drawn from OS entropy when absent
    pub seed: Option<u64>,
}

impl FeatureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bandwidth(mut self, bandwidth: f64) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fill in defaults and validate against the dimensions
    pub(crate) fn resolve(&self, idim: usize, fdim: usize) -> Result<(f64, u64)> {
        if idim == 0 {
            return Err(RFError::InvalidParameter(
                "input dimension must be positive".to_string(),
            ));
        }
        if fdim == 0 {
            return Err(RFError::InvalidParameter(
                "feature dimension must be positive".to_string(),
            ));
        }

        let bandwidth = self.bandwidth.unwrap_or_else(|| (idim as f64).sqrt());
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(RFError::InvalidParameter(format!(
                "bandwidth must be positive and finite, got: {bandwidth}"
            )));
        }

        let seed = self.seed.unwrap_or_else(rand::random);
        Ok((bandwidth, seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_json_shape() {
        let package = FeaturePackage::Fourier {
            idim: 4,
            fdim: 16,
            kernel: KernelType::Laplacian,
            bandwidth: 2.0,
            seed: 42,
        };

        let json = package.to_json().unwrap();
        assert!(json.contains("\"type\":\"fourier\""));
        assert_eq!(FeaturePackage::from_json(&json).unwrap(), package);
        assert_eq!(package.feature_type(), FeatureType::Fourier);
        assert_eq!(package.idim(), 4);
        assert_eq!(package.fdim(), 16);
    }

    #[test]
    fn test_exact_kernel_follows_package() {
        use crate::core::SparseVector;

        let x = SparseVector::new(vec![0], vec![1.0]);
        let y = SparseVector::new(vec![1], vec![1.0]);
        let binning = FeaturePackage::Binning {
            idim: 2,
            fdim: 8,
            bandwidth: 2.0,
            seed: 1,
        };
        // Laplacian: exp(-2 / 2)
        assert!((binning.exact_kernel().unwrap().compute(&x, &y) - (-1.0f64).exp()).abs() < 1e-12);
        assert_eq!(binning.bandwidth(), 2.0);

        let fourier = FeaturePackage::Fourier {
            idim: 2,
            fdim: 8,
            kernel: KernelType::Gaussian,
            bandwidth: 1.0,
            seed: 1,
        };
        // Gaussian: exp(-2 / 2)
        assert!((fourier.exact_kernel().unwrap().compute(&x, &y) - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_exact_kernel_rejects_loaded_zero_bandwidth() {
        let package = FeaturePackage::from_json(
            r#"{"type":"binning","idim":2,"fdim":8,"bandwidth":0.0,"seed":1}"#,
        )
        .unwrap();
        assert!(matches!(
            package.exact_kernel(),
            Err(RFError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_options_defaults() {
        let (bandwidth, _) = FeatureOptions::new().resolve(16, 4).unwrap();
        assert_eq!(bandwidth, 4.0);

        let (bandwidth, seed) = FeatureOptions::new()
            .with_bandwidth(0.5)
            .with_seed(9)
            .resolve(16, 4)
            .unwrap();
        assert_eq!((bandwidth, seed), (0.5, 9));
    }

    #[test]
    fn test_options_validation() {
        assert!(FeatureOptions::new().resolve(0, 4).is_err());
        assert!(FeatureOptions::new().resolve(4, 0).is_err());
        assert!(FeatureOptions::new()
            .with_bandwidth(-1.0)
            .resolve(4, 4)
            .is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            FeaturePackage::from_json("{\"type\":\"wavelet\"}"),
            Err(RFError::SerializationError(_))
        ));
    }
}
