//! Random feature maps
//!
//! Both generators embed raw inputs into `fdim` dimensions so that plain
//! inner products approximate a shift-invariant kernel; a linear SVC on the
//! embedded data then behaves like a kernel SVM.
//!
//! - [`RandomFourierFeature`]: Gaussian or Laplacian kernel
//! - [`RandomBinningFeature`]: Laplacian kernel, sparse-friendly
//!
//! Generators are reproducible from their [`FeaturePackage`], which is what
//! gets shipped to other processes or stored next to a trained model.

pub mod binning;
pub mod diagnostics;
pub mod fourier;
pub mod package;

pub use self::binning::*;
pub use self::diagnostics::*;
pub use self::fourier::*;
pub use self::package::*;

use crate::core::{RFError, Result, SparseVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A map from raw input vectors to feature vectors
pub trait FeatureMap: Send + Sync {
    /// Expected input dimensionality
    fn input_dim(&self) -> usize;

    /// Output dimensionality
    fn output_dim(&self) -> usize;

    /// Map a single input
    fn transform(&self, x: &SparseVector) -> Result<SparseVector>;

    /// Map a dense input
    fn transform_dense(&self, x: &[f64]) -> Result<SparseVector> {
        if x.len() != self.input_dim() {
            return Err(RFError::DimensionMismatch {
                expected: self.input_dim(),
                actual: x.len(),
            });
        }
        self.transform(&SparseVector::from_dense(x))
    }

    /// Map many inputs, preserving order
    fn transform_batch(&self, xs: &[SparseVector]) -> Result<Vec<SparseVector>> {
        xs.iter().map(|x| self.transform(x)).collect()
    }

    /// Parameters from which an identical map can be rebuilt
    fn package(&self) -> FeaturePackage;
}

/// Reject inputs with indices past the expected dimensionality
pub(crate) fn check_input(x: &SparseVector, idim: usize) -> Result<()> {
    let actual = x.dim_hint();
    if actual > idim {
        return Err(RFError::DimensionMismatch {
            expected: idim,
            actual,
        });
    }
    Ok(())
}

/// Wrap a rejected distribution parameter
pub(crate) fn distribution_error(e: impl fmt::Display) -> RFError {
    RFError::InvalidParameter(format!("cannot sample feature weights: {e}"))
}

/// Which random feature generator to use
///
/// The variant doubles as the generator "class": [`FeatureType::rebuild`]
/// turns a matching [`FeaturePackage`] back into a live feature map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    /// Random Fourier features, code `F`
    #[default]
    Fourier,
    /// Random binning features, code `B`
    Binning,
}

impl FeatureType {
    /// Single-character code used on the command line and in configs
    pub fn code(self) -> char {
        match self {
            FeatureType::Fourier => 'F',
            FeatureType::Binning => 'B',
        }
    }

    /// Parse a feature type code
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'F' => Ok(FeatureType::Fourier),
            'B' => Ok(FeatureType::Binning),
            other => Err(RFError::UnknownFeatureType(other)),
        }
    }

    /// Rebuild the generator described by `package`
    ///
    /// `cores` only affects binning features, which parallelise batch
    /// transforms; the Fourier generator ignores it.
    pub fn rebuild(
        self,
        package: &FeaturePackage,
        cores: Option<usize>,
    ) -> Result<Box<dyn FeatureMap>> {
        if package.feature_type() != self {
            return Err(RFError::InvalidParameter(format!(
                "{} package cannot rebuild {} features",
                package.feature_type(),
                self
            )));
        }

        match self {
            FeatureType::Fourier => Ok(Box::new(RandomFourierFeature::from_package(package)?)),
            FeatureType::Binning => Ok(Box::new(
                RandomBinningFeature::from_package(package)?.with_cores(cores),
            )),
        }
    }
}

impl TryFrom<char> for FeatureType {
    type Error = RFError;

    fn try_from(code: char) -> Result<Self> {
        Self::from_code(code)
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureType::Fourier => write!(f, "fourier"),
            FeatureType::Binning => write!(f, "binning"),
        }
    }
}
