//! Random Fourier features (Rahimi & Recht, 2007)
//!
//! For a shift-invariant kernel k(x - y) with spectral density p(ω),
//! z(x) = sqrt(2/D) · cos(Wx + b) with rows of W drawn from p and
//! b ~ U[0, 2π) satisfies E[z(x)ᵀz(y)] = k(x, y).
//!
//! - Gaussian kernel: ω ~ N(0, σ⁻² I)
//! - Laplacian kernel: ω_d ~ Cauchy(0, σ⁻¹) independently per dimension

use crate::core::{RFError, Result, SparseVector};
use crate::features::{
    check_input, distribution_error, FeatureMap, FeatureOptions, FeaturePackage,
};
use crate::kernel::KernelType;
use crate::task::Task;
use log::debug;
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Cauchy, Normal};
use rayon::prelude::*;
use std::f64::consts::PI;

/// Random Fourier feature generator
#[derive(Debug, Clone)]
pub struct RandomFourierFeature {
    idim: usize,
    fdim: usize,
    kernel: KernelType,
    bandwidth: f64,
    seed: u64,
    /// Row-major `fdim × idim` projection
    projection: Vec<f64>,
    offsets: Vec<f64>,
}

impl RandomFourierFeature {
    /// Sample a generator with default bandwidth and a fresh seed
    ///
    /// `task` is closed once sampling finishes.
    pub fn new(idim: usize, fdim: usize, kernel: KernelType, task: Task) -> Result<Self> {
        Self::with_options(idim, fdim, kernel, &FeatureOptions::default(), task)
    }

    /// Sample a generator with explicit bandwidth and/or seed
    pub fn with_options(
        idim: usize,
        fdim: usize,
        kernel: KernelType,
        options: &FeatureOptions,
        task: Task,
    ) -> Result<Self> {
        let (bandwidth, seed) = options.resolve(idim, fdim)?;
        let feature = Self::sample(idim, fdim, kernel, bandwidth, seed)?;
        task.done(&format!(
            "Sampled {fdim} {kernel} Fourier features over {idim} inputs"
        ));
        Ok(feature)
    }

    /// Rebuild a generator from its package
    pub fn from_package(package: &FeaturePackage) -> Result<Self> {
        match *package {
            FeaturePackage::Fourier {
                idim,
                fdim,
                kernel,
                bandwidth,
                seed,
            } => {
                let options = FeatureOptions::new()
                    .with_bandwidth(bandwidth)
                    .with_seed(seed);
                options.resolve(idim, fdim)?;
                Self::sample(idim, fdim, kernel, bandwidth, seed)
            }
            FeaturePackage::Binning { .. } => Err(RFError::InvalidParameter(
                "binning package cannot rebuild fourier features".to_string(),
            )),
        }
    }

    fn sample(
        idim: usize,
        fdim: usize,
        kernel: KernelType,
        bandwidth: f64,
        seed: u64,
    ) -> Result<Self> {
        debug!("sampling {fdim}x{idim} {kernel} projection (bandwidth {bandwidth}, seed {seed})");
        let mut rng = StdRng::seed_from_u64(seed);
        let scale = 1.0 / bandwidth;
        let count = fdim * idim;

        let projection: Vec<f64> = match kernel {
            KernelType::Gaussian => {
                let normal = Normal::new(0.0, scale).map_err(distribution_error)?;
                (0..count).map(|_| rng.sample(&normal)).collect()
            }
            KernelType::Laplacian => {
                let cauchy = Cauchy::new(0.0, scale).map_err(distribution_error)?;
                (0..count).map(|_| rng.sample(&cauchy)).collect()
            }
        };
        let phase = Uniform::new(0.0, 2.0 * PI);
        let offsets: Vec<f64> = (0..fdim).map(|_| rng.sample(&phase)).collect();

        Ok(Self {
            idim,
            fdim,
            kernel,
            bandwidth,
            seed,
            projection,
            offsets,
        })
    }

    /// MP-ready parameters for rebuilding this generator elsewhere
    pub fn mp_package(&self) -> FeaturePackage {
        FeaturePackage::Fourier {
            idim: self.idim,
            fdim: self.fdim,
            kernel: self.kernel,
            bandwidth: self.bandwidth,
            seed: self.seed,
        }
    }

    pub fn kernel(&self) -> KernelType {
        self.kernel
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl FeatureMap for RandomFourierFeature {
    fn input_dim(&self) -> usize {
        self.idim
    }

    fn output_dim(&self) -> usize {
        self.fdim
    }

    fn transform(&self, x: &SparseVector) -> Result<SparseVector> {
        check_input(x, self.idim)?;

        let scale = (2.0 / self.fdim as f64).sqrt();
        let dense: Vec<f64> = self
            .projection
            .chunks_exact(self.idim)
            .zip(&self.offsets)
            .map(|(row, &offset)| scale * (x.dot_dense(row) + offset).cos())
            .collect();

        Ok(SparseVector::from_dense(&dense))
    }

    fn transform_batch(&self, xs: &[SparseVector]) -> Result<Vec<SparseVector>> {
        xs.par_iter().map(|x| self.transform(x)).collect()
    }

    fn package(&self) -> FeaturePackage {
        self.mp_package()
    }
}
