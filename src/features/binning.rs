//! Random binning features (Rahimi & Recht, 2007)
//!
//! Each of `fdim` random grids partitions input space into axis-aligned
//! cells with pitch δ ~ Gamma(2, σ) and shift u ~ U[0, δ) per dimension.
//! Two inputs land in the same cell of a grid with probability
//! exp(-||x - y||₁ / σ), the Laplacian kernel.
//!
//! Cells are unbounded, so each grid's cell is hashed into one of `fdim`
//! buckets with a hash-derived sign. Matching cells always agree in bucket
//! and sign; unrelated collisions cancel in expectation.

use crate::core::{RFError, Result, SparseVector};
use crate::features::{
    check_input, distribution_error, FeatureMap, FeatureOptions, FeaturePackage,
};
use crate::parallel;
use crate::task::Task;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Gamma;
use rayon::prelude::*;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a, stable across platforms and runs
pub(crate) struct Fnv1a(u64);

impl Fnv1a {
    pub(crate) fn new() -> Self {
        Self(FNV_OFFSET)
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    pub(crate) fn finish(&self) -> u64 {
        self.0
    }
}

/// Random binning feature generator
#[derive(Debug, Clone)]
pub struct RandomBinningFeature {
    idim: usize,
    fdim: usize,
    bandwidth: f64,
    seed: u64,
    cores: Option<usize>,
    /// Row-major `fdim × idim` cell pitches
    pitches: Vec<f64>,
    /// Row-major `fdim × idim` cell shifts, each in [0, pitch)
    shifts: Vec<f64>,
}

impl RandomBinningFeature {
    /// Sample a generator with default bandwidth and a fresh seed
    ///
    /// `cores` bounds the worker pool used by batch transforms; `task` is
    /// closed once sampling finishes.
    pub fn new(idim: usize, fdim: usize, task: Task, cores: Option<usize>) -> Result<Self> {
        Self::with_options(idim, fdim, &FeatureOptions::default(), task, cores)
    }

    /// Sample a generator with explicit bandwidth and/or seed
    pub fn with_options(
        idim: usize,
        fdim: usize,
        options: &FeatureOptions,
        task: Task,
        cores: Option<usize>,
    ) -> Result<Self> {
        let (bandwidth, seed) = options.resolve(idim, fdim)?;
        let feature = Self::sample(idim, fdim, bandwidth, seed)?.with_cores(cores);
        task.done(&format!(
            "Sampled {fdim} binning grids over {idim} inputs"
        ));
        Ok(feature)
    }

    /// Rebuild a generator from its package
    pub fn from_package(package: &FeaturePackage) -> Result<Self> {
        match *package {
            FeaturePackage::Binning {
                idim,
                fdim,
                bandwidth,
                seed,
            } => {
                FeatureOptions::new()
                    .with_bandwidth(bandwidth)
                    .with_seed(seed)
                    .resolve(idim, fdim)?;
                Self::sample(idim, fdim, bandwidth, seed)
            }
            FeaturePackage::Fourier { .. } => Err(RFError::InvalidParameter(
                "fourier package cannot rebuild binning features".to_string(),
            )),
        }
    }

    fn sample(idim: usize, fdim: usize, bandwidth: f64, seed: u64) -> Result<Self> {
        debug!("sampling {fdim} grids over {idim} inputs (bandwidth {bandwidth}, seed {seed})");
        let mut rng = StdRng::seed_from_u64(seed);
        let gamma = Gamma::new(2.0, bandwidth).map_err(distribution_error)?;

        let mut pitches = Vec::with_capacity(fdim * idim);
        let mut shifts = Vec::with_capacity(fdim * idim);
        for _ in 0..fdim * idim {
            let pitch = rng.sample(&gamma).max(f64::MIN_POSITIVE);
            pitches.push(pitch);
            shifts.push(rng.gen::<f64>() * pitch);
        }

        Ok(Self {
            idim,
            fdim,
            bandwidth,
            seed,
            cores: None,
            pitches,
            shifts,
        })
    }

    /// Set the worker count used by [`FeatureMap::transform_batch`]
    pub fn with_cores(mut self, cores: Option<usize>) -> Self {
        self.cores = cores;
        self
    }

    /// MP-ready parameters for rebuilding this generator elsewhere
    ///
    /// The worker count is process-local and not part of the package.
    pub fn mp_package(&self) -> FeaturePackage {
        FeaturePackage::Binning {
            idim: self.idim,
            fdim: self.fdim,
            bandwidth: self.bandwidth,
            seed: self.seed,
        }
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn cores(&self) -> Option<usize> {
        self.cores
    }

    /// Bucket and sign of `x`'s cell in grid `grid`
    fn locate(&self, grid: usize, x: &[f64]) -> (usize, f64) {
        let start = grid * self.idim;
        let pitches = &self.pitches[start..start + self.idim];
        let shifts = &self.shifts[start..start + self.idim];

        let mut hasher = Fnv1a::new();
        hasher.write(&(grid as u64).to_le_bytes());
        for ((&value, &pitch), &shift) in x.iter().zip(pitches).zip(shifts) {
            let cell = ((value - shift) / pitch).floor() as i64;
            hasher.write(&cell.to_le_bytes());
        }

        let hash = hasher.finish();
        let bucket = (hash % self.fdim as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        (bucket, sign)
    }
}

impl FeatureMap for RandomBinningFeature {
    fn input_dim(&self) -> usize {
        self.idim
    }

    fn output_dim(&self) -> usize {
        self.fdim
    }

    fn transform(&self, x: &SparseVector) -> Result<SparseVector> {
        check_input(x, self.idim)?;

        let dense = x.to_dense(self.idim);
        let weight = 1.0 / (self.fdim as f64).sqrt();
        let mut out = vec![0.0; self.fdim];
        for grid in 0..self.fdim {
            let (bucket, sign) = self.locate(grid, &dense);
            out[bucket] += sign * weight;
        }

        Ok(SparseVector::from_dense(&out))
    }

    fn transform_batch(&self, xs: &[SparseVector]) -> Result<Vec<SparseVector>> {
        parallel::install(self.cores, || {
            xs.par_iter()
                .map(|x| self.transform(x))
                .collect::<Result<Vec<_>>>()
        })?
    }

    fn package(&self) -> FeaturePackage {
        self.mp_package()
    }
}
