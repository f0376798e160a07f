//! Experiment configuration files
//!
//! Every field is optional; missing fields take the same defaults as the
//! library entry points.
//!
//! ```json
//! {
//!   "data_dir": "patches/",
//!   "feature": { "feature_type": "binning", "fdim": 2000, "idim": 7500 },
//!   "dataset": { "ntrain": -10, "ntest": 10, "ptrain": 0.05 },
//!   "svc": { "c": 0.5 },
//!   "cores": 4
//! }
//! ```

use crate::core::{LinearSvcConfig, RFError, Result};
use crate::data::transforms;
use crate::data::TransformArgs;
use crate::experiment::{DatasetParams, DEFAULT_FDIM, DEFAULT_IDIM};
use crate::features::{FeatureMap, FeatureOptions, FeatureType};
use crate::kernel::KernelType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Random feature settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureConfig {
    /// Train on raw vectors when false
    pub enabled: bool,
    pub feature_type: FeatureType,
    /// Ignored by binning features
    pub kernel: KernelType,
    pub fdim: usize,
    pub idim: usize,
    /// Defaults to sqrt(idim)
    pub bandwidth: Option<f64>,
    /// Drawn at random when absent
    pub seed: Option<u64>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            feature_type: FeatureType::default(),
            kernel: KernelType::default(),
            fdim: DEFAULT_FDIM,
            idim: DEFAULT_IDIM,
            bandwidth: None,
            seed: None,
        }
    }
}

impl FeatureConfig {
    pub fn options(&self) -> FeatureOptions {
        FeatureOptions {
            bandwidth: self.bandwidth,
            seed: self.seed,
        }
    }
}

/// Patient split and sampling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    pub ntrain: isize,
    pub ntest: isize,
    pub ptrain: f64,
    pub ptest: f64,
    pub seed: u64,
    /// Name of a built-in transform generator
    pub transform: Option<String>,
    pub targs: TransformArgs,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        let params = DatasetParams::default();
        Self {
            ntrain: params.ntrain,
            ntest: params.ntest,
            ptrain: params.ptrain,
            ptest: params.ptest,
            seed: params.seed,
            transform: None,
            targs: params.targs,
        }
    }
}

/// A whole experiment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    /// Directory of per-patient files
    pub data_dir: Option<PathBuf>,
    pub feature: FeatureConfig,
    pub dataset: DatasetConfig,
    pub svc: LinearSvcConfig,
    /// Worker threads (`None` = one per CPU)
    pub cores: Option<usize>,
    /// Raw samples used to check the kernel approximation; 0 disables it
    pub diagnostic_samples: usize,
}

impl ExperimentConfig {
    /// Read a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Parse a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RFError::SerializationError(e.to_string()))
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| RFError::SerializationError(e.to_string()))
    }

    /// Parameters for `make_datasets`, sharing `feature` between both splits
    pub fn dataset_params(&self, feature: Option<Arc<dyn FeatureMap>>) -> Result<DatasetParams> {
        let tgen = self
            .dataset
            .transform
            .as_deref()
            .map(transforms::by_name)
            .transpose()?;
        // without a feature map, transforms still need the raw width
        let idim = (tgen.is_some() && feature.is_none()).then_some(self.feature.idim);

        Ok(DatasetParams {
            cores: self.cores,
            feature,
            tgen,
            targs: self.dataset.targs.clone(),
            ntrain: self.dataset.ntrain,
            ntest: self.dataset.ntest,
            ptrain: self.dataset.ptrain,
            ptest: self.dataset.ptest,
            idim,
            seed: self.dataset.seed,
        })
    }
}
