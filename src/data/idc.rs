//! Patient-level image classification datasets
//!
//! An [`IdcDataset`] is assembled from a list of patients: each patient's
//! samples are subsampled, expanded through an optional transform
//! generator, and mapped through an optional random feature map.

use crate::core::{Dataset, RFError, Result, Sample, SparseVector};
use crate::data::patients::{PatientId, PatientStore};
use crate::data::transforms::{TransformArgs, TransformGenerator};
use crate::features::binning::Fnv1a;
use crate::features::FeatureMap;
use crate::parallel;
use crate::task::Task;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// How samples are turned into dataset rows
#[derive(Clone, Default)]
pub struct DatasetOptions {
    /// Sample expander; `None` keeps every sample as is
    pub tgen: Option<TransformGenerator>,
    /// Arguments passed to `tgen`
    pub targs: TransformArgs,
    /// Worker threads for loading (`None` = one per CPU)
    pub cores: Option<usize>,
    /// Feature map applied to every row; `None` keeps raw vectors
    pub feature: Option<Arc<dyn FeatureMap>>,
    /// Raw input width; defaults to the feature map's input dimension
    pub idim: Option<usize>,
    /// Base seed for per-patient subsampling
    pub seed: u64,
}

impl DatasetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tgen(mut self, tgen: TransformGenerator, targs: TransformArgs) -> Self {
        self.tgen = Some(tgen);
        self.targs = targs;
        self
    }

    pub fn with_cores(mut self, cores: Option<usize>) -> Self {
        self.cores = cores;
        self
    }

    pub fn with_feature(mut self, feature: Arc<dyn FeatureMap>) -> Self {
        self.feature = Some(feature);
        self
    }

    pub fn with_idim(mut self, idim: usize) -> Self {
        self.idim = Some(idim);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn input_dim(&self) -> Option<usize> {
        self.idim.or_else(|| self.feature.as_ref().map(|f| f.input_dim()))
    }
}

impl fmt::Debug for DatasetOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetOptions")
            .field("tgen", &self.tgen.as_ref().map(|_| "<generator>"))
            .field("targs", &self.targs)
            .field("cores", &self.cores)
            .field("feature", &self.feature.as_ref().map(|f| f.package()))
            .field("idim", &self.idim)
            .field("seed", &self.seed)
            .finish()
    }
}

/// Rows and classes gathered from a set of patients
#[derive(Debug, Clone)]
pub struct IdcDataset {
    data: Vec<SparseVector>,
    classes: Vec<i32>,
    dim: usize,
    patients: Vec<PatientId>,
}

impl IdcDataset {
    /// Load `patients` from `store`, keeping each sample with probability `p`
    ///
    /// Patients are loaded in parallel but rows keep patient order. The
    /// subsample of a patient depends only on `options.seed` and the patient
    /// id. `task` receives one progress event per patient and is closed
    /// with a summary.
    pub fn build(
        store: &PatientStore,
        patients: &[PatientId],
        task: Task,
        p: f64,
        options: &DatasetOptions,
    ) -> Result<Self> {
        if !(p > 0.0 && p <= 1.0) {
            return Err(RFError::InvalidParameter(format!(
                "sampling proportion must be in (0, 1], got {p}"
            )));
        }
        if patients.is_empty() {
            return Err(RFError::EmptyDataset);
        }
        if options.tgen.is_some() && options.input_dim().is_none() {
            return Err(RFError::InvalidParameter(
                "a transform generator needs the raw input dimension".to_string(),
            ));
        }

        let total = patients.len();
        let loaded = AtomicUsize::new(0);
        let per_patient = parallel::install(options.cores, || {
            patients
                .par_iter()
                .map(|id| {
                    let rows = load_patient(store, id, p, options);
                    task.progress(loaded.fetch_add(1, Ordering::SeqCst) + 1, total);
                    rows
                })
                .collect::<Result<Vec<_>>>()
        })??;

        let mut data = Vec::new();
        let mut classes = Vec::new();
        for rows in per_patient {
            for (row, class) in rows {
                data.push(row);
                classes.push(class);
            }
        }

        let dim = match (&options.feature, options.idim) {
            (Some(feature), _) => feature.output_dim(),
            (None, Some(idim)) => idim,
            (None, None) => data.iter().map(SparseVector::dim_hint).max().unwrap_or(0),
        };

        task.done(&format!(
            "Loaded {} samples from {} patients",
            data.len(),
            total
        ));
        Ok(Self {
            data,
            classes,
            dim,
            patients: patients.to_vec(),
        })
    }

    /// Patients the rows were drawn from, in load order
    pub fn patients(&self) -> &[PatientId] {
        &self.patients
    }

    /// Count of rows per class, sorted by class
    pub fn class_counts(&self) -> Vec<(i32, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for &class in &self.classes {
            *counts.entry(class).or_insert(0) += 1;
        }
        counts.into_iter().collect()
    }
}

impl Dataset for IdcDataset {
    fn data(&self) -> &[SparseVector] {
        &self.data
    }

    fn classes(&self) -> &[i32] {
        &self.classes
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// Subsample, expand and map one patient's samples
fn load_patient(
    store: &PatientStore,
    id: &PatientId,
    p: f64,
    options: &DatasetOptions,
) -> Result<Vec<(SparseVector, i32)>> {
    let samples = store.load(id)?;
    let mut rng = StdRng::seed_from_u64(patient_seed(options.seed, id));

    let kept: Vec<Sample> = samples
        .into_iter()
        .filter(|_| p >= 1.0 || rng.gen::<f64>() < p)
        .collect();
    debug!("patient {id}: kept {} samples", kept.len());

    let mut rows = Vec::with_capacity(kept.len());
    for sample in kept {
        for row in expand(&sample.features, options)? {
            rows.push((row, sample.class));
        }
    }
    Ok(rows)
}

fn expand(x: &SparseVector, options: &DatasetOptions) -> Result<Vec<SparseVector>> {
    let idim = options.input_dim();
    if let Some(expected) = idim {
        let actual = x.dim_hint();
        if actual > expected {
            return Err(RFError::DimensionMismatch { expected, actual });
        }
    }

    // tgen requires idim, checked in build
    let (Some(tgen), Some(idim)) = (&options.tgen, idim) else {
        return Ok(vec![match &options.feature {
            Some(feature) => feature.transform(x)?,
            None => x.clone(),
        }]);
    };

    tgen(&x.to_dense(idim), &options.targs)?
        .iter()
        .map(|dense| match &options.feature {
            Some(feature) => feature.transform_dense(dense),
            None => Ok(SparseVector::from_dense(dense)),
        })
        .collect()
}

/// Seed for one patient's subsample, independent of load order
fn patient_seed(seed: u64, id: &PatientId) -> u64 {
    let mut hasher = Fnv1a::new();
    let bytes = id.as_str().as_bytes();
    hasher.write(&seed.to_le_bytes());
    hasher.write(&(bytes.len() as u64).to_le_bytes());
    hasher.write(bytes);
    hasher.finish()
}
