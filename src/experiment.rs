//! Experiment entry points
//!
//! - [`train`]: fit the linear SVC on a dataset under a task
//! - [`make_feature`]: pick and sample a random feature generator
//! - [`make_datasets`]: split patients and build train/test data plus
//!   the two classification harnesses
//! - [`run_experiment`]: all of the above driven by an [`ExperimentConfig`]

use crate::config::ExperimentConfig;
use crate::core::{Dataset, LinearSvcConfig, RFError, Result};
use crate::data::patients::{select_head, select_tail, PatientId, PatientStore};
use crate::data::{DatasetOptions, IdcDataset, TransformArgs, TransformGenerator};
use crate::features::{
    approximation_error, ApproximationError, FeatureMap, FeatureOptions, FeaturePackage,
    FeatureType, RandomBinningFeature, RandomFourierFeature,
};
use crate::kernel::KernelType;
use crate::svc::{LinearSVC, TrainedLinearSVC};
use crate::task::Task;
use crate::tester::{ClassifyReport, ClassifyTest};
use log::{info, warn};
use std::fmt;
use std::sync::Arc;

/// Default number of random features
pub const DEFAULT_FDIM: usize = 5000;
/// Default raw input width (50×50 RGB patches)
pub const DEFAULT_IDIM: usize = 7500;

/// Description of the held-out harness
pub const TEST_DESCRIPTION: &str = "Classification experiment on new patients";
/// Description of the training-data harness
pub const DEBUG_DESCRIPTION: &str = "Classification verification on training data";

/// Fit a linear SVC with default parameters
///
/// Runs under a child task `RF SVC` of `task`, which is closed once the
/// classifier is fitted. Solver errors are returned as is.
pub fn train(dataset: &dyn Dataset, task: &Task) -> Result<TrainedLinearSVC> {
    train_with(dataset, &LinearSvcConfig::default(), task)
}

/// Fit a linear SVC with an explicit configuration
pub fn train_with(
    dataset: &dyn Dataset,
    config: &LinearSvcConfig,
    task: &Task,
) -> Result<TrainedLinearSVC> {
    let svc_task = task.subtask_named("RF SVC", Some("Computing RF SVC Classifier"));
    let model = LinearSVC::with_config(config.clone()).fit(dataset)?;
    svc_task.done("RFF SVC Computed");
    Ok(model)
}

/// Sample a feature generator and return its type and package
///
/// Fourier features use `kernel` and ignore `cores`; binning features
/// ignore `kernel` and keep `cores` for batch transforms. The generator
/// runs under a fresh child of `task` and closes it when sampling ends.
pub fn make_feature(
    ftype: FeatureType,
    kernel: KernelType,
    fdim: usize,
    idim: usize,
    task: &Task,
    cores: Option<usize>,
) -> Result<(FeatureType, FeaturePackage)> {
    make_feature_with(ftype, kernel, fdim, idim, task, cores, &FeatureOptions::default())
}

/// [`make_feature`] with explicit bandwidth and seed
pub fn make_feature_with(
    ftype: FeatureType,
    kernel: KernelType,
    fdim: usize,
    idim: usize,
    task: &Task,
    cores: Option<usize>,
    options: &FeatureOptions,
) -> Result<(FeatureType, FeaturePackage)> {
    let package = match ftype {
        FeatureType::Fourier => {
            RandomFourierFeature::with_options(idim, fdim, kernel, options, task.subtask())?
                .mp_package()
        }
        FeatureType::Binning => {
            RandomBinningFeature::with_options(idim, fdim, options, task.subtask(), cores)?
                .mp_package()
        }
    };
    Ok((ftype, package))
}

/// [`make_feature`] from single-character codes
///
/// The feature code is checked before anything is sampled. The kernel code
/// only matters for Fourier features and is not checked otherwise.
pub fn make_feature_from_codes(
    ftype: char,
    kernel: char,
    fdim: usize,
    idim: usize,
    task: &Task,
    cores: Option<usize>,
) -> Result<(FeatureType, FeaturePackage)> {
    let ftype = FeatureType::from_code(ftype)?;
    let kernel = match ftype {
        FeatureType::Fourier => KernelType::from_code(kernel)?,
        FeatureType::Binning => KernelType::default(),
    };
    make_feature(ftype, kernel, fdim, idim, task, cores)
}

/// Knobs for [`make_datasets`]
#[derive(Clone)]
pub struct DatasetParams {
    /// Worker threads for loading
    pub cores: Option<usize>,
    /// Feature map applied to every row
    pub feature: Option<Arc<dyn FeatureMap>>,
    /// Sample expander and its arguments
    pub tgen: Option<TransformGenerator>,
    pub targs: TransformArgs,
    /// Training patients, `patients[:ntrain]`
    pub ntrain: isize,
    /// Test patients, `patients[-ntest:]`
    pub ntest: isize,
    /// Fraction of training samples kept
    pub ptrain: f64,
    /// Fraction of test samples kept
    pub ptest: f64,
    /// Raw input width when no feature map gives one
    pub idim: Option<usize>,
    /// Subsampling seed
    pub seed: u64,
}

impl Default for DatasetParams {
    fn default() -> Self {
        Self {
            cores: None,
            feature: None,
            tgen: None,
            targs: TransformArgs::new(),
            ntrain: -25,
            ntest: 25,
            ptrain: 0.01,
            ptest: 0.1,
            idim: None,
            seed: 0,
        }
    }
}

impl DatasetParams {
    fn options(&self) -> DatasetOptions {
        DatasetOptions {
            tgen: self.tgen.clone(),
            targs: self.targs.clone(),
            cores: self.cores,
            feature: self.feature.clone(),
            idim: self.idim,
            seed: self.seed,
        }
    }
}

impl fmt::Debug for DatasetParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetParams")
            .field("options", &self.options())
            .field("ntrain", &self.ntrain)
            .field("ntest", &self.ntest)
            .field("ptrain", &self.ptrain)
            .field("ptest", &self.ptest)
            .finish()
    }
}

/// Everything [`make_datasets`] builds
#[derive(Debug, Clone)]
pub struct ExperimentData {
    pub dataset: IdcDataset,
    pub test_dataset: IdcDataset,
    /// Held-out harness on the test patients
    pub tester: ClassifyTest,
    /// Sanity harness on the training data
    pub debugtester: ClassifyTest,
}

impl From<ExperimentData> for (IdcDataset, IdcDataset, ClassifyTest, ClassifyTest) {
    fn from(data: ExperimentData) -> Self {
        (data.dataset, data.test_dataset, data.tester, data.debugtester)
    }
}

/// Split `patients`, build both datasets and their harnesses
///
/// Training rows come from `patients[:ntrain]` subsampled at `ptrain`,
/// test rows from `patients[-ntest:]` at `ptest`; both share the feature
/// map, transform generator and core count. Training data is built first,
/// each under its own child task of `main`.
pub fn make_datasets(
    store: &PatientStore,
    patients: &[PatientId],
    params: &DatasetParams,
    main: &Task,
) -> Result<ExperimentData> {
    let train_patients = select_head(patients, params.ntrain);
    let test_patients = select_tail(patients, params.ntest);
    if train_patients.is_empty() {
        return Err(RFError::InvalidParameter(format!(
            "ntrain = {} selects no patients out of {}",
            params.ntrain,
            patients.len()
        )));
    }
    if test_patients.is_empty() {
        return Err(RFError::InvalidParameter(format!(
            "ntest = {} selects no patients out of {}",
            params.ntest,
            patients.len()
        )));
    }
    info!(
        "{} training patients, {} test patients",
        train_patients.len(),
        test_patients.len()
    );

    let options = params.options();
    let dataset = IdcDataset::build(
        store,
        &train_patients,
        main.subtask_named("training data", Some("Loading training patients")),
        params.ptrain,
        &options,
    )?;
    let test_dataset = IdcDataset::build(
        store,
        &test_patients,
        main.subtask_named("test data", Some("Loading test patients")),
        params.ptest,
        &options,
    )?;

    let tester = ClassifyTest::new(
        test_dataset.data().to_vec(),
        test_dataset.classes().to_vec(),
        TEST_DESCRIPTION,
    );
    let debugtester = ClassifyTest::new(
        dataset.data().to_vec(),
        dataset.classes().to_vec(),
        DEBUG_DESCRIPTION,
    );

    Ok(ExperimentData {
        dataset,
        test_dataset,
        tester,
        debugtester,
    })
}

/// Results of [`run_experiment`]
#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    pub model: TrainedLinearSVC,
    /// Package of the feature map the model was trained on
    pub package: Option<FeaturePackage>,
    /// Held-out patients
    pub report: ClassifyReport,
    /// Training data
    pub train_report: ClassifyReport,
    pub approximation: Option<ApproximationError>,
}

/// Run a complete experiment on the patients in `store`
///
/// Samples the feature map, builds both datasets, trains, and scores the
/// model on the test and training harnesses.
pub fn run_experiment(
    config: &ExperimentConfig,
    store: &PatientStore,
    main: &Task,
) -> Result<ExperimentOutcome> {
    let patients = store.discover()?;
    if patients.is_empty() {
        return Err(RFError::InvalidDataset(format!(
            "no patient files under {}",
            store.root().display()
        )));
    }

    let mut package = None;
    let mut feature: Option<Arc<dyn FeatureMap>> = None;
    if config.feature.enabled {
        let (ftype, sampled) = make_feature_with(
            config.feature.feature_type,
            config.feature.kernel,
            config.feature.fdim,
            config.feature.idim,
            main,
            config.cores,
            &config.feature.options(),
        )?;
        feature = Some(Arc::from(ftype.rebuild(&sampled, config.cores)?));
        package = Some(sampled);
    }

    let approximation = match (&feature, &package) {
        (Some(feature), Some(package)) if config.diagnostic_samples > 0 => {
            diagnose(store, &patients, feature.as_ref(), package, config.diagnostic_samples)?
        }
        _ => None,
    };

    let data = make_datasets(store, &patients, &config.dataset_params(feature)?, main)?;
    let model = train_with(&data.dataset, &config.svc, main)?;
    let report = data.tester.run(&model)?;
    let train_report = data.debugtester.run(&model)?;

    Ok(ExperimentOutcome {
        model,
        package,
        report,
        train_report,
        approximation,
    })
}

/// Compare the feature map with its exact kernel on the first raw samples
fn diagnose(
    store: &PatientStore,
    patients: &[PatientId],
    feature: &dyn FeatureMap,
    package: &FeaturePackage,
    count: usize,
) -> Result<Option<ApproximationError>> {
    let mut samples = Vec::with_capacity(count);
    for id in patients {
        if samples.len() >= count {
            break;
        }
        let remaining = count - samples.len();
        samples.extend(
            store
                .load(id)?
                .into_iter()
                .take(remaining)
                .map(|sample| sample.features),
        );
    }
    if samples.is_empty() {
        warn!("no samples available for the kernel approximation check");
        return Ok(None);
    }

    let error = approximation_error(feature, package.exact_kernel()?.as_ref(), &samples)?;
    info!(
        "kernel approximation over {} pairs: mean |error| {:.4}, max {:.4}",
        error.pairs, error.mean_abs, error.max_abs
    );
    Ok(Some(error))
}
