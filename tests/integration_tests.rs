//! Integration tests for the rfsvm library
//!
//! These tests run the experiment entry points end to end over temporary
//! patient directories.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rfsvm::config::ExperimentConfig;
use rfsvm::data::{transforms, IdcDataset, PatientId, PatientStore, TransformArgs};
use rfsvm::experiment::{
    make_datasets, make_feature, make_feature_with, run_experiment, train, DEBUG_DESCRIPTION,
    TEST_DESCRIPTION,
};
use rfsvm::features::{FeatureOptions, FeatureType};
use rfsvm::kernel::KernelType;
use rfsvm::persistence::SavedModel;
use rfsvm::task::{Task, TaskEventKind};
use rfsvm::{Classifier, ClassifyTest, Dataset, DatasetParams, LinearSvcConfig, RFError};
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;

/// Write `n` patients with `per_patient` samples each
///
/// Class 1 samples have a first coordinate in [0.6, 1], class 0 in
/// [0, 0.4]; the second coordinate is noise.
fn patient_dir(n: usize, per_patient: usize) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut rng = StdRng::seed_from_u64(1);
    for i in 0..n {
        let path = dir.path().join(format!("patient{i:03}.libsvm"));
        let mut file = fs::File::create(path).expect("Failed to create patient file");
        for j in 0..per_patient {
            let class = j % 2;
            let x0 = if class == 1 {
                rng.gen_range(0.6..1.0)
            } else {
                rng.gen_range(0.0..0.4)
            };
            let x1: f64 = rng.gen();
            writeln!(file, "{class} 1:{x0} 2:{x1}").expect("Failed to write");
        }
    }
    dir
}

fn params(ntrain: isize, ntest: isize) -> DatasetParams {
    DatasetParams {
        ntrain,
        ntest,
        ptrain: 1.0,
        ptest: 1.0,
        cores: Some(2),
        ..DatasetParams::default()
    }
}

/// Test complete workflow: features -> datasets -> training -> evaluation
#[test]
fn test_complete_workflow_fourier() {
    let dir = patient_dir(8, 30);
    let store = PatientStore::new(dir.path());
    let patients = store.discover().unwrap();
    let main = Task::root("experiment");

    let (ftype, package) = make_feature_with(
        FeatureType::Fourier,
        KernelType::Gaussian,
        300,
        2,
        &main,
        None,
        &FeatureOptions::new().with_bandwidth(0.5).with_seed(3),
    )
    .unwrap();
    let feature = Arc::from(ftype.rebuild(&package, None).unwrap());

    let data = make_datasets(
        &store,
        &patients,
        &DatasetParams {
            feature: Some(feature),
            ..params(-3, 3)
        },
        &main,
    )
    .unwrap();

    assert_eq!(data.dataset.len(), 150);
    assert_eq!(data.test_dataset.len(), 90);
    assert_eq!(data.dataset.dim(), 300);

    let model = train(&data.dataset, &main).unwrap();
    let report = data.tester.run(&model).unwrap();
    assert_eq!(report.description, TEST_DESCRIPTION);
    assert!(report.accuracy() >= 0.9, "{report}");

    let train_report = data.debugtester.run(&model).unwrap();
    assert_eq!(train_report.description, DEBUG_DESCRIPTION);
    assert!(train_report.accuracy() >= 0.9, "{train_report}");
}

#[test]
fn test_complete_workflow_binning() {
    let dir = patient_dir(6, 30);
    let store = PatientStore::new(dir.path());
    let patients = store.discover().unwrap();
    let main = Task::root("experiment");

    let (ftype, package) = make_feature_with(
        FeatureType::Binning,
        KernelType::Laplacian,
        300,
        2,
        &main,
        Some(2),
        &FeatureOptions::new().with_bandwidth(0.5).with_seed(5),
    )
    .unwrap();
    let feature = Arc::from(ftype.rebuild(&package, Some(2)).unwrap());

    let data = make_datasets(
        &store,
        &patients,
        &DatasetParams {
            feature: Some(feature),
            ..params(4, 2)
        },
        &main,
    )
    .unwrap();

    let model = train(&data.dataset, &main).unwrap();
    assert!(data.tester.run(&model).unwrap().accuracy() >= 0.85);
}

/// `ntrain = -25, ntest = 25` over 60 patients: first 35 train, last 25 test
#[test]
fn test_default_patient_split() {
    let dir = patient_dir(60, 4);
    let store = PatientStore::new(dir.path());
    let patients = store.discover().unwrap();
    assert_eq!(patients.len(), 60);

    let data = make_datasets(&store, &patients, &params(-25, 25), &Task::root("main")).unwrap();

    assert_eq!(data.dataset.patients(), &patients[..35]);
    assert_eq!(data.test_dataset.patients(), &patients[35..]);
    assert_eq!(data.tester.len(), 100);
    assert_eq!(data.debugtester.len(), 140);

    // the 4-tuple view keeps the same order
    let (train_set, test_set, tester, debugtester): (
        IdcDataset,
        IdcDataset,
        ClassifyTest,
        ClassifyTest,
    ) = data.into();
    assert_eq!(train_set.len(), debugtester.len());
    assert_eq!(test_set.len(), tester.len());
    assert_eq!(tester.description(), TEST_DESCRIPTION);
}

#[test]
fn test_dataset_subtasks_are_labelled_in_order() {
    let dir = patient_dir(4, 4);
    let store = PatientStore::new(dir.path());
    let patients = store.discover().unwrap();
    let main = Task::root("main");

    make_datasets(&store, &patients, &params(2, 2), &main).unwrap();

    let started: Vec<String> = main
        .events()
        .into_iter()
        .filter(|e| matches!(e.kind, TaskEventKind::Started { .. }))
        .map(|e| e.path)
        .collect();
    assert_eq!(started, vec!["main", "main/training data", "main/test data"]);
}

#[test]
fn test_proportions_subsample_each_split() {
    let dir = patient_dir(10, 100);
    let store = PatientStore::new(dir.path());
    let patients = store.discover().unwrap();
    let params = DatasetParams {
        ptrain: 0.1,
        ptest: 0.5,
        seed: 9,
        ..params(5, 5)
    };

    let first = make_datasets(&store, &patients, &params, &Task::root("a")).unwrap();
    let second = make_datasets(&store, &patients, &params, &Task::root("b")).unwrap();

    // 500 samples on each side
    assert!(first.dataset.len() > 20 && first.dataset.len() < 90, "{}", first.dataset.len());
    assert!(first.test_dataset.len() > 200 && first.test_dataset.len() < 300);
    assert_eq!(first.dataset.data(), second.dataset.data());
    assert_eq!(first.test_dataset.classes(), second.test_dataset.classes());
}

#[test]
fn test_empty_selection_is_rejected() {
    let dir = patient_dir(5, 2);
    let store = PatientStore::new(dir.path());
    let patients = store.discover().unwrap();
    let main = Task::root("main");

    for (ntrain, ntest) in [(-5, 2), (0, 2), (2, 0), (2, -5)] {
        assert!(
            matches!(
                make_datasets(&store, &patients, &params(ntrain, ntest), &main),
                Err(RFError::InvalidParameter(_))
            ),
            "ntrain {ntrain}, ntest {ntest}"
        );
    }
}

#[test]
fn test_transform_generator_shared_by_both_splits() {
    let dir = patient_dir(4, 10);
    let store = PatientStore::new(dir.path());
    let patients = store.discover().unwrap();
    let mut targs = TransformArgs::new();
    targs.insert("amount".to_string(), 0.01);

    let data = make_datasets(
        &store,
        &patients,
        &DatasetParams {
            tgen: Some(transforms::jitter()),
            targs,
            idim: Some(2),
            ..params(2, 2)
        },
        &Task::root("main"),
    )
    .unwrap();

    assert_eq!(data.dataset.len(), 40);
    assert_eq!(data.test_dataset.len(), 40);
}

#[test]
fn test_feature_package_reproduces_datasets() {
    let dir = patient_dir(4, 10);
    let store = PatientStore::new(dir.path());
    let patients: Vec<PatientId> = store.discover().unwrap();
    let main = Task::root("main");

    let (ftype, package) =
        make_feature(FeatureType::Fourier, KernelType::Laplacian, 32, 2, &main, None).unwrap();
    let build = || {
        let feature = Arc::from(ftype.rebuild(&package, None).unwrap());
        make_datasets(
            &store,
            &patients,
            &DatasetParams {
                feature: Some(feature),
                ..params(2, 2)
            },
            &main,
        )
        .unwrap()
    };

    assert_eq!(build().dataset.data(), build().dataset.data());
}

#[test]
fn test_run_experiment_and_save_model() {
    let dir = patient_dir(6, 20);
    let store = PatientStore::new(dir.path());
    let config = ExperimentConfig::from_json(
        r#"{
            "feature": { "feature_type": "fourier", "fdim": 200, "idim": 2, "bandwidth": 0.5, "seed": 1 },
            "dataset": { "ntrain": -2, "ntest": 2, "ptrain": 1.0, "ptest": 1.0 },
            "cores": 2,
            "diagnostic_samples": 10
        }"#,
    )
    .unwrap();

    let outcome = run_experiment(&config, &store, &Task::root("main")).unwrap();
    assert!(outcome.report.accuracy() >= 0.9, "{}", outcome.report);
    let approximation = outcome.approximation.expect("diagnostics requested");
    assert_eq!(approximation.pairs, 55);
    assert!(approximation.mean_abs < 0.2, "{approximation:?}");

    let saved = SavedModel::from_trained_model(
        &outcome.model,
        outcome.package.clone(),
        &LinearSvcConfig::default(),
    );
    let file = dir.path().join("model.json");
    saved.save_to_file(&file).unwrap();

    let loaded = SavedModel::load_from_file(&file).unwrap();
    let model = loaded.to_trained_model().unwrap();
    let feature = loaded.to_feature_map(None).unwrap().unwrap();
    let x = feature.transform_dense(&[0.9, 0.2]).unwrap();
    assert_eq!(model.predict(&x), outcome.model.predict(&x));
    assert_eq!(model.predict(&x).class, 1);
}

#[test]
fn test_run_experiment_raw() {
    let dir = patient_dir(4, 20);
    let store = PatientStore::new(dir.path());
    let mut config = ExperimentConfig::default();
    config.feature.enabled = false;
    config.dataset.ntrain = 3;
    config.dataset.ntest = 1;
    config.dataset.ptrain = 1.0;
    config.dataset.ptest = 1.0;

    let outcome = run_experiment(&config, &store, &Task::root("main")).unwrap();
    assert!(outcome.package.is_none());
    assert!(outcome.approximation.is_none());
    assert_eq!(outcome.model.n_features(), 2);
    assert!(outcome.train_report.accuracy() >= 0.9);
}

#[test]
fn test_run_experiment_empty_directory() {
    let dir = TempDir::new().unwrap();
    let result = run_experiment(
        &ExperimentConfig::default(),
        &PatientStore::new(dir.path()),
        &Task::root("main"),
    );
    assert!(matches!(result, Err(RFError::InvalidDataset(_))));
}
