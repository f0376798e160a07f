//! Random-feature linear SVM experiments
//!
//! Raw samples are embedded with random Fourier or random binning features
//! so that a linear SVC trained on them behaves like a kernel machine.
//! Experiments split a directory of per-patient files into training and
//! held-out patients and score the classifier on both.
//!
//! ```no_run
//! use rfsvm::data::PatientStore;
//! use rfsvm::experiment::{make_datasets, make_feature, train, DatasetParams};
//! use rfsvm::features::FeatureType;
//! use rfsvm::kernel::KernelType;
//! use rfsvm::task::Task;
//! use std::sync::Arc;
//!
//! # fn main() -> rfsvm::core::Result<()> {
//! let main = Task::root("experiment");
//! let store = PatientStore::new("patches/");
//! let patients = store.discover()?;
//!
//! let (ftype, package) =
//!     make_feature(FeatureType::Fourier, KernelType::Gaussian, 5000, 7500, &main, None)?;
//! let params = DatasetParams {
//!     feature: Some(Arc::from(ftype.rebuild(&package, None)?)),
//!     ..DatasetParams::default()
//! };
//! let data = make_datasets(&store, &patients, &params, &main)?;
//! let model = train(&data.dataset, &main)?;
//! println!("{}", data.tester.run(&model)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod data;
pub mod experiment;
pub mod features;
pub mod kernel;
mod parallel;
pub mod persistence;
pub mod solver;
pub mod svc;
pub mod task;
pub mod tester;

// Re-export main types for convenience
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{RFError, Result};
pub use crate::experiment::{make_datasets, make_feature, train, DatasetParams, ExperimentData};
pub use crate::features::{FeatureMap, FeaturePackage, FeatureType};
pub use crate::kernel::KernelType;
pub use crate::svc::{LinearSVC, TrainedLinearSVC};
pub use crate::task::Task;
pub use crate::tester::{ClassifyReport, ClassifyTest};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
