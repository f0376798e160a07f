//! Data loading and dataset implementations
//!
//! Patient files are read through the LibSVM and CSV loaders, gathered by
//! the [`PatientStore`] and assembled into experiment datasets by
//! [`IdcDataset`].

pub mod csv;
pub mod idc;
pub mod libsvm;
pub mod patients;
pub mod transforms;

pub use self::csv::*;
pub use self::idc::*;
pub use self::libsvm::*;
pub use self::patients::*;
pub use self::transforms::{TransformArgs, TransformGenerator};
