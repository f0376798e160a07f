//! Linear SVM solver implementations
//!
//! This module implements dual coordinate descent for the L2-regularised
//! squared hinge loss, the formulation scikit-learn's `LinearSVC` uses by
//! default.

pub mod dcd;

pub use self::dcd::*;
