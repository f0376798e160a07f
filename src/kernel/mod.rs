//! Exact kernel functions
//!
//! Random features only approximate these; the exact forms are kept for
//! approximation diagnostics and to document what each feature targets.

pub mod gaussian;
pub mod kind;
pub mod laplacian;
pub mod traits;

pub use self::gaussian::*;
pub use self::kind::*;
pub use self::laplacian::*;
pub use self::traits::*;
