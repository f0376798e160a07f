//! Worker pools sized by the `cores` knob

use crate::core::{RFError, Result};
use rayon::ThreadPoolBuilder;

/// Run `op` inside a rayon pool with `cores` threads
///
/// `None` lets rayon pick (one thread per logical CPU).
pub(crate) fn install<R, F>(cores: Option<usize>, op: F) -> Result<R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    if cores == Some(0) {
        return Err(RFError::InvalidParameter(
            "cores must be at least 1".to_string(),
        ));
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(cores.unwrap_or(0))
        .build()
        .map_err(|e| RFError::InvalidParameter(format!("cannot build worker pool: {e}")))?;

    Ok(pool.install(op))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_uses_requested_threads() {
        let threads = install(Some(2), rayon::current_num_threads).unwrap();
        assert_eq!(threads, 2);
    }

    #[test]
    fn test_install_rejects_zero_cores() {
        assert!(matches!(
            install(Some(0), || ()),
            Err(RFError::InvalidParameter(_))
        ));
    }
}
