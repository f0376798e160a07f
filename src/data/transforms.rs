//! Sample transform generators
//!
//! A generator expands one raw sample into one or more derived samples
//! (augmentations). Generators receive the dense sample and a bag of
//! numeric arguments so they can be configured from JSON or the CLI.

use crate::core::{RFError, Result};
use crate::features::binning::Fnv1a;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Named numeric arguments for a transform generator
pub type TransformArgs = BTreeMap<String, f64>;

/// Shared sample expander: `(sample, args) -> derived samples`
pub type TransformGenerator =
    Arc<dyn Fn(&[f64], &TransformArgs) -> Result<Vec<Vec<f64>>> + Send + Sync>;

/// Names accepted by [`by_name`]
pub const BUILTIN_TRANSFORMS: [&str; 3] = ["identity", "dihedral", "jitter"];

/// Look up a built-in generator
pub fn by_name(name: &str) -> Result<TransformGenerator> {
    match name {
        "identity" => Ok(identity()),
        "dihedral" => Ok(dihedral()),
        "jitter" => Ok(jitter()),
        other => Err(RFError::InvalidParameter(format!(
            "unknown transform '{other}', expected one of {}",
            BUILTIN_TRANSFORMS.join(", ")
        ))),
    }
}

/// The sample itself, unchanged
pub fn identity() -> TransformGenerator {
    Arc::new(|x: &[f64], _: &TransformArgs| Ok(vec![x.to_vec()]))
}

/// All 8 rotations and reflections of a square image
///
/// Samples are row-major `side × side × channels`. Arguments: `side`
/// (required), `channels` (default 1).
pub fn dihedral() -> TransformGenerator {
    Arc::new(|x: &[f64], args: &TransformArgs| {
        let side = count_arg(args, "side", None)?;
        let channels = count_arg(args, "channels", Some(1))?;
        let expected = side
            .checked_mul(side)
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or_else(|| {
                RFError::InvalidParameter(format!(
                    "image of side {side} with {channels} channels is too large"
                ))
            })?;
        if x.len() != expected {
            return Err(RFError::DimensionMismatch {
                expected,
                actual: x.len(),
            });
        }

        let image = Image { x, side, channels };
        Ok((0..8).map(|symmetry| image.map(symmetry)).collect())
    })
}

/// The sample plus a copy with uniform noise in `[-amount, amount)`
///
/// Arguments: `amount` (default 0.01), `seed` (default 0). Noise is seeded
/// from `seed` and the sample's contents, so it does not depend on the
/// order in which samples are visited.
pub fn jitter() -> TransformGenerator {
    Arc::new(|x: &[f64], args: &TransformArgs| {
        let amount = args.get("amount").copied().unwrap_or(0.01);
        if !amount.is_finite() || amount < 0.0 {
            return Err(RFError::InvalidParameter(format!(
                "jitter amount must be non-negative, got {amount}"
            )));
        }
        let seed = count_arg(args, "seed", Some(0))? as u64;

        let mut hasher = Fnv1a::new();
        hasher.write(&seed.to_le_bytes());
        for value in x {
            hasher.write(&value.to_bits().to_le_bytes());
        }
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        let noisy = x
            .iter()
            .map(|&v| v + amount * (2.0 * rng.gen::<f64>() - 1.0))
            .collect();
        Ok(vec![x.to_vec(), noisy])
    })
}

/// Read a non-negative integral argument
fn count_arg(args: &TransformArgs, key: &str, default: Option<usize>) -> Result<usize> {
    match (args.get(key), default) {
        (Some(&value), _) if value >= 0.0 && value.fract() == 0.0 => Ok(value as usize),
        (Some(value), _) => Err(RFError::InvalidParameter(format!(
            "argument '{key}' must be a non-negative integer, got {value}"
        ))),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(RFError::InvalidParameter(format!(
            "missing argument '{key}'"
        ))),
    }
}

struct Image<'a> {
    x: &'a [f64],
    side: usize,
    channels: usize,
}

impl Image<'_> {
    /// Apply symmetry `0..8`: rotation by `symmetry % 4` quarter turns,
    /// preceded by a horizontal flip when `symmetry >= 4`
    fn map(&self, symmetry: usize) -> Vec<f64> {
        let n = self.side;
        let mut out = Vec::with_capacity(self.x.len());
        for row in 0..n {
            for col in 0..n {
                let (r, c) = match symmetry % 4 {
                    0 => (row, col),
                    1 => (n - 1 - col, row),
                    2 => (n - 1 - row, n - 1 - col),
                    _ => (col, n - 1 - row),
                };
                let c = if symmetry >= 4 { n - 1 - c } else { c };
                let start = (r * n + c) * self.channels;
                out.extend_from_slice(&self.x[start..start + self.channels]);
            }
        }
        out
    }
}
