//! Dual coordinate descent for linear SVMs
//!
//! Solves the dual of the L2-regularised squared hinge loss problem
//!
//! ```text
//! min_α  ½ αᵀ(Q + D)α − eᵀα   subject to α ≥ 0
//! ```
//!
//! with `Q_ij = y_i y_j x_iᵀx_j` and `D = I / (2C)`, one coordinate at a
//! time (Hsieh et al., "A Dual Coordinate Descent Method for Large-scale
//! Linear SVM", ICML 2008). The primal weights `w = Σ α_i y_i x_i` are
//! maintained incrementally so each coordinate step costs O(nnz(x_i)).

use crate::core::{LinearSvcConfig, OptimizationResult, RFError, Result, SparseVector};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Projected gradients below this are treated as zero
const GRADIENT_EPSILON: f64 = 1e-12;

/// Binary linear SVM solver
#[derive(Debug, Clone)]
pub struct DcdSolver {
    config: LinearSvcConfig,
}

impl DcdSolver {
    /// Create a solver with the given configuration
    pub fn new(config: LinearSvcConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LinearSvcConfig {
        &self.config
    }

    /// Solve for `data` with `targets` in {-1, +1}
    ///
    /// `dim` is the number of features; the returned weights have exactly
    /// that length, the intercept is reported separately.
    pub fn solve(
        &self,
        data: &[SparseVector],
        targets: &[f64],
        dim: usize,
    ) -> Result<OptimizationResult> {
        self.validate(data, targets, dim)?;

        let n = data.len();
        let c = self.config.c;
        let diag = 0.5 / c;
        let scaling = if self.config.fit_intercept {
            self.config.intercept_scaling
        } else {
            0.0
        };

        // Diagonal of Q + D, including the synthetic intercept feature
        let qd: Vec<f64> = data
            .iter()
            .map(|x| diag + x.norm_squared() + scaling * scaling)
            .collect();

        let mut alpha = vec![0.0; n];
        let mut weights = vec![0.0; dim];
        let mut bias_weight = 0.0;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut order: Vec<usize> = (0..n).collect();

        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.config.max_iterations {
            iterations += 1;
            order.shuffle(&mut rng);

            let mut pg_max = f64::NEG_INFINITY;
            let mut pg_min = f64::INFINITY;

            for &i in &order {
                let x = &data[i];
                let y = targets[i];

                let margin = x.dot_dense(&weights) + bias_weight * scaling;
                let gradient = y * margin - 1.0 + diag * alpha[i];

                // α has no upper bound for the squared hinge loss
                let projected = if alpha[i] == 0.0 {
                    gradient.min(0.0)
                } else {
                    gradient
                };
                pg_max = pg_max.max(projected);
                pg_min = pg_min.min(projected);

                if projected.abs() > GRADIENT_EPSILON {
                    let old = alpha[i];
                    alpha[i] = (old - gradient / qd[i]).max(0.0);
                    let delta = (alpha[i] - old) * y;
                    x.axpy_into(delta, &mut weights);
                    bias_weight += delta * scaling;
                }
            }

            if pg_max - pg_min <= self.config.tolerance {
                converged = true;
                break;
            }
        }

        if !bias_weight.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(RFError::OptimizationError(
                "weights diverged to a non-finite value".to_string(),
            ));
        }

        if converged {
            debug!("dual coordinate descent converged after {iterations} passes");
        } else {
            warn!(
                "dual coordinate descent reached {} passes without converging; \
                 consider increasing max_iterations",
                self.config.max_iterations
            );
        }

        let objective_value = 0.5
            * (weights.iter().map(|w| w * w).sum::<f64>() + bias_weight * bias_weight)
            + 0.5 * diag * alpha.iter().map(|a| a * a).sum::<f64>()
            - alpha.iter().sum::<f64>();

        Ok(OptimizationResult {
            alpha,
            weights,
            bias: bias_weight * scaling,
            iterations,
            converged,
            objective_value,
        })
    }

    fn validate(&self, data: &[SparseVector], targets: &[f64], dim: usize) -> Result<()> {
        if data.is_empty() {
            return Err(RFError::EmptyDataset);
        }
        if data.len() != targets.len() {
            return Err(RFError::InvalidDataset(format!(
                "{} samples but {} targets",
                data.len(),
                targets.len()
            )));
        }
        if let Some(&bad) = targets.iter().find(|&&y| y != 1.0 && y != -1.0) {
            return Err(RFError::InvalidDataset(format!(
                "binary targets must be -1 or +1, got {bad}"
            )));
        }
        if !(self.config.c > 0.0) {
            return Err(RFError::InvalidParameter(format!(
                "C must be positive, got {}",
                self.config.c
            )));
        }
        if !(self.config.tolerance > 0.0) {
            return Err(RFError::InvalidParameter(format!(
                "tolerance must be positive, got {}",
                self.config.tolerance
            )));
        }
        if self.config.max_iterations == 0 {
            return Err(RFError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if let Some(actual) = data.iter().map(SparseVector::dim_hint).find(|&d| d > dim) {
            return Err(RFError::DimensionMismatch {
                expected: dim,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn separable() -> (Vec<SparseVector>, Vec<f64>) {
        let data = vec![
            SparseVector::new(vec![0, 1], vec![2.0, 1.0]),
            SparseVector::new(vec![0, 1], vec![1.5, 2.0]),
            SparseVector::new(vec![0], vec![3.0]),
            SparseVector::new(vec![0, 1], vec![-2.0, -1.0]),
            SparseVector::new(vec![0, 1], vec![-1.0, -2.5]),
            SparseVector::new(vec![1], vec![-3.0]),
        ];
        let targets = vec![1.0, 1.0, 1.0, -1.0, -1.0, -1.0];
        (data, targets)
    }

    fn decision(result: &OptimizationResult, x: &SparseVector) -> f64 {
        x.dot_dense(&result.weights) + result.bias
    }

    #[test]
    fn test_separable_data() {
        let (data, targets) = separable();
        let result = DcdSolver::new(LinearSvcConfig::default())
            .solve(&data, &targets, 2)
            .unwrap();

        assert!(result.converged);
        assert_eq!(result.weights.len(), 2);
        for (x, &y) in data.iter().zip(&targets) {
            assert!(y * decision(&result, x) > 0.0);
        }
        assert!(result.alpha.iter().all(|&a| a >= 0.0));
    }

    #[test]
    fn test_weights_match_dual() {
        let (data, targets) = separable();
        let config = LinearSvcConfig {
            fit_intercept: false,
            ..LinearSvcConfig::default()
        };
        let result = DcdSolver::new(config).solve(&data, &targets, 2).unwrap();

        let mut expected = vec![0.0; 2];
        for ((x, &y), &a) in data.iter().zip(&targets).zip(&result.alpha) {
            x.axpy_into(a * y, &mut expected);
        }
        assert_relative_eq!(result.weights[0], expected[0], epsilon = 1e-9);
        assert_relative_eq!(result.weights[1], expected[1], epsilon = 1e-9);
        assert_eq!(result.bias, 0.0);
    }

    #[test]
    fn test_intercept_learned() {
        // Threshold at x = 5: needs a bias to separate
        let data: Vec<_> = [3.0, 4.0, 4.5, 5.5, 6.0, 7.0]
            .iter()
            .map(|&v| SparseVector::new(vec![0], vec![v]))
            .collect();
        let targets = vec![-1.0, -1.0, -1.0, 1.0, 1.0, 1.0];
        let config = LinearSvcConfig {
            c: 100.0,
            max_iterations: 20_000,
            ..LinearSvcConfig::default()
        };
        let result = DcdSolver::new(config).solve(&data, &targets, 1).unwrap();

        assert!(result.bias < 0.0);
        for (x, &y) in data.iter().zip(&targets) {
            assert!(y * decision(&result, x) > 0.0, "misclassified {x:?}");
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (data, targets) = separable();
        let config = LinearSvcConfig {
            seed: 7,
            ..LinearSvcConfig::default()
        };
        let a = DcdSolver::new(config.clone()).solve(&data, &targets, 2).unwrap();
        let b = DcdSolver::new(config).solve(&data, &targets, 2).unwrap();
        assert_eq!(a.alpha, b.alpha);
        assert_eq!(a.weights, b.weights);
    }

    #[test]
    fn test_iteration_cap() {
        let (data, targets) = separable();
        let config = LinearSvcConfig {
            max_iterations: 1,
            tolerance: 1e-12,
            ..LinearSvcConfig::default()
        };
        let result = DcdSolver::new(config).solve(&data, &targets, 2).unwrap();
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
    }

    #[test]
    fn test_objective_is_negative_at_optimum() {
        // α = 0 gives 0, so any useful solution lowers the dual objective
        let (data, targets) = separable();
        let result = DcdSolver::new(LinearSvcConfig::default())
            .solve(&data, &targets, 2)
            .unwrap();
        assert!(result.objective_value < 0.0);
    }

    #[test]
    fn test_non_finite_input_fails() {
        let data = vec![
            SparseVector::new(vec![0], vec![f64::NAN]),
            SparseVector::new(vec![0], vec![-1.0]),
        ];
        let result = DcdSolver::new(LinearSvcConfig::default()).solve(&data, &[1.0, -1.0], 1);
        assert!(matches!(result, Err(RFError::OptimizationError(_))));
    }

    #[test]
    fn test_invalid_inputs() {
        let solver = DcdSolver::new(LinearSvcConfig::default());
        let x = vec![SparseVector::new(vec![0], vec![1.0])];

        assert!(matches!(solver.solve(&[], &[], 1), Err(RFError::EmptyDataset)));
        assert!(matches!(
            solver.solve(&x, &[1.0, -1.0], 1),
            Err(RFError::InvalidDataset(_))
        ));
        assert!(matches!(
            solver.solve(&x, &[0.0], 1),
            Err(RFError::InvalidDataset(_))
        ));
        assert!(matches!(
            solver.solve(&x, &[1.0], 0),
            Err(RFError::DimensionMismatch { .. })
        ));

        let bad_c = DcdSolver::new(LinearSvcConfig {
            c: 0.0,
            ..LinearSvcConfig::default()
        });
        assert!(matches!(
            bad_c.solve(&x, &[1.0], 1),
            Err(RFError::InvalidParameter(_))
        ));
    }
}
