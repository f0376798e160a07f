//! Linear support vector classification
//!
//! [`LinearSVC`] is the builder; fitting it returns a [`TrainedLinearSVC`]
//! that implements [`Classifier`]. Two classes give a single weight vector
//! with the larger class as the positive side; more classes are handled
//! one-vs-rest.

use crate::core::{
    Classifier, Dataset, LinearSvcConfig, Prediction, RFError, Result, SparseVector,
};
use crate::solver::DcdSolver;
use log::{debug, info};
use rayon::prelude::*;

/// Linear SVC with builder-style configuration
#[derive(Debug, Clone, Default)]
pub struct LinearSVC {
    config: LinearSvcConfig,
}

impl LinearSVC {
    /// Create a classifier with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier from an explicit configuration
    pub fn with_config(config: LinearSvcConfig) -> Self {
        Self { config }
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set convergence tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Set maximum number of passes over the data
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the coordinate permutation seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Enable or disable the intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.config.fit_intercept = fit_intercept;
        self
    }

    pub fn config(&self) -> &LinearSvcConfig {
        &self.config
    }

    /// Train on a dataset
    pub fn fit(&self, dataset: &dyn Dataset) -> Result<TrainedLinearSVC> {
        let data = dataset.data();
        let labels = dataset.classes();
        if data.len() != labels.len() {
            return Err(RFError::InvalidDataset(format!(
                "{} samples but {} classes",
                data.len(),
                labels.len()
            )));
        }
        if data.is_empty() {
            return Err(RFError::EmptyDataset);
        }

        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(RFError::InvalidDataset(format!(
                "need at least two classes, found {classes:?}"
            )));
        }

        // Binary problems train one separator for classes[1]
        let positives = if classes.len() == 2 {
            &classes[1..]
        } else {
            &classes[..]
        };

        let dim = dataset.dim();
        let solver = DcdSolver::new(self.config.clone());
        debug!(
            "fitting {} separator(s) on {} samples of dimension {dim}",
            positives.len(),
            data.len()
        );

        let results = positives
            .par_iter()
            .map(|&positive| {
                let targets: Vec<f64> = labels
                    .iter()
                    .map(|&class| if class == positive { 1.0 } else { -1.0 })
                    .collect();
                solver.solve(data, &targets, dim)
            })
            .collect::<Result<Vec<_>>>()?;

        let iterations = results.iter().map(|r| r.iterations).max().unwrap_or(0);
        let converged = results.iter().all(|r| r.converged);
        let (weights, biases) = results.into_iter().map(|r| (r.weights, r.bias)).unzip();

        info!(
            "trained linear SVC on {} samples, {} classes, {iterations} passes",
            data.len(),
            classes.len()
        );

        Ok(TrainedLinearSVC {
            classes,
            weights,
            biases,
            dim,
            iterations,
            converged,
        })
    }
}

/// Fitted linear SVC
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedLinearSVC {
    classes: Vec<i32>,
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
    dim: usize,
    iterations: usize,
    converged: bool,
}

impl TrainedLinearSVC {
    /// Reassemble a model from stored parameters
    ///
    /// Binary models carry one separator, others one per class.
    pub fn from_parts(classes: Vec<i32>, weights: Vec<Vec<f64>>, biases: Vec<f64>) -> Result<Self> {
        let expected = match classes.len() {
            0 | 1 => {
                return Err(RFError::InvalidDataset(format!(
                    "need at least two classes, found {classes:?}"
                )))
            }
            2 => 1,
            n => n,
        };
        if weights.len() != expected || biases.len() != expected {
            return Err(RFError::DimensionMismatch {
                expected,
                actual: weights.len().max(biases.len()),
            });
        }
        if classes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(RFError::InvalidDataset(
                "classes must be sorted and distinct".to_string(),
            ));
        }

        let dim = weights[0].len();
        if let Some(row) = weights.iter().find(|w| w.len() != dim) {
            return Err(RFError::DimensionMismatch {
                expected: dim,
                actual: row.len(),
            });
        }

        Ok(Self {
            classes,
            weights,
            biases,
            dim,
            iterations: 0,
            converged: true,
        })
    }

    /// One score per separator; for binary models a single score whose
    /// sign selects `classes[1]` when positive
    pub fn decision_function(&self, x: &SparseVector) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| x.dot_dense(w) + b)
            .collect()
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Passes used by the slowest separator
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether every separator met the tolerance
    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl Classifier for TrainedLinearSVC {
    fn predict(&self, x: &SparseVector) -> Prediction {
        let scores = self.decision_function(x);
        if let [score] = scores[..] {
            let class = if score > 0.0 {
                self.classes[1]
            } else {
                self.classes[0]
            };
            return Prediction::new(class, score);
        }

        let (best, score) = scores
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, s)| {
                if s > best.1 {
                    (i, s)
                } else {
                    best
                }
            });
        Prediction::new(self.classes[best], score)
    }

    fn predict_batch(&self, xs: &[SparseVector]) -> Vec<Prediction> {
        xs.par_iter().map(|x| self.predict(x)).collect()
    }

    fn classes(&self) -> &[i32] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDataset {
        data: Vec<SparseVector>,
        classes: Vec<i32>,
        dim: usize,
    }

    impl Dataset for MockDataset {
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

    fn points(rows: &[(f64, f64, i32)]) -> MockDataset {
        MockDataset {
            data: rows
                .iter()
                .map(|&(a, b, _)| SparseVector::from_dense(&[a, b]))
                .collect(),
            classes: rows.iter().map(|&(_, _, c)| c).collect(),
            dim: 2,
        }
    }

    #[test]
    fn test_binary_keeps_original_labels() {
        let dataset = points(&[
            (2.0, 2.0, 7),
            (3.0, 1.5, 7),
            (2.5, 3.0, 7),
            (-2.0, -2.0, 3),
            (-3.0, -1.0, 3),
            (-1.5, -2.5, 3),
        ]);
        let model = LinearSVC::new().fit(&dataset).unwrap();

        assert_eq!(model.classes(), &[3, 7]);
        assert_eq!(model.weights().len(), 1);
        assert_eq!(model.n_features(), 2);

        let predictions = model.predict_batch(dataset.data());
        let predicted: Vec<i32> = predictions.iter().map(|p| p.class).collect();
        assert_eq!(predicted, dataset.classes);
        assert!(predictions[0].decision_value > 0.0);
        assert!(predictions[3].decision_value < 0.0);
    }

    #[test]
    fn test_one_vs_rest() {
        let dataset = points(&[
            (5.0, 0.0, 0),
            (6.0, 0.5, 0),
            (0.0, 5.0, 1),
            (0.5, 6.0, 1),
            (-5.0, -5.0, 2),
            (-6.0, -5.5, 2),
        ]);
        let model = LinearSVC::new().with_c(10.0).fit(&dataset).unwrap();

        assert_eq!(model.weights().len(), 3);
        assert_eq!(model.decision_function(&dataset.data[0]).len(), 3);
        for (x, &class) in dataset.data.iter().zip(&dataset.classes) {
            assert_eq!(model.predict(x).class, class);
        }
    }

    #[test]
    fn test_single_class_rejected() {
        let dataset = points(&[(1.0, 0.0, 1), (2.0, 0.0, 1)]);
        assert!(matches!(
            LinearSVC::new().fit(&dataset),
            Err(RFError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut dataset = points(&[(1.0, 0.0, 1), (-1.0, 0.0, 0)]);
        dataset.classes.pop();
        assert!(matches!(
            LinearSVC::new().fit(&dataset),
            Err(RFError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_solver_errors_propagate() {
        let dataset = points(&[(1.0, 0.0, 1), (-1.0, 0.0, 0)]);
        assert!(matches!(
            LinearSVC::new().with_c(-1.0).fit(&dataset),
            Err(RFError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let dataset = points(&[
            (1.0, 0.2, 1),
            (0.8, -0.1, 1),
            (-0.9, 0.3, 0),
            (-1.1, -0.2, 0),
            (0.1, 0.1, 1),
            (-0.1, 0.0, 0),
        ]);
        let svc = LinearSVC::new().with_seed(5).with_tolerance(1e-6);
        assert_eq!(svc.fit(&dataset).unwrap(), svc.fit(&dataset).unwrap());
    }

    #[test]
    fn test_from_parts_validation() {
        let model =
            TrainedLinearSVC::from_parts(vec![0, 1], vec![vec![1.0, -1.0]], vec![0.5]).unwrap();
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.predict(&SparseVector::from_dense(&[1.0, 0.0])).class, 1);
        assert_eq!(model.predict(&SparseVector::from_dense(&[0.0, 1.0])).class, 0);

        assert!(TrainedLinearSVC::from_parts(vec![1], vec![vec![1.0]], vec![0.0]).is_err());
        assert!(TrainedLinearSVC::from_parts(vec![1, 0], vec![vec![1.0]], vec![0.0]).is_err());
        assert!(TrainedLinearSVC::from_parts(
            vec![0, 1, 2],
            vec![vec![1.0], vec![1.0, 2.0], vec![0.0]],
            vec![0.0; 3]
        )
        .is_err());
    }
}
