//! Classification harness
//!
//! A [`ClassifyTest`] holds a fixed set of labelled vectors and scores any
//! [`Classifier`] against them.

use crate::core::{Classifier, RFError, Result, SparseVector};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary evaluation metrics for one positive class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    pub fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    /// Calculate accuracy: (TP + TN) / (TP + TN + FP + FN)
    pub fn accuracy(&self) -> f64 {
        ratio(
            self.true_positives + self.true_negatives,
            self.true_positives + self.true_negatives + self.false_positives + self.false_negatives,
        )
    }

    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall (sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score: 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// Calculate specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_positives)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Counts of (true class, predicted class) pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Sorted classes indexing rows (truth) and columns (prediction)
    pub classes: Vec<i32>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    fn new(mut classes: Vec<i32>) -> Self {
        classes.sort_unstable();
        classes.dedup();
        let n = classes.len();
        Self {
            classes,
            counts: vec![vec![0; n]; n],
        }
    }

    fn index(&self, class: i32) -> Option<usize> {
        self.classes.binary_search(&class).ok()
    }

    fn record(&mut self, truth: i32, predicted: i32) {
        if let (Some(t), Some(p)) = (self.index(truth), self.index(predicted)) {
            self.counts[t][p] += 1;
        }
    }

    /// Count of samples with class `truth` predicted as `predicted`
    pub fn get(&self, truth: i32, predicted: i32) -> usize {
        match (self.index(truth), self.index(predicted)) {
            (Some(t), Some(p)) => self.counts[t][p],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.classes.len()).map(|i| self.counts[i][i]).sum()
    }

    /// One-vs-rest metrics treating `positive` as the positive class
    pub fn binary_metrics(&self, positive: i32) -> EvaluationMetrics {
        let mut metrics = EvaluationMetrics::default();
        for (t, &truth) in self.classes.iter().enumerate() {
            for (p, &predicted) in self.classes.iter().enumerate() {
                let count = self.counts[t][p];
                match (truth == positive, predicted == positive) {
                    (true, true) => metrics.true_positives += count,
                    (true, false) => metrics.false_negatives += count,
                    (false, true) => metrics.false_positives += count,
                    (false, false) => metrics.true_negatives += count,
                }
            }
        }
        metrics
    }
}

/// Outcome of one [`ClassifyTest::run`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyReport {
    pub description: String,
    pub n_samples: usize,
    pub confusion: ConfusionMatrix,
    /// Class treated as positive in [`ClassifyReport::metrics`]
    pub positive_class: i32,
    pub metrics: EvaluationMetrics,
}

impl ClassifyReport {
    /// Fraction of samples whose predicted class is the true class
    pub fn accuracy(&self) -> f64 {
        ratio(self.confusion.correct(), self.confusion.total())
    }
}

impl fmt::Display for ClassifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: accuracy {:.2}% on {} samples (class {}: precision {:.3}, recall {:.3}, F1 {:.3}, specificity {:.3})",
            self.description,
            100.0 * self.accuracy(),
            self.n_samples,
            self.positive_class,
            self.metrics.precision(),
            self.metrics.recall(),
            self.metrics.f1_score(),
            self.metrics.specificity()
        )
    }
}

/// Fixed labelled data to score classifiers against
#[derive(Debug, Clone)]
pub struct ClassifyTest {
    data: Vec<SparseVector>,
    classes: Vec<i32>,
    description: String,
}

impl ClassifyTest {
    pub fn new(data: Vec<SparseVector>, classes: Vec<i32>, description: &str) -> Self {
        Self {
            data,
            classes,
            description: description.to_string(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn data(&self) -> &[SparseVector] {
        &self.data
    }

    pub fn classes(&self) -> &[i32] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Predict every vector and tally the results
    ///
    /// Binary metrics use the classifier's largest class as positive.
    pub fn run(&self, classifier: &dyn Classifier) -> Result<ClassifyReport> {
        if self.data.len() != self.classes.len() {
            return Err(RFError::InvalidDataset(format!(
                "{} samples but {} classes",
                self.data.len(),
                self.classes.len()
            )));
        }
        if self.data.is_empty() {
            return Err(RFError::EmptyDataset);
        }

        let mut confusion = ConfusionMatrix::new(
            self.classes
                .iter()
                .chain(classifier.classes())
                .copied()
                .collect(),
        );
        for (prediction, &truth) in classifier.predict_batch(&self.data).iter().zip(&self.classes) {
            confusion.record(truth, prediction.class);
        }

        let positive_class = classifier
            .classes()
            .last()
            .or_else(|| confusion.classes.last())
            .copied()
            .unwrap_or_default();
        let report = ClassifyReport {
            description: self.description.clone(),
            n_samples: self.data.len(),
            metrics: confusion.binary_metrics(positive_class),
            positive_class,
            confusion,
        };
        info!("{report}");
        Ok(report)
    }
}
