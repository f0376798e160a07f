//! Core traits

use crate::core::{Prediction, Sample, SparseVector};

/// Labelled collection of feature vectors
///
/// Implementors expose their rows and classes as parallel slices; the
/// experiment helpers only ever read through this view.
pub trait Dataset: Send + Sync {
    /// Feature vectors, one per sample
    fn data(&self) -> &[SparseVector];

    /// Class labels, parallel to [`Dataset::data`]
    fn classes(&self) -> &[i32];

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Number of samples in the dataset
    fn len(&self) -> usize {
        self.data().len()
    }

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a single sample by index
    ///
    /// # Panics
    /// Panics if index >= len()
    fn get_sample(&self, i: usize) -> Sample {
        Sample::new(self.data()[i].clone(), self.classes()[i])
    }
}

/// Trained classifier
pub trait Classifier: Send + Sync {
    /// Predict a single feature vector
    fn predict(&self, x: &SparseVector) -> Prediction;

    /// Predict many feature vectors
    fn predict_batch(&self, xs: &[SparseVector]) -> Vec<Prediction> {
        xs.iter().map(|x| self.predict(x)).collect()
    }

    /// Classes the model can output, sorted ascending
    fn classes(&self) -> &[i32];

    /// Input dimensionality seen during training
    fn n_features(&self) -> usize;
}
