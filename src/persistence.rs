//! Model serialization and persistence
//!
//! A saved model is a JSON document holding the linear separators, the
//! package of the feature map they were trained on (if any) and metadata
//! describing how the model was produced.

use crate::core::{Classifier, LinearSvcConfig, RFError, Result};
use crate::features::{FeatureMap, FeaturePackage};
use crate::svc::TrainedLinearSVC;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializable representation of a trained linear SVC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    /// Sorted classes the model predicts
    pub classes: Vec<i32>,
    /// One weight vector per separator
    pub weights: Vec<Vec<f64>>,
    /// One intercept per separator
    pub biases: Vec<f64>,
    /// Feature map applied before the separators, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<FeaturePackage>,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// Model metadata for tracking and validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Input dimensionality of the separators
    pub n_features: usize,
    /// Solver passes used during training
    pub iterations: usize,
    /// Training parameters used
    pub training_params: LinearSvcConfig,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl SavedModel {
    /// Capture a trained model and the feature package it expects
    pub fn from_trained_model(
        model: &TrainedLinearSVC,
        feature: Option<FeaturePackage>,
        training_params: &LinearSvcConfig,
    ) -> Self {
        Self {
            classes: model.classes().to_vec(),
            weights: model.weights().to_vec(),
            biases: model.biases().to_vec(),
            feature,
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                n_features: model.n_features(),
                iterations: model.iterations(),
                training_params: training_params.clone(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| RFError::SerializationError(e.to_string()))
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| RFError::SerializationError(e.to_string()))
    }

    /// Rebuild the classifier
    pub fn to_trained_model(&self) -> Result<TrainedLinearSVC> {
        let model = TrainedLinearSVC::from_parts(
            self.classes.clone(),
            self.weights.clone(),
            self.biases.clone(),
        )?;
        if let Some(package) = &self.feature {
            if package.fdim() != model.n_features() {
                return Err(RFError::DimensionMismatch {
                    expected: package.fdim(),
                    actual: model.n_features(),
                });
            }
        }
        Ok(model)
    }

    /// Rebuild the feature map, if the model was trained on one
    pub fn to_feature_map(&self, cores: Option<usize>) -> Result<Option<Box<dyn FeatureMap>>> {
        self.feature
            .as_ref()
            .map(|package| package.feature_type().rebuild(package, cores))
            .transpose()
    }

    /// Creation time parsed from the metadata
    pub fn created_at(&self) -> Result<chrono::DateTime<chrono::FixedOffset>> {
        chrono::DateTime::parse_from_rfc3339(&self.metadata.created_at)
            .map_err(|e| RFError::ParseError(format!("Invalid timestamp: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;
    use crate::kernel::KernelType;
    use tempfile::NamedTempFile;

    fn model() -> TrainedLinearSVC {
        TrainedLinearSVC::from_parts(vec![0, 1], vec![vec![0.5, -0.25, 1.0]], vec![0.1]).unwrap()
    }

    fn package() -> FeaturePackage {
        FeaturePackage::Fourier {
            idim: 2,
            fdim: 3,
            kernel: KernelType::Gaussian,
            bandwidth: 1.0,
            seed: 17,
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let saved =
            SavedModel::from_trained_model(&model(), Some(package()), &LinearSvcConfig::default());
        let file = NamedTempFile::new().unwrap();
        saved.save_to_file(file.path()).unwrap();

        let loaded = SavedModel::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.metadata.library_version, env!("CARGO_PKG_VERSION"));
        assert!(loaded.created_at().is_ok());

        let rebuilt = loaded.to_trained_model().unwrap();
        let x = SparseVector::from_dense(&[1.0, 0.0, 0.5]);
        assert_eq!(rebuilt.predict(&x), model().predict(&x));

        let feature = loaded.to_feature_map(None).unwrap().unwrap();
        assert_eq!(feature.package(), package());
    }

    #[test]
    fn test_raw_model_has_no_feature() {
        let saved = SavedModel::from_trained_model(&model(), None, &LinearSvcConfig::default());
        let json = serde_json::to_string(&saved).unwrap();
        assert!(!json.contains("\"feature\""));
        assert!(saved.to_feature_map(None).unwrap().is_none());
    }

    #[test]
    fn test_feature_width_must_match() {
        let mut saved =
            SavedModel::from_trained_model(&model(), Some(package()), &LinearSvcConfig::default());
        saved.feature = Some(FeaturePackage::Binning {
            idim: 2,
            fdim: 10,
            bandwidth: 1.0,
            seed: 1,
        });
        assert!(matches!(
            saved.to_trained_model(),
            Err(RFError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            SavedModel::load_from_file("/non/existent/model.json"),
            Err(RFError::IoError(_))
        ));

        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{not json").unwrap();
        assert!(matches!(
            SavedModel::load_from_file(file.path()),
            Err(RFError::SerializationError(_))
        ));
    }
}
