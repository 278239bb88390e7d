use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use crate::config::FEATURE_LEN;
use crate::error::ClassifyError;
use crate::inference::classifier::Classifier;
use crate::inference::steps::{FeatureSelector, PcaReducer, StandardScaler};
use crate::models::CLASS_COUNT;
use crate::pipeline::{TransformChain, TransformStep};

/// Everything a training run hands over: transforms, model, class names.
/// Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineBundle {
    pub model: Classifier,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    #[serde(default)]
    pub feature_selector: Option<FeatureSelector>,
    #[serde(default, alias = "dimensionality_reducer")]
    pub pca: Option<PcaReducer>,
    pub class_names: Vec<String>,
}

impl PipelineBundle {
    /// Check that every part fits the extractor and the next part.
    /// Zero scaler entries are replaced with 1.
    pub fn validated(mut self) -> Result<Self, ClassifyError> {
        if let Some(selector) = &self.feature_selector {
            selector.validate()?;
        }
        if let Some(scaler) = &mut self.scaler {
            scaler.validate()?;
        }
        if let Some(pca) = &self.pca {
            pca.validate()?;
        }
        self.model.validate()?;

        if self.class_names.len() != CLASS_COUNT {
            return Err(ClassifyError::InvalidBundle(format!(
                "expected {} class names, found {}",
                CLASS_COUNT,
                self.class_names.len()
            )));
        }
        if self.model.n_classes() != self.class_names.len() {
            return Err(ClassifyError::InvalidBundle(format!(
                "model predicts {} classes but {} names are given",
                self.model.n_classes(),
                self.class_names.len()
            )));
        }

        let chain_output = self
            .transform_chain()
            .output_len(FEATURE_LEN)
            .map_err(|e| ClassifyError::InvalidBundle(e.to_string()))?;
        if chain_output != self.model.n_features() {
            return Err(ClassifyError::InvalidBundle(format!(
                "transforms produce {} features but the model expects {}",
                chain_output,
                self.model.n_features()
            )));
        }

        Ok(self)
    }

    /// Selector, scaler, reducer, in that order, skipping absent stages
    pub fn transform_chain(&self) -> TransformChain<'_> {
        TransformChain::new()
            .with_step(self.feature_selector.as_ref().map(|s| s as &dyn TransformStep))
            .with_step(self.scaler.as_ref().map(|s| s as &dyn TransformStep))
            .with_step(self.pca.as_ref().map(|s| s as &dyn TransformStep))
    }

    pub fn label_for(&self, index: usize) -> Result<&str, ClassifyError> {
        self.class_names
            .get(index)
            .map(String::as_str)
            .ok_or(ClassifyError::LabelOutOfRange {
                index,
                len: self.class_names.len(),
            })
    }
}

/// Source of the fitted bundle, consulted once at startup
pub trait BundleProvider {
    fn load(&self) -> Result<PipelineBundle, ClassifyError>;
}

/// An in-memory bundle provides itself
impl BundleProvider for PipelineBundle {
    fn load(&self) -> Result<PipelineBundle, ClassifyError> {
        self.clone().validated()
    }
}

/// Bundle serialized as a JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonBundleFile {
    path: PathBuf,
}

impl JsonBundleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write a bundle in the format `load` reads
    pub fn save(&self, bundle: &PipelineBundle) -> anyhow::Result<()> {
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), bundle)?;
        Ok(())
    }
}

impl BundleProvider for JsonBundleFile {
    fn load(&self) -> Result<PipelineBundle, ClassifyError> {
        let unavailable = |reason: String| {
            ClassifyError::BundleUnavailable(format!("{}: {}", self.path.display(), reason))
        };

        let file = std::fs::File::open(&self.path).map_err(|e| unavailable(e.to_string()))?;
        let bundle: PipelineBundle = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| unavailable(e.to_string()))?;
        let bundle = bundle.validated()?;

        info!(
            path = %self.path.display(),
            stages = ?bundle.transform_chain().step_names(),
            probability = bundle.model.supports_probability(),
            "pipeline bundle loaded"
        );
        Ok(bundle)
    }
}
