use image::DynamicImage;
use std::sync::Arc;
use tracing::debug;

use crate::error::ClassifyError;
use crate::features;
use crate::inference::bundle::{BundleProvider, PipelineBundle};
use crate::models::{InferenceResponse, PredictionResult};
use crate::stream::FrameClassifier;

/// A fitted transform applied between extraction and the model
pub trait TransformStep: Send + Sync {
    /// Human-readable name, used in shape errors and logs
    fn name(&self) -> &'static str;

    /// Vector length the step was fitted on
    fn input_len(&self) -> usize;

    fn output_len(&self) -> usize;

    /// Transform one vector; never mutates the fitted parameters
    fn apply(&self, input: &[f64]) -> Result<Vec<f64>, ClassifyError>;

    fn check_input(&self, input: &[f64]) -> Result<(), ClassifyError> {
        if input.len() == self.input_len() {
            Ok(())
        } else {
            Err(ClassifyError::ShapeMismatch {
                stage: self.name(),
                expected: self.input_len(),
                actual: input.len(),
            })
        }
    }
}

/// Ordered list of the transforms a bundle carries.
/// Absent stages are simply not in the list.
#[derive(Default)]
pub struct TransformChain<'a> {
    steps: Vec<&'a dyn TransformStep>,
}

impl<'a> TransformChain<'a> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a stage if present
    pub fn with_step(mut self, step: Option<&'a dyn TransformStep>) -> Self {
        if let Some(step) = step {
            self.steps.push(step);
        }
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Length of the vector the chain produces for `input_len` inputs
    pub fn output_len(&self, input_len: usize) -> Result<usize, ClassifyError> {
        self.steps.iter().try_fold(input_len, |len, step| {
            if step.input_len() == len {
                Ok(step.output_len())
            } else {
                Err(ClassifyError::ShapeMismatch {
                    stage: step.name(),
                    expected: step.input_len(),
                    actual: len,
                })
            }
        })
    }

    pub fn apply(&self, input: &[f64]) -> Result<Vec<f64>, ClassifyError> {
        let mut data = input.to_vec();
        for step in &self.steps {
            data = step.apply(&data)?;
            debug!(step = step.name(), len = data.len(), "applied transform");
        }
        Ok(data)
    }
}

/// End-to-end classifier: preprocess, extract, transform, predict, label.
///
/// Cloning is cheap; every clone shares the same read-only bundle.
#[derive(Clone)]
pub struct Pipeline {
    bundle: Arc<PipelineBundle>,
}

impl Pipeline {
    /// Validate the bundle and take ownership of it
    pub fn new(bundle: PipelineBundle) -> Result<Self, ClassifyError> {
        Ok(Self {
            bundle: Arc::new(bundle.validated()?),
        })
    }

    /// Load a bundle; any failure here is fatal for the caller
    pub fn from_provider(provider: &dyn BundleProvider) -> Result<Self, ClassifyError> {
        Self::new(provider.load()?)
    }

    pub fn classify(&self, img: &DynamicImage) -> Result<PredictionResult, ClassifyError> {
        let features = features::extract_features(img)?;
        debug!(len = features.len(), "raw features");
        self.classify_features(features.as_slice())
    }

    /// Run the transform chain and model on an already extracted vector
    pub fn classify_features(&self, features: &[f64]) -> Result<PredictionResult, ClassifyError> {
        let transformed = self.bundle.transform_chain().apply(features)?;
        let prediction = self.bundle.model.predict(&transformed)?;
        let label = self.bundle.label_for(prediction.class_index)?;

        Ok(PredictionResult {
            class_id: prediction.class_index,
            label: label.to_string(),
            confidence: prediction.confidence,
        })
    }

    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<PredictionResult, ClassifyError> {
        let img = image::load_from_memory(bytes)?;
        self.classify(&img)
    }

    /// Single-image entry point: always returns a payload, never an error
    pub fn respond(&self, content_type: Option<&str>, bytes: &[u8]) -> InferenceResponse {
        if let Some(content_type) = content_type {
            if !content_type.starts_with("image/") {
                return InferenceResponse::error("File must be an image");
            }
        }

        match self.classify_bytes(bytes) {
            Ok(prediction) => InferenceResponse::Prediction(prediction),
            Err(e) => InferenceResponse::error(e.user_message()),
        }
    }
}

impl FrameClassifier for Pipeline {
    fn classify_frame(&self, frame: &DynamicImage) -> Result<PredictionResult, ClassifyError> {
        self.classify(frame)
    }
}
