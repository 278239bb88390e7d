//! Error types for classification.
//!
//! `ClassifyError` covers everything that can go wrong between receiving
//! image bytes and producing a label. Bundle-level variants are fatal: a
//! process that hits them at startup must not start serving.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    /// The input could not be turned into a pixel buffer.
    ///
    /// Raised for undecodable bytes and for images with a zero dimension.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A descriptor produced NaN or infinite values.
    #[error("Error extracting features: {descriptor} descriptor is not finite")]
    FeatureExtraction { descriptor: &'static str },

    /// A transform or model received a vector of the wrong length.
    ///
    /// This means the bundle was fitted against a different extractor.
    #[error("Shape mismatch in {stage}: expected {expected} features, got {actual}")]
    ShapeMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The bundle artifact could not be found or read.
    #[error("Pipeline bundle unavailable: {0}")]
    BundleUnavailable(String),

    /// The bundle was read but its parts do not fit together.
    #[error("Invalid pipeline bundle: {0}")]
    InvalidBundle(String),

    /// The model produced a class index with no catalogue entry.
    #[error("Class index {index} out of range for {len} class names")]
    LabelOutOfRange { index: usize, len: usize },
}

impl ClassifyError {
    /// Whether the error means the bundle itself is unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClassifyError::BundleUnavailable(_)
                | ClassifyError::InvalidBundle(_)
                | ClassifyError::LabelOutOfRange { .. }
        )
    }

    /// Short text shown to users in place of a label.
    pub fn user_message(&self) -> String {
        match self {
            ClassifyError::InvalidImage(_) => "Invalid image".to_string(),
            ClassifyError::FeatureExtraction { .. } => "Error extracting features".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<image::ImageError> for ClassifyError {
    fn from(err: image::ImageError) -> Self {
        ClassifyError::InvalidImage(err.to_string())
    }
}
