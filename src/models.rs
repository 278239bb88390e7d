use serde::{Deserialize, Serialize};

use crate::config::{COLOR_LEN, HOG_LEN, LBP_LEN};
use crate::error::ClassifyError;

/// Number of behaviour categories every bundle must cover
pub const CLASS_COUNT: usize = 10;

/// Default catalogue, in model output order
pub const CLASS_NAMES: [&str; CLASS_COUNT] = [
    "c0: Safe Driving",
    "c1: Texting (Right)",
    "c2: Talking on Phone (Right)",
    "c3: Texting (Left)",
    "c4: Talking on Phone (Left)",
    "c5: Operating Radio",
    "c6: Drinking",
    "c7: Reaching Behind",
    "c8: Hair and Makeup",
    "c9: Talking to Passenger",
];

pub fn default_class_names() -> Vec<String> {
    CLASS_NAMES.iter().map(|name| name.to_string()).collect()
}

/// Raw descriptor output: gradient, color and texture values back to back
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Concatenate the three descriptors in their fixed order.
    /// Each part must have its canonical length.
    pub fn from_parts(
        gradient: Vec<f64>,
        color: Vec<f64>,
        texture: Vec<f64>,
    ) -> Result<Self, ClassifyError> {
        for (stage, part, expected) in [
            ("gradient", &gradient, HOG_LEN),
            ("color", &color, COLOR_LEN),
            ("texture", &texture, LBP_LEN),
        ] {
            if part.len() != expected {
                return Err(ClassifyError::ShapeMismatch {
                    stage,
                    expected,
                    actual: part.len(),
                });
            }
        }

        let mut values = gradient;
        values.reserve(color.len() + texture.len());
        values.extend(color);
        values.extend(texture);
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn gradient(&self) -> &[f64] {
        &self.values[..HOG_LEN]
    }

    pub fn color(&self) -> &[f64] {
        &self.values[HOG_LEN..HOG_LEN + COLOR_LEN]
    }

    pub fn texture(&self) -> &[f64] {
        &self.values[HOG_LEN + COLOR_LEN..HOG_LEN + COLOR_LEN + LBP_LEN]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub class_id: usize,
    pub label: String,
    /// Max class probability; `None` when the model cannot estimate one
    pub confidence: Option<f64>,
}

/// Payload returned by the single-image entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    Prediction(PredictionResult),
    Error { error: String },
}

impl InferenceResponse {
    pub fn error(message: impl Into<String>) -> Self {
        InferenceResponse::Error {
            error: message.into(),
        }
    }
}
