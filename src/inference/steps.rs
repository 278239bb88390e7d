use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::pipeline::TransformStep;

/// Keeps a fixed subset of input features, in ascending index order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSelector {
    pub n_features_in: usize,
    pub support: Vec<usize>,
}

impl FeatureSelector {
    pub fn validate(&self) -> Result<(), ClassifyError> {
        if self.support.is_empty() {
            return Err(ClassifyError::InvalidBundle(
                "feature selector keeps no features".to_string(),
            ));
        }
        if self.support.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ClassifyError::InvalidBundle(
                "feature selector indices must be strictly increasing".to_string(),
            ));
        }
        if let Some(&last) = self.support.last() {
            if last >= self.n_features_in {
                return Err(ClassifyError::InvalidBundle(format!(
                    "feature selector index {} out of range for {} inputs",
                    last, self.n_features_in
                )));
            }
        }
        Ok(())
    }
}

impl TransformStep for FeatureSelector {
    fn name(&self) -> &'static str {
        "feature selector"
    }

    fn input_len(&self) -> usize {
        self.n_features_in
    }

    fn output_len(&self) -> usize {
        self.support.len()
    }

    fn apply(&self, input: &[f64]) -> Result<Vec<f64>, ClassifyError> {
        self.check_input(input)?;
        self.support
            .iter()
            .map(|&i| {
                input.get(i).copied().ok_or(ClassifyError::ShapeMismatch {
                    stage: self.name(),
                    expected: i + 1,
                    actual: input.len(),
                })
            })
            .collect()
    }
}

/// Per-feature standardization, `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn validate(&mut self) -> Result<(), ClassifyError> {
        if self.mean.len() != self.scale.len() {
            return Err(ClassifyError::InvalidBundle(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        // Constant features were fitted with zero variance
        for scale in &mut self.scale {
            if *scale == 0.0 {
                *scale = 1.0;
            }
        }
        Ok(())
    }
}

impl TransformStep for StandardScaler {
    fn name(&self) -> &'static str {
        "scaler"
    }

    fn input_len(&self) -> usize {
        self.mean.len()
    }

    fn output_len(&self) -> usize {
        self.mean.len()
    }

    fn apply(&self, input: &[f64]) -> Result<Vec<f64>, ClassifyError> {
        self.check_input(input)?;
        if self.scale.len() != self.mean.len() {
            return Err(ClassifyError::ShapeMismatch {
                stage: self.name(),
                expected: self.mean.len(),
                actual: self.scale.len(),
            });
        }
        Ok(input
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}

/// Linear projection onto principal components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaReducer {
    pub mean: Vec<f64>,
    /// One row per component, each `mean.len()` long
    pub components: Vec<Vec<f64>>,
    #[serde(default)]
    pub explained_variance: Vec<f64>,
    #[serde(default)]
    pub whiten: bool,
}

impl PcaReducer {
    pub fn validate(&self) -> Result<(), ClassifyError> {
        if self.components.is_empty() {
            return Err(ClassifyError::InvalidBundle("pca has no components".to_string()));
        }
        if let Some(row) = self.components.iter().find(|row| row.len() != self.mean.len()) {
            return Err(ClassifyError::InvalidBundle(format!(
                "pca component has {} weights, expected {}",
                row.len(),
                self.mean.len()
            )));
        }
        if self.whiten {
            if self.explained_variance.len() != self.components.len() {
                return Err(ClassifyError::InvalidBundle(
                    "whitening pca needs one explained variance per component".to_string(),
                ));
            }
            if self.explained_variance.iter().any(|v| v.is_nan() || *v <= 0.0) {
                return Err(ClassifyError::InvalidBundle(
                    "explained variance must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl TransformStep for PcaReducer {
    fn name(&self) -> &'static str {
        "pca"
    }

    fn input_len(&self) -> usize {
        self.mean.len()
    }

    fn output_len(&self) -> usize {
        self.components.len()
    }

    fn apply(&self, input: &[f64]) -> Result<Vec<f64>, ClassifyError> {
        self.check_input(input)?;
        let centered: Vec<f64> = input.iter().zip(&self.mean).map(|(x, m)| x - m).collect();

        self.components
            .iter()
            .enumerate()
            .map(|(k, row)| {
                if row.len() != centered.len() {
                    return Err(ClassifyError::ShapeMismatch {
                        stage: self.name(),
                        expected: centered.len(),
                        actual: row.len(),
                    });
                }
                let projected: f64 = row.iter().zip(&centered).map(|(w, x)| w * x).sum();
                if !self.whiten {
                    return Ok(projected);
                }
                // Whitening needs one variance per component
                let variance = self.explained_variance.get(k).copied().ok_or(
                    ClassifyError::ShapeMismatch {
                        stage: self.name(),
                        expected: self.components.len(),
                        actual: self.explained_variance.len(),
                    },
                )?;
                Ok(projected / variance.sqrt())
            })
            .collect()
    }
}
