pub mod color;
pub mod hog;
pub mod lbp;
pub mod preprocessing;

use image::{DynamicImage, RgbImage};
use tracing::debug;

use crate::config::{IMG_HEIGHT, IMG_WIDTH};
use crate::error::ClassifyError;
use crate::models::FeatureVector;

/// Resize to the canonical resolution, then extract
pub fn extract_features(img: &DynamicImage) -> Result<FeatureVector, ClassifyError> {
    let canonical = preprocessing::to_canonical(img)?;
    extract_canonical(&canonical)
}

/// Build the raw feature vector from an image already at canonical size;
/// any other size is rejected.
///
/// The three descriptors are computed independently and concatenated as
/// gradient, color, texture. Any non-finite value fails the whole
/// extraction.
pub fn extract_canonical(img: &RgbImage) -> Result<FeatureVector, ClassifyError> {
    if img.dimensions() != (IMG_WIDTH, IMG_HEIGHT) {
        return Err(ClassifyError::InvalidImage(format!(
            "expected {}x{} input, got {}x{}",
            IMG_WIDTH,
            IMG_HEIGHT,
            img.width(),
            img.height()
        )));
    }

    let gray = preprocessing::to_intensity(img);

    let gradient = hog::hog_descriptor(&gray);
    ensure_finite("gradient", &gradient)?;

    let color = color::color_descriptor(img);
    ensure_finite("color", &color)?;

    let texture = lbp::lbp_descriptor(&gray);
    ensure_finite("texture", &texture)?;

    debug!(
        gradient = gradient.len(),
        color = color.len(),
        texture = texture.len(),
        "extracted descriptors"
    );

    FeatureVector::from_parts(gradient, color, texture)
}

pub fn ensure_finite(descriptor: &'static str, values: &[f64]) -> Result<(), ClassifyError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ClassifyError::FeatureExtraction { descriptor })
    }
}
