use image::{GrayImage, RgbImage};
use imageproc::stats::histogram;

use crate::config::{HUE_BINS, HUE_RANGE, SATURATION_BINS, SATURATION_RANGE};
use crate::features::preprocessing;

/// Hue histogram followed by saturation histogram, each as pixel fractions
pub fn color_descriptor(img: &RgbImage) -> Vec<f64> {
    let (hue, saturation) = preprocessing::to_hue_saturation(img);
    let mut feature = binned_fractions(&hue, HUE_BINS, HUE_RANGE);
    feature.extend(binned_fractions(&saturation, SATURATION_BINS, SATURATION_RANGE));
    feature
}

/// Fold the 256-level histogram of a plane into `bins` uniform bins over
/// `[0, range)`; levels at or above `range` are not counted.
fn binned_fractions(plane: &GrayImage, bins: usize, range: f64) -> Vec<f64> {
    let hist = histogram(plane);
    let levels = &hist.channels[0];
    let mut out = vec![0.0f64; bins];

    for (level, &count) in levels.iter().enumerate() {
        if count == 0 || level as f64 >= range {
            continue;
        }
        let bin = ((level as f64 * bins as f64 / range) as usize).min(bins - 1);
        out[bin] += count as f64;
    }

    let total = (plane.width() as f64) * (plane.height() as f64);
    if total > 0.0 {
        for value in &mut out {
            *value /= total;
        }
    }
    out
}
