//! Descriptor geometry shared by extraction and bundle validation.
//!
//! Every bundle is fitted against vectors built with exactly these numbers,
//! so they are constants rather than runtime settings.

use std::num::NonZeroU32;

/// Canonical width every image is resized to before extraction
pub const IMG_WIDTH: u32 = 192;
/// Canonical height every image is resized to before extraction
pub const IMG_HEIGHT: u32 = 144;

pub const HOG_ORIENTATIONS: usize = 12;
pub const HOG_PIXELS_PER_CELL: usize = 8;
pub const HOG_CELLS_PER_BLOCK: usize = 2;
/// Component ceiling applied between the two L2 passes of L2-Hys
pub const HOG_CLIP: f64 = 0.2;
pub const HOG_EPS: f64 = 1e-5;

pub const HUE_BINS: usize = 24;
/// Hue uses the 8-bit convention, degrees halved
pub const HUE_RANGE: f64 = 180.0;
pub const SATURATION_BINS: usize = 24;
pub const SATURATION_RANGE: f64 = 256.0;

pub const LBP_POINTS: usize = 8;
pub const LBP_RADIUS: f64 = 1.0;
/// Uniform codes 0..=P plus the single non-uniform code P+1
pub const LBP_BINS: usize = LBP_POINTS + 2;

/// Classify every 5th frame of a stream
pub const DEFAULT_SKIP_INTERVAL: NonZeroU32 = match NonZeroU32::new(5) {
    Some(n) => n,
    None => panic!("skip interval must be non-zero"),
};
pub const DEFAULT_BUNDLE_PATH: &str = "driver_distraction_pipeline.json";

pub const HOG_CELLS_X: usize = IMG_WIDTH as usize / HOG_PIXELS_PER_CELL;
pub const HOG_CELLS_Y: usize = IMG_HEIGHT as usize / HOG_PIXELS_PER_CELL;
pub const HOG_BLOCKS_X: usize = HOG_CELLS_X - HOG_CELLS_PER_BLOCK + 1;
pub const HOG_BLOCKS_Y: usize = HOG_CELLS_Y - HOG_CELLS_PER_BLOCK + 1;
pub const HOG_BLOCK_LEN: usize = HOG_CELLS_PER_BLOCK * HOG_CELLS_PER_BLOCK * HOG_ORIENTATIONS;

pub const HOG_LEN: usize = HOG_BLOCKS_X * HOG_BLOCKS_Y * HOG_BLOCK_LEN;
pub const COLOR_LEN: usize = HUE_BINS + SATURATION_BINS;
pub const LBP_LEN: usize = LBP_BINS;

/// Length of the raw vector: gradient, color, texture
pub const FEATURE_LEN: usize = HOG_LEN + COLOR_LEN + LBP_LEN;
