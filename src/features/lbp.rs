use image::GrayImage;

use crate::config::{LBP_BINS, LBP_POINTS, LBP_RADIUS};

/// Density histogram of rotation-invariant uniform LBP codes
pub fn lbp_descriptor(gray: &GrayImage) -> Vec<f64> {
    let codes = lbp_codes(gray);
    let mut hist = vec![0.0f64; LBP_BINS];
    for &code in &codes {
        hist[code as usize] += 1.0;
    }
    // Bins are one code wide, so density is count over total
    if !codes.is_empty() {
        let total = codes.len() as f64;
        for value in &mut hist {
            *value /= total;
        }
    }
    hist
}

/// Neighbour offsets (row, col) on the circle, rounded to 5 decimals
fn neighbour_offsets() -> [(f64, f64); LBP_POINTS] {
    let round5 = |v: f64| (v * 1e5).round() / 1e5;
    std::array::from_fn(|i| {
        let angle = 2.0 * std::f64::consts::PI * i as f64 / LBP_POINTS as f64;
        (round5(-LBP_RADIUS * angle.sin()), round5(LBP_RADIUS * angle.cos()))
    })
}

/// Per-pixel codes in `0..LBP_BINS`, row-major
pub fn lbp_codes(gray: &GrayImage) -> Vec<u8> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let pixels: Vec<f64> = gray.pixels().map(|p| p[0] as f64).collect();
    let offsets = neighbour_offsets();

    let mut codes = Vec::with_capacity(width * height);
    let mut bits = [false; LBP_POINTS];
    for r in 0..height {
        for c in 0..width {
            let centre = pixels[r * width + c];
            for (bit, (dr, dc)) in bits.iter_mut().zip(offsets.iter()) {
                let neighbour =
                    bilinear(&pixels, width, height, r as f64 + dr, c as f64 + dc);
                *bit = neighbour - centre >= 0.0;
            }
            codes.push(uniform_code(&bits));
        }
    }
    codes
}

/// Popcount for patterns with at most two transitions, `P + 1` otherwise.
/// Transitions are counted along the open chain of neighbours.
fn uniform_code(bits: &[bool; LBP_POINTS]) -> u8 {
    let changes = bits.windows(2).filter(|pair| pair[0] != pair[1]).count();
    if changes <= 2 {
        bits.iter().filter(|b| **b).count() as u8
    } else {
        (LBP_POINTS + 1) as u8
    }
}

/// Bilinear sample with zero outside the image
fn bilinear(pixels: &[f64], width: usize, height: usize, r: f64, c: f64) -> f64 {
    let get = |row: f64, col: f64| {
        if row < 0.0 || col < 0.0 || row >= height as f64 || col >= width as f64 {
            0.0
        } else {
            pixels[row as usize * width + col as usize]
        }
    };

    let (min_r, max_r) = (r.floor(), r.ceil());
    let (min_c, max_c) = (c.floor(), c.ceil());
    let dr = r - min_r;
    let dc = c - min_c;

    let top = (1.0 - dc) * get(min_r, min_c) + dc * get(min_r, max_c);
    let bottom = (1.0 - dc) * get(max_r, min_c) + dc * get(max_r, max_c);
    (1.0 - dr) * top + dr * bottom
}
