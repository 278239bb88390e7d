use image::{DynamicImage, GrayImage, Luma, RgbImage};

use crate::config::{IMG_HEIGHT, IMG_WIDTH};
use crate::error::ClassifyError;

/// Resize any input to the canonical resolution
pub fn to_canonical(img: &DynamicImage) -> Result<RgbImage, ClassifyError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(ClassifyError::InvalidImage(format!(
            "empty image ({}x{})",
            img.width(),
            img.height()
        )));
    }
    Ok(resize_area(&img.to_rgb8(), IMG_WIDTH, IMG_HEIGHT))
}

/// Source taps and weights for one output coordinate along a single axis.
/// Each output pixel averages the source span it covers, partial pixels
/// weighted by overlap.
fn area_taps(src: u32, dst: u32) -> Vec<Vec<(usize, f64)>> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|d| {
            let start = d as f64 * scale;
            let end = start + scale;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).clamp(first + 1, src);

            let mut taps: Vec<(usize, f64)> = (first..last)
                .filter_map(|s| {
                    let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                    (overlap > 0.0).then_some((s as usize, overlap))
                })
                .collect();
            if taps.is_empty() {
                taps.push((first.min(src - 1) as usize, 1.0));
            }

            let total: f64 = taps.iter().map(|(_, w)| w).sum();
            for tap in &mut taps {
                tap.1 /= total;
            }
            taps
        })
        .collect()
}

/// Area-averaging resize, separable: rows first, then columns
pub fn resize_area(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (src_w, src_h) = img.dimensions();
    let x_taps = area_taps(src_w, width);
    let y_taps = area_taps(src_h, height);

    // Horizontal pass keeps full precision until the final rounding
    let row_len = width as usize * 3;
    let mut horizontal = vec![0.0f64; src_h as usize * row_len];
    for y in 0..src_h {
        let row = &mut horizontal[y as usize * row_len..(y as usize + 1) * row_len];
        for (x, taps) in x_taps.iter().enumerate() {
            for &(sx, weight) in taps {
                let pixel = img.get_pixel(sx as u32, y);
                for c in 0..3 {
                    row[x * 3 + c] += pixel[c] as f64 * weight;
                }
            }
        }
    }

    let mut out = RgbImage::new(width, height);
    for (y, taps) in y_taps.iter().enumerate() {
        for x in 0..width as usize {
            let mut acc = [0.0f64; 3];
            for &(sy, weight) in taps {
                for c in 0..3 {
                    acc[c] += horizontal[sy * row_len + x * 3 + c] * weight;
                }
            }
            let pixel = out.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                pixel[c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

/// Single-channel intensity, 0.299 R + 0.587 G + 0.114 B in 14-bit fixed point
pub fn to_intensity(img: &RgbImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        let luma = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << 13)) >> 14;
        Luma([luma.min(255) as u8])
    })
}

/// Hue (0..180, degrees halved) and saturation (0..=255) planes
pub fn to_hue_saturation(img: &RgbImage) -> (GrayImage, GrayImage) {
    let (width, height) = img.dimensions();
    let mut hue = GrayImage::new(width, height);
    let mut saturation = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b] = pixel.0.map(|c| c as i32);
        let v = r.max(g).max(b);
        let diff = v - r.min(g).min(b);

        let s = if v == 0 {
            0
        } else {
            (diff as f64 * 255.0 / v as f64).round() as i32
        };

        let h = if diff == 0 {
            0
        } else {
            let numerator = if v == r {
                g - b
            } else if v == g {
                b - r + 2 * diff
            } else {
                r - g + 4 * diff
            };
            let h = (numerator as f64 * 30.0 / diff as f64 + 0.5).floor() as i32;
            if h < 0 { h + 180 } else { h }
        };

        hue.put_pixel(x, y, Luma([h.clamp(0, 255) as u8]));
        saturation.put_pixel(x, y, Luma([s.clamp(0, 255) as u8]));
    }

    (hue, saturation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn area_taps_average_exact_blocks() {
        let taps = area_taps(4, 2);
        assert_eq!(taps[0], vec![(0, 0.5), (1, 0.5)]);
        assert_eq!(taps[1], vec![(2, 0.5), (3, 0.5)]);
    }

    #[test]
    fn resize_averages_pixels() {
        let img = RgbImage::from_fn(2, 2, |x, _| {
            if x == 0 { Rgb([0, 0, 0]) } else { Rgb([200, 100, 50]) }
        });
        let out = resize_area(&img, 1, 1);
        assert_eq!(out.get_pixel(0, 0).0, [100, 50, 25]);
    }

    #[test]
    fn hsv_primaries() {
        let img = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let (h, s) = to_hue_saturation(&img);
        assert_eq!(h.get_pixel(0, 0)[0], 0);
        assert_eq!(h.get_pixel(1, 0)[0], 60);
        assert_eq!(h.get_pixel(2, 0)[0], 120);
        assert!(s.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn intensity_of_white_is_white() {
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        assert_eq!(to_intensity(&img).get_pixel(0, 0)[0], 255);
    }
}
