use image::GrayImage;

use crate::config::{
    HOG_CELLS_PER_BLOCK, HOG_CLIP, HOG_EPS, HOG_ORIENTATIONS, HOG_PIXELS_PER_CELL,
};

/// Histogram of oriented gradients over square-root compressed intensity.
///
/// Unsigned orientations are binned per cell, weighted by gradient
/// magnitude and averaged over the cell area. Overlapping blocks of cells are
/// L2-Hys normalized and emitted in raster order (block row, block column,
/// cell row, cell column, orientation).
pub fn hog_descriptor(gray: &GrayImage) -> Vec<f64> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let cell = HOG_PIXELS_PER_CELL;
    let cells_x = width / cell;
    let cells_y = height / cell;

    if cells_x < HOG_CELLS_PER_BLOCK || cells_y < HOG_CELLS_PER_BLOCK {
        return Vec::new();
    }

    let cells = cell_histograms(gray, cells_x, cells_y);
    normalized_blocks(&cells, cells_x, cells_y)
}

fn cell_histograms(gray: &GrayImage, cells_x: usize, cells_y: usize) -> Vec<f64> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let cell = HOG_PIXELS_PER_CELL;
    let bin_width = 180.0 / HOG_ORIENTATIONS as f64;

    let compressed: Vec<f64> = gray.pixels().map(|p| (p[0] as f64).sqrt()).collect();
    let at = |x: usize, y: usize| compressed[y * width + x];

    let mut cells = vec![0.0f64; cells_x * cells_y * HOG_ORIENTATIONS];
    for y in 0..cells_y * cell {
        for x in 0..cells_x * cell {
            // Central differences; the outermost ring has no gradient
            let gx = if x == 0 || x + 1 >= width {
                0.0
            } else {
                at(x + 1, y) - at(x - 1, y)
            };
            let gy = if y == 0 || y + 1 >= height {
                0.0
            } else {
                at(x, y + 1) - at(x, y - 1)
            };

            let magnitude = gx.hypot(gy);
            if magnitude == 0.0 {
                continue;
            }

            let orientation = gy.atan2(gx).to_degrees().rem_euclid(180.0);
            let bin = ((orientation / bin_width) as usize).min(HOG_ORIENTATIONS - 1);
            let index = ((y / cell) * cells_x + x / cell) * HOG_ORIENTATIONS + bin;
            cells[index] += magnitude;
        }
    }

    let area = (cell * cell) as f64;
    for value in &mut cells {
        *value /= area;
    }
    cells
}

fn normalized_blocks(cells: &[f64], cells_x: usize, cells_y: usize) -> Vec<f64> {
    let per_block = HOG_CELLS_PER_BLOCK;
    let blocks_x = cells_x - per_block + 1;
    let blocks_y = cells_y - per_block + 1;
    let block_len = per_block * per_block * HOG_ORIENTATIONS;

    let mut out = Vec::with_capacity(blocks_x * blocks_y * block_len);
    let mut block = Vec::with_capacity(block_len);

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            block.clear();
            for cy in 0..per_block {
                for cx in 0..per_block {
                    let start = ((by + cy) * cells_x + bx + cx) * HOG_ORIENTATIONS;
                    block.extend_from_slice(&cells[start..start + HOG_ORIENTATIONS]);
                }
            }
            l2_hys(&mut block);
            out.extend_from_slice(&block);
        }
    }
    out
}

/// L2 normalize, clip each component, renormalize
fn l2_hys(block: &mut [f64]) {
    let norm = l2_norm(block);
    for value in block.iter_mut() {
        *value = (*value / norm).min(HOG_CLIP);
    }
    let norm = l2_norm(block);
    for value in block.iter_mut() {
        *value /= norm;
    }
}

fn l2_norm(values: &[f64]) -> f64 {
    (values.iter().map(|v| v * v).sum::<f64>() + HOG_EPS * HOG_EPS).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HOG_BLOCK_LEN, HOG_LEN, IMG_HEIGHT, IMG_WIDTH};
    use image::Luma;

    #[test]
    fn flat_image_has_zero_descriptor() {
        let gray = GrayImage::from_pixel(IMG_WIDTH, IMG_HEIGHT, Luma([0]));
        let hog = hog_descriptor(&gray);
        assert_eq!(hog.len(), HOG_LEN);
        assert!(hog.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn vertical_edge_lands_in_horizontal_bin() {
        // Step from dark to bright along x gives a 0 degree gradient
        let gray = GrayImage::from_fn(16, 16, |x, _| Luma([if x < 8 { 0 } else { 255 }]));
        let cells = cell_histograms(&gray, 2, 2);
        let first_cell_right = &cells[HOG_ORIENTATIONS..2 * HOG_ORIENTATIONS];
        assert!(first_cell_right[0] > 0.0);
        assert!(first_cell_right[1..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn l2_hys_clips_dominant_component() {
        let mut block = vec![0.0; HOG_BLOCK_LEN];
        block[0] = 10.0;
        block[1] = 1.0;
        l2_hys(&mut block);
        let norm: f64 = block.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        // After clipping, the two components are much closer than 10:1
        assert!(block[0] / block[1] < 2.5);
    }
}
