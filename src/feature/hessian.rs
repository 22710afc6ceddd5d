//! Determinant-of-Hessian keypoint detection on box-filter responses.
//!
//! Second derivatives are approximated by box filters evaluated on an
//! integral image. Filter sizes grow as `(9 + 6·layer) << octave` and each
//! octave samples every `1 << octave` pixels, so all layers of an octave
//! share one response grid.

use crate::feature::{HessianConfig, Keypoint};
use crate::image::integral::IntegralImage;

/// Base filter size at octave 0, layer 0.
const BASE_SIZE: usize = 9;
/// Filter size increment per layer.
const SIZE_INC: usize = 6;
/// Relative weight of the mixed derivative.
const DXY_WEIGHT: f64 = 0.81;

// (x0, y0, x1, y1, weight) boxes of the 9x9 base filters.
const DXX: [[i64; 5]; 3] = [[0, 2, 3, 7, 1], [3, 2, 6, 7, -2], [6, 2, 9, 7, 1]];
const DYY: [[i64; 5]; 3] = [[2, 0, 7, 3, 1], [2, 3, 7, 6, -2], [2, 6, 7, 9, 1]];
const DXY: [[i64; 5]; 4] = [
    [1, 1, 4, 4, 1],
    [5, 1, 8, 4, -1],
    [1, 5, 4, 8, -1],
    [5, 5, 8, 8, 1],
];

#[derive(Clone, Copy, Debug)]
struct BoxTerm {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    weight: f64,
}

/// Rescales a base pattern to `size`, normalising every box by its area.
fn scaled_pattern<const N: usize>(base: &[[i64; 5]; N], size: usize) -> [BoxTerm; N] {
    let ratio = size as f64 / BASE_SIZE as f64;
    let scale = |v: i64| (ratio * v as f64).round() as i64;
    base.map(|[x0, y0, x1, y1, w]| {
        let (x0, y0, x1, y1) = (scale(x0), scale(y0), scale(x1), scale(y1));
        let area = ((x1 - x0) * (y1 - y0)).max(1) as f64;
        BoxTerm {
            x0,
            y0,
            x1,
            y1,
            weight: w as f64 / area,
        }
    })
}

#[inline]
fn apply(integral: &IntegralImage, left: i64, top: i64, terms: &[BoxTerm]) -> f64 {
    terms
        .iter()
        .map(|t| t.weight * integral.box_sum(left + t.x0, top + t.y0, left + t.x1, top + t.y1))
        .sum()
}

/// Hessian responses of one filter size on its octave's sampling grid.
struct ResponseLayer {
    size: usize,
    cols: usize,
    rows: usize,
    responses: Vec<f64>,
}

impl ResponseLayer {
    fn build(integral: &IntegralImage, size: usize, step: usize) -> Self {
        let cols = (integral.width() - 1) / step + 1;
        let rows = (integral.height() - 1) / step + 1;
        let dxx = scaled_pattern(&DXX, size);
        let dyy = scaled_pattern(&DYY, size);
        let dxy = scaled_pattern(&DXY, size);

        let mut responses = vec![0.0f64; cols * rows];
        for r in 0..rows {
            let cy = r * step;
            if !filter_fits(cy, size, integral.height()) {
                continue;
            }
            let top = (cy - size / 2) as i64;
            for c in 0..cols {
                let cx = c * step;
                if !filter_fits(cx, size, integral.width()) {
                    continue;
                }
                let left = (cx - size / 2) as i64;
                let xx = apply(integral, left, top, &dxx);
                let yy = apply(integral, left, top, &dyy);
                let xy = apply(integral, left, top, &dxy);
                responses[r * cols + c] = xx * yy - DXY_WEIGHT * xy * xy;
            }
        }

        Self {
            size,
            cols,
            rows,
            responses,
        }
    }

    #[inline]
    fn at(&self, r: isize, c: isize) -> Option<f64> {
        if r < 0 || c < 0 || r as usize >= self.rows || c as usize >= self.cols {
            return None;
        }
        self.responses.get(r as usize * self.cols + c as usize).copied()
    }
}

/// Whether a `size`-wide filter centred on `center` lies inside `[0, len)`.
#[inline]
fn filter_fits(center: usize, size: usize, len: usize) -> bool {
    center >= size / 2 && center - size / 2 + size <= len
}

/// Finds scale-space maxima of the Hessian determinant.
pub(crate) fn detect(integral: &IntegralImage, cfg: &HessianConfig) -> Vec<Keypoint> {
    let width = integral.width();
    let height = integral.height();
    let mut keypoints = Vec::new();

    for octave in 0..cfg.octaves {
        let step = 1usize << octave;
        let sizes: Vec<usize> = (0..cfg.octave_layers + 2)
            .map(|layer| (BASE_SIZE + SIZE_INC * layer) << octave)
            .collect();
        if sizes[0] > width.min(height) {
            break;
        }
        let layers: Vec<ResponseLayer> = sizes
            .iter()
            .map(|&size| ResponseLayer::build(integral, size, step))
            .collect();

        for mid in 1..=cfg.octave_layers {
            let below = &layers[mid - 1];
            let layer = &layers[mid];
            let above = &layers[mid + 1];
            for r in 0..layer.rows {
                if !filter_fits(r * step, above.size, height) {
                    continue;
                }
                for c in 0..layer.cols {
                    if !filter_fits(c * step, above.size, width) {
                        continue;
                    }
                    let value = layer.responses[r * layer.cols + c];
                    if value < cfg.min_hessian {
                        continue;
                    }
                    if !is_local_max(value, r as isize, c as isize, [below, layer, above]) {
                        continue;
                    }
                    let size = layer.size as f64;
                    keypoints.push(Keypoint {
                        x: (c * step) as f64,
                        y: (r * step) as f64,
                        size,
                        scale: 1.2 * size / BASE_SIZE as f64,
                        response: value,
                        angle: 0.0,
                        octave,
                    });
                }
            }
        }
    }

    keypoints
}

/// Strict maximum over the 3x3x3 neighbourhood.
fn is_local_max(value: f64, r: isize, c: isize, stack: [&ResponseLayer; 3]) -> bool {
    for (li, layer) in stack.iter().enumerate() {
        for dr in -1..=1 {
            for dc in -1..=1 {
                if li == 1 && dr == 0 && dc == 0 {
                    continue;
                }
                if let Some(other) = layer.at(r + dr, c + dc) {
                    if other >= value {
                        return false;
                    }
                }
            }
        }
    }
    true
}
