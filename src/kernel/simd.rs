//! SIMD-accelerated kernel using the `wide` crate.
//!
//! The inner template row loop is vectorised to process 4 pixels at a time
//! using `f64x4`; mask weights ride along as a lane multiplier.

use crate::image::ImageView;
use crate::kernel::{placement_grid, CorrelationSurface, Kernel};
use crate::template::SurfacePlan;
use crate::util::FindItResult;
use wide::f64x4;

const LANES: usize = 4;

/// Load 4 u8 values and convert to f64x4.
#[inline]
fn load_u8x4_as_f64x4(slice: &[u8]) -> f64x4 {
    f64x4::from([
        f64::from(slice[0]),
        f64::from(slice[1]),
        f64::from(slice[2]),
        f64::from(slice[3]),
    ])
}

/// Load 4 f64 values into f64x4.
#[inline]
fn load_f64x4(slice: &[f64]) -> f64x4 {
    f64x4::from([slice[0], slice[1], slice[2], slice[3]])
}

/// Horizontal sum of f64x4.
#[inline]
fn hsum(v: f64x4) -> f64 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3]
}

/// SIMD correlation kernel.
pub struct CorrSimd;

impl CorrSimd {
    fn window_sums(
        image: ImageView<'_, u8>,
        plan: &SurfacePlan,
        x: usize,
        y: usize,
    ) -> (f64, f64, f64) {
        let tpl_width = plan.width();
        let values = plan.values();
        let weights = plan.weights();

        let mut dot_vec = f64x4::ZERO;
        let mut sum_i_vec = f64x4::ZERO;
        let mut sum_i2_vec = f64x4::ZERO;

        let mut dot_s = 0.0f64;
        let mut sum_i_s = 0.0f64;
        let mut sum_i2_s = 0.0f64;

        let simd_end = tpl_width / LANES * LANES;

        for ty in 0..plan.height() {
            let Some(img_row) = image.row(y + ty) else {
                break;
            };
            let base = ty * tpl_width;

            let mut tx = 0;
            while tx < simd_end {
                let w = load_f64x4(&weights[base + tx..]);
                let img_vals = load_u8x4_as_f64x4(&img_row[x + tx..]) * w;
                let tpl_vals = load_f64x4(&values[base + tx..]);

                dot_vec += tpl_vals * img_vals;
                sum_i_vec += img_vals;
                sum_i2_vec += img_vals * img_vals;

                tx += LANES;
            }

            // Scalar remainder
            while tx < tpl_width {
                let idx = base + tx;
                let value = f64::from(img_row[x + tx]) * weights[idx];
                dot_s += values[idx] * value;
                sum_i_s += value;
                sum_i2_s += value * value;
                tx += 1;
            }
        }

        (
            hsum(dot_vec) + dot_s,
            hsum(sum_i_vec) + sum_i_s,
            hsum(sum_i2_vec) + sum_i2_s,
        )
    }
}

impl Kernel for CorrSimd {
    fn score_at(image: ImageView<'_, u8>, plan: &SurfacePlan, x: usize, y: usize) -> f64 {
        if image.width() < plan.width() || image.height() < plan.height() {
            return f64::NEG_INFINITY;
        }
        if x > image.width() - plan.width() || y > image.height() - plan.height() {
            return f64::NEG_INFINITY;
        }
        let (dot, sum_i, sum_i2) = Self::window_sums(image, plan, x, y);
        plan.finish(dot, sum_i, sum_i2)
    }

    fn scan_full(
        image: ImageView<'_, u8>,
        plan: &SurfacePlan,
    ) -> FindItResult<CorrelationSurface> {
        let (grid_w, grid_h) = placement_grid(image, plan)?;
        let mut scores = Vec::with_capacity(grid_w * grid_h);
        for y in 0..grid_h {
            for x in 0..grid_w {
                let (dot, sum_i, sum_i2) = Self::window_sums(image, plan, x, y);
                scores.push(plan.finish(dot, sum_i, sum_i2));
            }
        }
        CorrelationSurface::new(grid_w, grid_h, scores)
    }
}
