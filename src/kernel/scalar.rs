//! Scalar reference kernel for score evaluation.

use crate::image::ImageView;
use crate::kernel::{placement_grid, CorrelationSurface, Kernel};
use crate::template::SurfacePlan;
use crate::util::FindItResult;

/// Scalar masked correlation kernel.
pub(crate) struct CorrScalar;

impl CorrScalar {
    /// Accumulates `(Σ w·t·i, Σ w·i, Σ w·i²)` at a placement.
    ///
    /// Callers guarantee the window lies inside the image.
    #[inline]
    pub(crate) fn window_sums(
        image: ImageView<'_, u8>,
        plan: &SurfacePlan,
        x: usize,
        y: usize,
    ) -> (f64, f64, f64) {
        let tpl_width = plan.width();
        let values = plan.values();
        let weights = plan.weights();

        let mut dot = 0.0f64;
        let mut sum_i = 0.0f64;
        let mut sum_i2 = 0.0f64;
        for ty in 0..plan.height() {
            let Some(img_row) = image.row(y + ty) else {
                break;
            };
            let base = ty * tpl_width;
            let window = &img_row[x..x + tpl_width];
            for (tx, &pixel) in window.iter().enumerate() {
                let w = weights[base + tx];
                let value = f64::from(pixel) * w;
                dot += values[base + tx] * value;
                sum_i += value;
                sum_i2 += value * value;
            }
        }
        (dot, sum_i, sum_i2)
    }
}

impl Kernel for CorrScalar {
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
