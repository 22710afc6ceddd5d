//! Rayon-parallel surface computation (feature-gated).
//!
//! Parallelises over placement rows; every worker reads the shared plan and
//! image and produces one row of scores.

use crate::image::ImageView;
use crate::kernel::scalar::CorrScalar;
use crate::kernel::{placement_grid, CorrelationSurface};
use crate::template::SurfacePlan;
use crate::util::FindItResult;
use rayon::prelude::*;

/// Row-parallel full scan.
pub fn scan_full_par(
    image: ImageView<'_, u8>,
    plan: &SurfacePlan,
) -> FindItResult<CorrelationSurface> {
    let (grid_w, grid_h) = placement_grid(image, plan)?;

    let rows: Vec<Vec<f64>> = (0..grid_h)
        .into_par_iter()
        .map(|y| {
            (0..grid_w)
                .map(|x| {
                    let (dot, sum_i, sum_i2) = CorrScalar::window_sums(image, plan, x, y);
                    plan.finish(dot, sum_i, sum_i2)
                })
                .collect()
        })
        .collect();

    let scores = rows.into_iter().flatten().collect();
    CorrelationSurface::new(grid_w, grid_h, scores)
}
