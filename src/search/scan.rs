//! Dense scan of one template scale over the target.

use crate::image::ImageView;
use crate::kernel::{compute_surface, SurfaceExtremes};
use crate::template::SurfacePlan;
use crate::util::FindItResult;

/// Offset subtracted from the surface maximum before applying the
/// multi-target ratio. For a negative maximum the scaled threshold exceeds
/// it and no placement qualifies.
pub(crate) const MULTI_TARGET_EPS: f64 = 1e-6;

/// Extremes and near-best placements of one correlation surface.
#[derive(Clone, Debug)]
pub(crate) struct ScanSummary {
    pub extremes: SurfaceExtremes,
    /// Top-left placements scoring at least `(max - eps) * max_threshold`.
    pub candidates: Vec<(usize, usize)>,
}

/// Scores every placement of `plan` inside `image` and summarises the
/// surface.
pub(crate) fn scan_plan(
    image: ImageView<'_, u8>,
    plan: &SurfacePlan,
    max_threshold: f64,
    parallel: bool,
) -> FindItResult<ScanSummary> {
    let surface = compute_surface(image, plan, parallel)?;
    let extremes = surface.extremes();
    let threshold = (extremes.max_val - MULTI_TARGET_EPS) * max_threshold;
    let candidates = surface.locations_at_least(threshold);
    Ok(ScanSummary {
        extremes,
        candidates,
    })
}

#[cfg(test)]
mod tests {
    use super::scan_plan;
    use crate::image::ImageView;
    use crate::kernel::CorrMethod;
    use crate::template::SurfacePlan;

    #[test]
    fn exact_peak_is_a_candidate() {
        let mut image = vec![0u8; 10 * 10];
        let mut state = 12345u32;
        for v in image.iter_mut() {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            *v = (state >> 16) as u8;
        }
        let tpl: Vec<u8> = (0..3)
            .flat_map(|y| image[(4 + y) * 10 + 5..(4 + y) * 10 + 8].to_vec())
            .collect();
        let image_view = ImageView::from_slice(&image, 10, 10).unwrap();
        let tpl_view = ImageView::from_slice(&tpl, 3, 3).unwrap();
        let plan = SurfacePlan::from_view(tpl_view, CorrMethod::CcoeffNormed).unwrap();
        let summary = scan_plan(image_view, &plan, 1.0, false).unwrap();
        assert_eq!(summary.extremes.max_loc, (5, 4));
        assert!(summary.candidates.contains(&(5, 4)));
    }

    #[test]
    fn negative_peak_yields_no_candidates() {
        let image: Vec<u8> = (0..9u8).map(|v| v * 20).collect();
        let tpl: Vec<u8> = image.iter().map(|&v| 255 - v).collect();
        let image_view = ImageView::from_slice(&image, 3, 3).unwrap();
        let tpl_view = ImageView::from_slice(&tpl, 3, 3).unwrap();
        let plan = SurfacePlan::from_view(tpl_view, CorrMethod::CcoeffNormed).unwrap();
        let summary = scan_plan(image_view, &plan, 0.99, false).unwrap();
        assert!(summary.extremes.max_val < 0.0);
        assert!(summary.candidates.is_empty());
    }
}
