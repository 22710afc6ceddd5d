//! Multi-scale template search.
//!
//! The template (and its mask) is resized to every configured scale in
//! order; each fitting scale is scanned densely and the scale with the
//! highest maximum wins. The sweep stops at the first scale whose template
//! no longer fits the target.

use crate::image::resize::{resize, resize_nearest, scaled_size};
use crate::image::ImageView;
use crate::kernel::CorrMethod;
use crate::template::SurfacePlan;
use crate::trace::trace_debug;
use crate::util::{FindItError, FindItResult};
use serde::Serialize;

pub(crate) mod scan;

use scan::{scan_plan, ScanSummary};

/// One evaluated scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScaleRecord {
    pub scale: f64,
    pub width: usize,
    pub height: usize,
    pub max_val: f64,
}

/// The winning scale and its scan summary.
#[derive(Clone, Debug)]
pub(crate) struct ScaleMatch {
    pub scale: f64,
    pub template_width: usize,
    pub template_height: usize,
    pub summary: ScanSummary,
}

/// Result of a full scale sweep.
#[derive(Clone, Debug)]
pub(crate) struct SweepOutcome {
    pub best: ScaleMatch,
    pub evaluated: Vec<ScaleRecord>,
}

/// Parameters shared by every scale of one sweep.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SweepParams<'a> {
    pub scales: &'a [f64],
    pub method: CorrMethod,
    pub max_threshold: f64,
    pub parallel: bool,
}

/// Runs the scale sweep of `template` over `target`.
pub(crate) fn sweep_scales(
    template: ImageView<'_, u8>,
    mask: Option<ImageView<'_, u8>>,
    target: ImageView<'_, u8>,
    params: &SweepParams<'_>,
) -> FindItResult<SweepOutcome> {
    let mut best: Option<ScaleMatch> = None;
    let mut evaluated = Vec::with_capacity(params.scales.len());

    for &scale in params.scales {
        let (width, height) = scaled_size(template.width(), template.height(), scale);
        if width > target.width() || height > target.height() {
            trace_debug!("scale_rejected", scale = scale, width = width, height = height);
            break;
        }

        let scaled = resize(template, width, height)?;
        let plan = match mask {
            Some(mask) => {
                let scaled_mask = resize_nearest(mask, width, height)?;
                SurfacePlan::with_mask(scaled.view(), scaled_mask.view(), params.method)?
            }
            None => SurfacePlan::from_view(scaled.view(), params.method)?,
        };

        let summary = scan_plan(target, &plan, params.max_threshold, params.parallel)?;
        let max_val = summary.extremes.max_val;
        trace_debug!(
            "scale_scanned",
            scale = scale,
            width = width,
            height = height,
            max_val = max_val
        );
        evaluated.push(ScaleRecord {
            scale,
            width,
            height,
            max_val,
        });

        let improves = best
            .as_ref()
            .map_or(true, |current| max_val > current.summary.extremes.max_val);
        if improves {
            best = Some(ScaleMatch {
                scale,
                template_width: width,
                template_height: height,
                summary,
            });
        }
    }

    let best = best.ok_or(FindItError::NoCandidateScale {
        template_width: template.width(),
        template_height: template.height(),
        target_width: target.width(),
        target_height: target.height(),
    })?;
    Ok(SweepOutcome { best, evaluated })
}
