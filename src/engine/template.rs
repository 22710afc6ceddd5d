//! Multi-scale template matching engine.
//!
//! The template is swept over a range of scales; the scale with the highest
//! correlation peak wins. Besides the single best point, every placement
//! close to the peak score is kept as a candidate and thinned out with
//! distance-based non-maximum suppression.

use crate::candidate::nms::nms_distance;
use crate::config::{EngineOptions, ScaleRange};
use crate::engine::{require_template, Engine, EngineResponse, ExecuteOptions};
use crate::image::resize::resize;
use crate::image::{ImageView, Point, RasterBuffer};
use crate::kernel::CorrMethod;
use crate::search::{sweep_scales, SweepParams};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::{FindItError, FindItResult};
use serde::Serialize;
use serde_json::json;

/// Template engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemplateEngineConfig {
    #[serde(rename = "cv_method_name")]
    pub method: CorrMethod,
    pub scale: ScaleRange,
    /// Candidates must score at least `(max - 1e-6) * multi_target_max_threshold`.
    pub multi_target_max_threshold: f64,
    /// Minimum distance between reported candidates, in pixels.
    pub multi_target_distance_threshold: f64,
    /// Maximum number of reported candidates.
    pub multi_target_limit: usize,
    /// Target resize factor applied before searching.
    pub compress_rate: f64,
    /// Use the row-parallel kernel when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for TemplateEngineConfig {
    fn default() -> Self {
        Self {
            method: CorrMethod::CcorrNormed,
            scale: ScaleRange::default(),
            multi_target_max_threshold: 0.99,
            multi_target_distance_threshold: 10.0,
            multi_target_limit: 20,
            compress_rate: 1.0,
            parallel: false,
        }
    }
}

impl TemplateEngineConfig {
    /// Applies the `engine_template_*` options over the defaults.
    pub fn from_options(opts: &EngineOptions) -> FindItResult<Self> {
        let mut cfg = Self::default();
        if let Some(name) = &opts.engine_template_cv_method_name {
            cfg.method = CorrMethod::from_name(name)?;
        }
        if let Some(scale) = opts.engine_template_scale {
            cfg.scale = scale;
        }
        if let Some(v) = opts.engine_template_multi_target_max_threshold {
            cfg.multi_target_max_threshold = v;
        }
        if let Some(v) = opts.engine_template_multi_target_distance_threshold {
            cfg.multi_target_distance_threshold = v;
        }
        if let Some(v) = opts.engine_template_multi_target_limit {
            cfg.multi_target_limit = v;
        }
        if let Some(v) = opts.engine_template_compress_rate {
            cfg.compress_rate = v;
        }
        if let Some(v) = opts.engine_template_parallel {
            cfg.parallel = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> FindItResult<()> {
        self.scale.validate()?;
        let t = self.multi_target_max_threshold;
        if !t.is_finite() || t <= 0.0 || t > 1.0 {
            return Err(FindItError::InvalidConfig(
                "multi_target_max_threshold must be in (0, 1]",
            ));
        }
        let d = self.multi_target_distance_threshold;
        if !d.is_finite() || d < 0.0 {
            return Err(FindItError::InvalidConfig(
                "multi_target_distance_threshold must be >= 0",
            ));
        }
        if self.multi_target_limit == 0 {
            return Err(FindItError::InvalidConfig("multi_target_limit must be >= 1"));
        }
        if !self.compress_rate.is_finite() || self.compress_rate <= 0.0 {
            return Err(FindItError::InvalidConfig("compress_rate must be > 0"));
        }
        Ok(())
    }
}

/// Multi-scale correlation search.
#[derive(Clone, Debug)]
pub struct TemplateEngine {
    config: TemplateEngineConfig,
    factors: Vec<f64>,
}

impl TemplateEngine {
    pub const NAME: &'static str = "template";

    pub fn new(config: TemplateEngineConfig) -> FindItResult<Self> {
        config.validate()?;
        let factors = config.scale.factors();
        trace_event!(
            "engine_loaded",
            engine = Self::NAME,
            method = config.method.name(),
            scales = factors.len(),
            compress_rate = config.compress_rate
        );
        Ok(Self { config, factors })
    }

    pub fn from_options(opts: &EngineOptions) -> FindItResult<Self> {
        Self::new(TemplateEngineConfig::from_options(opts)?)
    }

    pub fn config(&self) -> &TemplateEngineConfig {
        &self.config
    }

    fn compress(&self, target: ImageView<'_, u8>) -> FindItResult<Option<RasterBuffer>> {
        let rate = self.config.compress_rate;
        if rate == 1.0 {
            return Ok(None);
        }
        let width = ((target.width() as f64 * rate).round() as usize).max(1);
        let height = ((target.height() as f64 * rate).round() as usize).max(1);
        trace_debug!(
            "target_compressed",
            from_width = target.width(),
            from_height = target.height(),
            width = width,
            height = height
        );
        resize(target, width, height).map(Some)
    }
}

impl Engine for TemplateEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute(
        &self,
        template: Option<ImageView<'_, u8>>,
        target: ImageView<'_, u8>,
        extras: &ExecuteOptions<'_>,
    ) -> FindItResult<EngineResponse> {
        let template = require_template(Self::NAME, template)?;
        let _span = trace_span!(
            "template_search",
            template_width = template.width(),
            template_height = template.height(),
            masked = extras.mask.is_some()
        )
        .entered();

        let compressed = self.compress(target)?;
        let search_target = compressed.as_ref().map_or(target, RasterBuffer::view);

        let params = SweepParams {
            scales: &self.factors,
            method: self.config.method,
            max_threshold: self.config.multi_target_max_threshold,
            parallel: self.config.parallel,
        };
        let outcome = sweep_scales(template, extras.mask, search_target, &params)?;
        let best = &outcome.best;
        let ext = best.summary.extremes;

        let half_w = best.template_width as f64 / 2.0;
        let half_h = best.template_height as f64 / 2.0;
        let centre = |(x, y): (usize, usize)| Point::new(x as f64 + half_w, y as f64 + half_h);

        let rate = self.config.compress_rate;
        let min_loc = centre(ext.min_loc).unscale(rate);
        let max_loc = centre(ext.max_loc).unscale(rate);

        let mut candidates: Vec<Point> = best
            .summary
            .candidates
            .iter()
            .map(|&loc| centre(loc))
            .collect();
        let nms = nms_distance(
            &mut candidates,
            self.config.multi_target_distance_threshold,
            self.config.multi_target_limit,
        );
        if nms.truncated {
            trace_event!(
                "multi_target_truncated",
                limit = self.config.multi_target_limit
            );
        }
        let all: Vec<Point> = nms.points.iter().map(|p| p.unscale(rate)).collect();

        trace_event!(
            "template_match",
            x = max_loc.x,
            y = max_loc.y,
            score = ext.max_val,
            scale = best.scale,
            candidates = all.len()
        );

        let mut resp = EngineResponse::new();
        resp.append_serialize("conf", &self.config, false)?;
        resp.append("target_point", max_loc, true);
        resp.append("target_sim", ext.max_val, true);
        resp.append(
            "raw",
            json!({
                "min_val": ext.min_val,
                "max_val": ext.max_val,
                "min_loc": min_loc,
                "max_loc": max_loc,
                "all": all,
                "scale": best.scale,
                "truncated": nms.truncated,
            }),
            false,
        );
        resp.append_serialize("scales", &outcome.evaluated, false)?;
        resp.append("ok", true, true);
        Ok(resp)
    }
}
