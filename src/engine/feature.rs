//! Feature-point matching engine.
//!
//! Locates the template by matching local descriptors and taking the centre
//! of the densest group of matched target points. Finding nothing is a
//! regular outcome (`ok = false`), not an error.

use crate::config::EngineOptions;
use crate::engine::{require_template, Engine, EngineResponse, ExecuteOptions};
use crate::feature::{detect_and_describe, effective_k, kmeans, ratio_test_matches, HessianConfig};
use crate::image::{ImageView, Point};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::{FindItError, FindItResult};
use serde::Serialize;

/// Feature engine configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FeatureEngineConfig {
    /// Requested k-means cluster count.
    pub cluster_num: usize,
    /// Ratio-test threshold; higher accepts more matches.
    pub distance_threshold: f64,
    #[serde(flatten)]
    pub detector: HessianConfig,
}

impl Default for FeatureEngineConfig {
    fn default() -> Self {
        Self {
            cluster_num: 3,
            distance_threshold: 0.9,
            detector: HessianConfig::default(),
        }
    }
}

impl FeatureEngineConfig {
    /// Applies the `engine_feature_*` options over the defaults.
    pub fn from_options(opts: &EngineOptions) -> FindItResult<Self> {
        let mut cfg = Self::default();
        if let Some(v) = opts.engine_feature_cluster_num {
            cfg.cluster_num = v;
        }
        if let Some(v) = opts.engine_feature_distance_threshold {
            cfg.distance_threshold = v;
        }
        if let Some(v) = opts.engine_feature_min_hessian {
            cfg.detector.min_hessian = v;
        }
        if let Some(v) = opts.engine_feature_octaves {
            cfg.detector.octaves = v;
        }
        if let Some(v) = opts.engine_feature_octave_layers {
            cfg.detector.octave_layers = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> FindItResult<()> {
        if self.cluster_num == 0 {
            return Err(FindItError::InvalidConfig("cluster_num must be >= 1"));
        }
        let r = self.distance_threshold;
        if !r.is_finite() || r <= 0.0 || r > 1.0 {
            return Err(FindItError::InvalidConfig(
                "distance_threshold must be in (0, 1]",
            ));
        }
        self.detector.validate()
    }
}

/// Descriptor matching plus k-means localisation.
#[derive(Clone, Debug)]
pub struct FeatureEngine {
    config: FeatureEngineConfig,
}

impl FeatureEngine {
    pub const NAME: &'static str = "feature";

    pub fn new(config: FeatureEngineConfig) -> FindItResult<Self> {
        config.validate()?;
        trace_event!(
            "engine_loaded",
            engine = Self::NAME,
            cluster_num = config.cluster_num,
            distance_threshold = config.distance_threshold,
            min_hessian = config.detector.min_hessian
        );
        Ok(Self { config })
    }

    pub fn from_options(opts: &EngineOptions) -> FindItResult<Self> {
        Self::new(FeatureEngineConfig::from_options(opts)?)
    }

    pub fn config(&self) -> &FeatureEngineConfig {
        &self.config
    }

    /// Target coordinates of every accepted match, with keypoint counts.
    fn matched_points(
        &self,
        template: ImageView<'_, u8>,
        target: ImageView<'_, u8>,
    ) -> (Vec<Point>, usize, usize) {
        let template_features = detect_and_describe(template, &self.config.detector);
        let target_features = detect_and_describe(target, &self.config.detector);
        trace_debug!(
            "keypoints_detected",
            template = template_features.len(),
            target = target_features.len()
        );

        let matches = ratio_test_matches(
            &template_features,
            &target_features,
            self.config.distance_threshold,
        );
        let points = matches
            .iter()
            .map(|m| {
                let kp = &target_features[m.train].keypoint;
                Point::new(kp.x, kp.y)
            })
            .collect();
        (points, template_features.len(), target_features.len())
    }
}

impl Engine for FeatureEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute(
        &self,
        template: Option<ImageView<'_, u8>>,
        target: ImageView<'_, u8>,
        _extras: &ExecuteOptions<'_>,
    ) -> FindItResult<EngineResponse> {
        let template = require_template(Self::NAME, template)?;
        let _span = trace_span!(
            "feature_search",
            template_width = template.width(),
            template_height = template.height()
        )
        .entered();

        let mut resp = EngineResponse::new();
        resp.append_serialize("conf", &self.config, false)?;

        let (points, template_kps, target_kps) = self.matched_points(template, target);
        let clustering = kmeans(&points, self.config.cluster_num);
        let Some(dominant) = clustering.dominant() else {
            trace_event!("feature_not_found", template_keypoints = template_kps);
            resp.append("target_point", Point::NOT_FOUND, true);
            resp.append("raw", "not found", false);
            resp.append("template_keypoint_num", template_kps, false);
            resp.append("target_keypoint_num", target_kps, false);
            resp.append("ok", false, true);
            return Ok(resp);
        };

        trace_event!(
            "feature_match",
            x = dominant.centroid.x,
            y = dominant.centroid.y,
            matches = points.len(),
            clusters = effective_k(points.len(), self.config.cluster_num)
        );

        resp.append("target_point", dominant.centroid, true);
        resp.append("feature_point_num", points.len(), true);
        resp.append_serialize("raw", &points, false)?;
        resp.append("template_keypoint_num", template_kps, false);
        resp.append("target_keypoint_num", target_kps, false);
        resp.append("ok", true, true);
        Ok(resp)
    }
}
