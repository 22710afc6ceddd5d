//! Engine option bag and shared configuration types.
//!
//! [`EngineOptions`] is a flat set of optional keys namespaced by engine
//! (`engine_<engine>_<option>`). It deserialises directly from the JSON
//! objects used by the CLI and the Python bindings; every engine derives its
//! own validated config from it.

use crate::util::math::linspace;
use crate::util::{FindItError, FindItResult};
use serde::{Deserialize, Serialize};

/// Evenly spaced template scale factors, `steps + 1` values from `min` to
/// `max` inclusive. Serialises as `[min, max, steps]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64, u32)", into = "(f64, f64, u32)")]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
    pub steps: u32,
}

impl ScaleRange {
    pub const fn new(min: f64, max: f64, steps: u32) -> Self {
        Self { min, max, steps }
    }

    /// A single scale factor.
    pub const fn single(scale: f64) -> Self {
        Self::new(scale, scale, 0)
    }

    pub fn validate(&self) -> FindItResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(FindItError::InvalidConfig("scale bounds must be finite"));
        }
        if self.min <= 0.0 {
            return Err(FindItError::InvalidConfig("scale min must be > 0"));
        }
        if self.max < self.min {
            return Err(FindItError::InvalidConfig("scale max must be >= min"));
        }
        Ok(())
    }

    /// The scale factors in sweep order.
    pub fn factors(&self) -> Vec<f64> {
        linspace(self.min, self.max, self.steps)
    }
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self::new(1.0, 3.0, 10)
    }
}

impl From<(f64, f64, u32)> for ScaleRange {
    fn from((min, max, steps): (f64, f64, u32)) -> Self {
        Self::new(min, max, steps)
    }
}

impl From<ScaleRange> for (f64, f64, u32) {
    fn from(range: ScaleRange) -> Self {
        (range.min, range.max, range.steps)
    }
}

/// Flat, optional per-engine settings.
///
/// Unset keys fall back to each engine's defaults. Unknown keys are
/// rejected so that typos surface as configuration errors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineOptions {
    /// Correlation method name, e.g. `cv2.TM_CCORR_NORMED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_template_cv_method_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_template_scale: Option<ScaleRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_template_multi_target_max_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_template_multi_target_distance_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_template_multi_target_limit: Option<usize>,
    /// Target resize factor applied before the search (1.0 = none).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_template_compress_rate: Option<f64>,
    /// Use the row-parallel kernel (requires the `rayon` feature).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_template_parallel: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_feature_cluster_num: Option<usize>,
    /// Ratio-test threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_feature_distance_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_feature_min_hessian: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_feature_octaves: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_feature_octave_layers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_sim_window_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_ocr_lang: Option<String>,
}

impl EngineOptions {
    /// Parses options from a JSON object.
    pub fn from_json(value: serde_json::Value) -> FindItResult<Self> {
        serde_json::from_value(value).map_err(|e| FindItError::InvalidOptions {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineOptions, ScaleRange};
    use crate::util::FindItError;
    use serde_json::json;

    #[test]
    fn default_scale_range_has_eleven_factors() {
        let factors = ScaleRange::default().factors();
        assert_eq!(factors.len(), 11);
        assert_eq!(factors[0], 1.0);
        assert!((factors[1] - 1.2).abs() < 1e-12);
        assert_eq!(factors[10], 3.0);
    }

    #[test]
    fn scale_range_validation() {
        assert!(ScaleRange::new(0.0, 1.0, 2).validate().is_err());
        assert!(ScaleRange::new(2.0, 1.0, 2).validate().is_err());
        assert!(ScaleRange::new(1.0, f64::INFINITY, 2).validate().is_err());
        assert!(ScaleRange::single(0.5).validate().is_ok());
        assert_eq!(ScaleRange::single(0.5).factors(), vec![0.5]);
    }

    #[test]
    fn options_parse_from_flat_json() {
        let opts = EngineOptions::from_json(json!({
            "engine_template_scale": [1.0, 2.0, 4],
            "engine_template_cv_method_name": "cv2.TM_CCOEFF_NORMED",
            "engine_feature_cluster_num": 2
        }))
        .unwrap();
        assert_eq!(opts.engine_template_scale, Some(ScaleRange::new(1.0, 2.0, 4)));
        assert_eq!(opts.engine_feature_cluster_num, Some(2));
        assert!(opts.engine_ocr_lang.is_none());

        let back = serde_json::to_value(&opts).unwrap();
        assert_eq!(back["engine_template_scale"], json!([1.0, 2.0, 4]));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let err = EngineOptions::from_json(json!({ "engine_template_sclae": [1, 2, 3] }));
        match err {
            Err(FindItError::InvalidOptions { reason }) => {
                assert!(reason.contains("engine_template_sclae"), "{reason}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
