//! Structural similarity engine.
//!
//! Resizes the target to the template's shape and reports the mean SSIM
//! over every fully contained `window_size` square.

use crate::config::EngineOptions;
use crate::engine::{require_template, Engine, EngineResponse, ExecuteOptions};
use crate::image::integral::IntegralImage;
use crate::image::resize::resize_bilinear;
use crate::image::ImageView;
use crate::trace::{trace_debug, trace_event};
use crate::util::{FindItError, FindItResult};
use serde::Serialize;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DYNAMIC_RANGE: f64 = 255.0;

/// Sim engine configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SimEngineConfig {
    /// Side of the uniform SSIM window (odd).
    pub window_size: usize,
}

impl Default for SimEngineConfig {
    fn default() -> Self {
        Self { window_size: 7 }
    }
}

impl SimEngineConfig {
    pub fn from_options(opts: &EngineOptions) -> FindItResult<Self> {
        let mut cfg = Self::default();
        if let Some(v) = opts.engine_sim_window_size {
            cfg.window_size = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> FindItResult<()> {
        if self.window_size == 0 || self.window_size % 2 == 0 {
            return Err(FindItError::InvalidConfig("window_size must be odd"));
        }
        Ok(())
    }
}

/// Mean SSIM of two equally sized images.
///
/// The window shrinks to the largest odd size that fits both axes.
pub fn mean_ssim(
    a: ImageView<'_, u8>,
    b: ImageView<'_, u8>,
    window_size: usize,
) -> FindItResult<f64> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(FindItError::InvalidInput("ssim inputs differ in size"));
    }
    let (width, height) = (a.width(), a.height());
    let mut win = window_size.min(width).min(height);
    if win % 2 == 0 {
        win -= 1;
    }
    let win = win.max(1);

    let sum_a = IntegralImage::new(a);
    let sum_b = IntegralImage::new(b);
    let sum_aa = IntegralImage::squared(a);
    let sum_bb = IntegralImage::squared(b);
    let sum_ab = IntegralImage::product(a, b);

    let n = (win * win) as f64;
    let cov_norm = if win > 1 { n / (n - 1.0) } else { 1.0 };
    let c1 = (K1 * DYNAMIC_RANGE).powi(2);
    let c2 = (K2 * DYNAMIC_RANGE).powi(2);

    let mut total = 0.0;
    let mut count = 0usize;
    for y in 0..=(height - win) {
        for x in 0..=(width - win) {
            let (x0, y0) = (x as i64, y as i64);
            let (x1, y1) = (x0 + win as i64, y0 + win as i64);
            let ua = sum_a.box_sum(x0, y0, x1, y1) / n;
            let ub = sum_b.box_sum(x0, y0, x1, y1) / n;
            let va = cov_norm * (sum_aa.box_sum(x0, y0, x1, y1) / n - ua * ua);
            let vb = cov_norm * (sum_bb.box_sum(x0, y0, x1, y1) / n - ub * ub);
            let vab = cov_norm * (sum_ab.box_sum(x0, y0, x1, y1) / n - ua * ub);

            let num = (2.0 * ua * ub + c1) * (2.0 * vab + c2);
            let den = (ua * ua + ub * ub + c1) * (va + vb + c2);
            total += num / den;
            count += 1;
        }
    }
    Ok(total / count as f64)
}

/// SSIM between the template and the resized target.
#[derive(Clone, Debug)]
pub struct SimEngine {
    config: SimEngineConfig,
}

impl SimEngine {
    pub const NAME: &'static str = "sim";

    pub fn new(config: SimEngineConfig) -> FindItResult<Self> {
        config.validate()?;
        trace_event!("engine_loaded", engine = Self::NAME, window_size = config.window_size);
        Ok(Self { config })
    }

    pub fn from_options(opts: &EngineOptions) -> FindItResult<Self> {
        Self::new(SimEngineConfig::from_options(opts)?)
    }
}

impl Engine for SimEngine {
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
        let ssim = if target.width() == template.width() && target.height() == template.height() {
            mean_ssim(template, target, self.config.window_size)?
        } else {
            let resized = resize_bilinear(target, template.width(), template.height())?;
            mean_ssim(template, resized.view(), self.config.window_size)?
        };
        trace_debug!("ssim", value = ssim);

        let mut resp = EngineResponse::new();
        resp.append_serialize("conf", &self.config, false)?;
        resp.append("ssim", ssim, true);
        resp.append("ok", true, true);
        Ok(resp)
    }
}
