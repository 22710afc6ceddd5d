//! findit locates small template images inside a larger target image.
//!
//! Engines share one trait and one result envelope:
//!
//! - `template`: multi-scale normalised correlation with optional mask,
//!   multi-target detection and distance-based NMS;
//! - `feature`: Hessian keypoints, ratio-tested descriptor matches and
//!   k-means localisation;
//! - `sim`: mean SSIM against the target resized to the template;
//! - `ocr`: text recognition through a pluggable [`TextRecognizer`].
//!
//! [`Matcher`] runs a set of engines over every template in a
//! [`TemplateStore`]. Parallel correlation is available behind the `rayon`
//! feature, SIMD kernels behind `simd`, image decoding behind `image-io`.

mod candidate;
pub mod config;
pub mod engine;
pub mod feature;
pub mod image;
pub mod kernel;
pub mod matcher;
mod search;
pub mod template;
mod trace;
pub mod util;

pub use config::{EngineOptions, ScaleRange};
pub use engine::{
    Engine, EngineRegistry, EngineResponse, ExecuteOptions, FeatureEngine, FeatureEngineConfig,
    OcrEngine, OcrEngineConfig, SimEngine, SimEngineConfig, TemplateEngine, TemplateEngineConfig,
    TextRecognizer, Verbosity,
};
pub use image::{ImageView, Point, RasterBuffer};
pub use kernel::{CorrMethod, CorrelationSurface};
pub use matcher::{EngineResult, MatchResult, Matcher, MatcherState, TemplateResult};
pub use search::ScaleRecord;
pub use template::{Template, TemplateSource, TemplateStore};
pub use util::{ErrorCategory, FindItError, FindItResult};
