//! Matching engines behind a common trait.
//!
//! An engine is built once from [`EngineOptions`](crate::EngineOptions) and
//! is immutable afterwards; `execute` only reads its configuration, so
//! engines are `Send + Sync` and may be shared across threads.

use crate::image::ImageView;
use crate::util::{FindItError, FindItResult};

pub mod feature;
pub mod ocr;
pub mod registry;
pub mod response;
pub mod sim;
pub mod template;

pub use feature::{FeatureEngine, FeatureEngineConfig};
pub use ocr::{OcrEngine, OcrEngineConfig, TextRecognizer};
pub use registry::{EngineConstructor, EngineRegistry};
pub use response::{EngineResponse, Verbosity};
pub use sim::{SimEngine, SimEngineConfig};
pub use template::{TemplateEngine, TemplateEngineConfig};

/// Per-call extras passed alongside template and target.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExecuteOptions<'a> {
    /// Template mask; zero pixels are excluded from template correlation.
    pub mask: Option<ImageView<'a, u8>>,
}

impl<'a> ExecuteOptions<'a> {
    pub fn with_mask(mask: ImageView<'a, u8>) -> Self {
        Self { mask: Some(mask) }
    }
}

/// A matching engine.
pub trait Engine: Send + Sync {
    /// Registry name, also the key of this engine's results.
    fn name(&self) -> &'static str;

    /// Whether `execute` needs a template image.
    fn requires_template(&self) -> bool {
        true
    }

    /// Runs the engine on one template/target pair.
    fn execute(
        &self,
        template: Option<ImageView<'_, u8>>,
        target: ImageView<'_, u8>,
        extras: &ExecuteOptions<'_>,
    ) -> FindItResult<EngineResponse>;
}

/// Unwraps the template or reports which engine needed it.
pub(crate) fn require_template<'a>(
    engine: &'static str,
    template: Option<ImageView<'a, u8>>,
) -> FindItResult<ImageView<'a, u8>> {
    template.ok_or(FindItError::MissingTemplate { engine })
}
