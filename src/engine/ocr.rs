//! Text recognition engine over a pluggable recogniser.
//!
//! No recogniser ships with the crate; callers register an `"ocr"`
//! constructor bound to their own [`TextRecognizer`]. Without one, or when
//! the configured language is unavailable, the engine answers `ok = false`.

use crate::config::EngineOptions;
use crate::engine::{Engine, EngineResponse, ExecuteOptions};
use crate::image::ImageView;
use crate::trace::trace_event;
use crate::util::{FindItError, FindItResult};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// External text recogniser.
pub trait TextRecognizer: Send + Sync {
    /// Language codes this recogniser can read.
    fn available_languages(&self) -> Vec<String>;

    /// Recognises all text in `image`.
    fn recognize(&self, image: ImageView<'_, u8>, lang: &str) -> FindItResult<String>;
}

/// OCR engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OcrEngineConfig {
    pub lang: String,
}

impl Default for OcrEngineConfig {
    fn default() -> Self {
        Self { lang: "eng".into() }
    }
}

impl OcrEngineConfig {
    pub fn from_options(opts: &EngineOptions) -> FindItResult<Self> {
        let mut cfg = Self::default();
        if let Some(lang) = &opts.engine_ocr_lang {
            cfg.lang = lang.clone();
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> FindItResult<()> {
        if self.lang.trim().is_empty() {
            return Err(FindItError::InvalidConfig("ocr lang must not be empty"));
        }
        Ok(())
    }
}

/// Runs a [`TextRecognizer`] over the target.
#[derive(Clone)]
pub struct OcrEngine {
    config: OcrEngineConfig,
    recognizer: Option<Arc<dyn TextRecognizer>>,
}

impl fmt::Debug for OcrEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrEngine")
            .field("config", &self.config)
            .field("recognizer", &self.recognizer.is_some())
            .finish()
    }
}

impl OcrEngine {
    pub const NAME: &'static str = "ocr";

    /// Engine without a recogniser; every call reports `ok = false`.
    pub fn new(config: OcrEngineConfig) -> FindItResult<Self> {
        config.validate()?;
        trace_event!("engine_loaded", engine = Self::NAME, lang = config.lang.as_str());
        Ok(Self {
            config,
            recognizer: None,
        })
    }

    pub fn with_recognizer(
        config: OcrEngineConfig,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> FindItResult<Self> {
        let mut engine = Self::new(config)?;
        engine.recognizer = Some(recognizer);
        Ok(engine)
    }

    pub fn from_options(opts: &EngineOptions) -> FindItResult<Self> {
        Self::new(OcrEngineConfig::from_options(opts)?)
    }
}

impl Engine for OcrEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires_template(&self) -> bool {
        false
    }

    fn execute(
        &self,
        _template: Option<ImageView<'_, u8>>,
        target: ImageView<'_, u8>,
        _extras: &ExecuteOptions<'_>,
    ) -> FindItResult<EngineResponse> {
        let mut resp = EngineResponse::new();
        let Some(recognizer) = &self.recognizer else {
            resp.append("conf", json!({ "lang": self.config.lang }), true);
            resp.append("raw", "no text recognizer configured", true);
            resp.append("ok", false, true);
            return Ok(resp);
        };

        let languages = recognizer.available_languages();
        resp.append(
            "conf",
            json!({ "lang": self.config.lang, "available_languages": languages }),
            true,
        );
        if !languages.iter().any(|l| *l == self.config.lang) {
            resp.append("raw", "this language not available", true);
            resp.append("ok", false, true);
            return Ok(resp);
        }

        let text = recognizer.recognize(target, &self.config.lang)?;
        resp.append("raw", text, true);
        resp.append("ok", true, true);
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::{OcrEngine, OcrEngineConfig, TextRecognizer};
    use crate::engine::{Engine, ExecuteOptions};
    use crate::image::{ImageView, RasterBuffer};
    use crate::util::FindItResult;
    use serde_json::json;
    use std::sync::Arc;

    struct Fixed;

    impl TextRecognizer for Fixed {
        fn available_languages(&self) -> Vec<String> {
            vec!["eng".into()]
        }

        fn recognize(&self, image: ImageView<'_, u8>, _lang: &str) -> FindItResult<String> {
            Ok(format!("{}x{}", image.width(), image.height()))
        }
    }

    #[test]
    fn without_recognizer_reports_not_ok() {
        let engine = OcrEngine::new(OcrEngineConfig::default()).unwrap();
        let target = RasterBuffer::filled(4, 4, 0).unwrap();
        let resp = engine
            .execute(None, target.view(), &ExecuteOptions::default())
            .unwrap();
        assert!(!resp.is_ok());
        assert!(resp.get_brief().contains_key("conf"));
    }

    #[test]
    fn recognizer_text_is_brief() {
        let engine =
            OcrEngine::with_recognizer(OcrEngineConfig::default(), Arc::new(Fixed)).unwrap();
        let target = RasterBuffer::filled(6, 4, 0).unwrap();
        let resp = engine
            .execute(None, target.view(), &ExecuteOptions::default())
            .unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.get_brief()["raw"], json!("6x4"));
    }

    #[test]
    fn unavailable_language_is_not_ok() {
        let cfg = OcrEngineConfig {
            lang: "chi_sim".into(),
        };
        let engine = OcrEngine::with_recognizer(cfg, Arc::new(Fixed)).unwrap();
        let target = RasterBuffer::filled(6, 4, 0).unwrap();
        let resp = engine
            .execute(None, target.view(), &ExecuteOptions::default())
            .unwrap();
        assert!(!resp.is_ok());
        assert_eq!(resp.get_brief()["raw"], json!("this language not available"));
    }
}
