//! Name → constructor registry for engines.

use crate::config::EngineOptions;
use crate::engine::{Engine, FeatureEngine, OcrEngine, SimEngine, TemplateEngine};
use crate::util::{FindItError, FindItResult};
use std::fmt;
use std::sync::Arc;

/// Builds an engine from the shared option bag.
pub type EngineConstructor =
    Arc<dyn Fn(&EngineOptions) -> FindItResult<Box<dyn Engine>> + Send + Sync>;

/// Ordered map from engine names to constructors.
///
/// [`EngineRegistry::default`] holds the built-in `template`, `feature`,
/// `ocr` and `sim` engines.
#[derive(Clone)]
pub struct EngineRegistry {
    entries: Vec<(String, EngineConstructor)>,
}

impl EngineRegistry {
    /// Registry without any engine.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry with the built-in engines.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(TemplateEngine::NAME, |opts| {
            Ok(Box::new(TemplateEngine::from_options(opts)?) as Box<dyn Engine>)
        });
        registry.register(FeatureEngine::NAME, |opts| {
            Ok(Box::new(FeatureEngine::from_options(opts)?) as Box<dyn Engine>)
        });
        registry.register(OcrEngine::NAME, |opts| {
            Ok(Box::new(OcrEngine::from_options(opts)?) as Box<dyn Engine>)
        });
        registry.register(SimEngine::NAME, |opts| {
            Ok(Box::new(SimEngine::from_options(opts)?) as Box<dyn Engine>)
        });
        registry
    }

    /// Adds a constructor, replacing any existing one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&EngineOptions) -> FindItResult<Box<dyn Engine>> + Send + Sync + 'static,
    {
        let name = name.into();
        let constructor: EngineConstructor = Arc::new(constructor);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = constructor,
            None => self.entries.push((name, constructor)),
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Builds the engine registered under `name`.
    pub fn build(&self, name: &str, opts: &EngineOptions) -> FindItResult<Box<dyn Engine>> {
        let (_, constructor) = self
            .entries
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| FindItError::UnknownEngine {
                name: name.to_string(),
            })?;
        constructor(opts)
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::EngineRegistry;
    use crate::config::EngineOptions;
    use crate::engine::{OcrEngine, OcrEngineConfig};
    use crate::util::FindItError;

    #[test]
    fn builtins_are_registered_in_order() {
        let registry = EngineRegistry::default();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["template", "feature", "ocr", "sim"]);
    }

    #[test]
    fn unknown_engine_is_reported() {
        let registry = EngineRegistry::default();
        let Err(err) = registry.build("surf", &EngineOptions::default()) else {
            panic!("`surf` must not be buildable");
        };
        assert_eq!(
            err,
            FindItError::UnknownEngine {
                name: "surf".into()
            }
        );
    }

    #[test]
    fn register_replaces_existing_constructor() {
        let mut registry = EngineRegistry::default();
        registry.register("ocr", |_opts| {
            Ok(Box::new(OcrEngine::new(OcrEngineConfig {
                lang: "deu".into(),
            })?) as Box<dyn crate::engine::Engine>)
        });
        assert_eq!(registry.names().count(), 4);
        let engine = registry.build("ocr", &EngineOptions::default()).unwrap();
        assert_eq!(engine.name(), "ocr");
        assert!(!engine.requires_template());
    }
}
