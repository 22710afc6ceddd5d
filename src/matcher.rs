//! Session orchestrator: templates × engines over one target.
//!
//! A [`Matcher`] owns the template store and the engine configuration. Each
//! [`Matcher::find`] builds a fresh engine set, runs every engine on every
//! template in order and collects the pruned responses into a
//! [`MatchResult`].

use crate::config::EngineOptions;
use crate::engine::{Engine, EngineRegistry, ExecuteOptions, Verbosity};
use crate::image::{ImageView, RasterBuffer};
use crate::template::TemplateStore;
use crate::trace::{trace_event, trace_span};
use crate::util::{FindItError, FindItResult};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Observable matcher state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatcherState {
    /// No template loaded.
    Idle,
    /// At least one template loaded.
    Loaded,
}

/// One engine's pruned response.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineResult {
    pub engine: String,
    pub response: Map<String, Value>,
}

/// Every engine result for one template, in configured engine order.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateResult {
    pub name: String,
    pub engines: Vec<EngineResult>,
}

impl TemplateResult {
    pub fn get(&self, engine: &str) -> Option<&Map<String, Value>> {
        self.engines
            .iter()
            .find(|e| e.engine == engine)
            .map(|e| &e.response)
    }
}

/// Result of one matching session.
///
/// Serialises to `{"target_name", "target_path", "data": {template: {engine: response}}}`.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub target_name: String,
    pub target_path: Option<String>,
    pub data: Vec<TemplateResult>,
}

impl MatchResult {
    /// Response of `engine` for `template`.
    pub fn get(&self, template: &str, engine: &str) -> Option<&Map<String, Value>> {
        self.data
            .iter()
            .find(|t| t.name == template)
            .and_then(|t| t.get(engine))
    }

    pub fn to_value(&self) -> FindItResult<Value> {
        serde_json::to_value(self).map_err(|e| FindItError::Serialization {
            reason: e.to_string(),
        })
    }
}

struct EnginesMap<'a>(&'a [EngineResult]);

impl Serialize for EnginesMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for e in self.0 {
            map.serialize_entry(&e.engine, &e.response)?;
        }
        map.end()
    }
}

struct TemplatesMap<'a>(&'a [TemplateResult]);

impl Serialize for TemplatesMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for t in self.0 {
            map.serialize_entry(&t.name, &EnginesMap(&t.engines))?;
        }
        map.end()
    }
}

impl Serialize for MatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("target_name", &self.target_name)?;
        map.serialize_entry("target_path", &self.target_path)?;
        map.serialize_entry("data", &TemplatesMap(&self.data))?;
        map.end()
    }
}

/// Runs configured engines over loaded templates.
#[derive(Debug)]
pub struct Matcher {
    engine_names: Vec<String>,
    options: EngineOptions,
    registry: EngineRegistry,
    verbosity: Verbosity,
    store: TemplateStore,
}

impl Matcher {
    /// Matcher over the built-in engines with default options.
    pub fn new<I, S>(engines: I) -> FindItResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_registry(engines, EngineOptions::default(), EngineRegistry::default())
    }

    pub fn with_options<I, S>(engines: I, options: EngineOptions) -> FindItResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_registry(engines, options, EngineRegistry::default())
    }

    /// Validates the configuration by constructing every engine once.
    pub fn with_registry<I, S>(
        engines: I,
        options: EngineOptions,
        registry: EngineRegistry,
    ) -> FindItResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let engine_names: Vec<String> = engines.into_iter().map(Into::into).collect();
        if engine_names.is_empty() {
            return Err(FindItError::EmptyEngineList);
        }
        for name in &engine_names {
            registry.build(name, &options)?;
        }
        Ok(Self {
            engine_names,
            options,
            registry,
            verbosity: Verbosity::default(),
            store: TemplateStore::new(),
        })
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn engine_names(&self) -> &[String] {
        &self.engine_names
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn state(&self) -> MatcherState {
        if self.store.is_empty() {
            MatcherState::Idle
        } else {
            MatcherState::Loaded
        }
    }

    pub fn load_template(
        &mut self,
        name: impl Into<String>,
        raster: RasterBuffer,
    ) -> FindItResult<()> {
        self.store.save_raster(name, raster)
    }

    /// Registers a template by path; it is decoded on every `find`.
    pub fn load_template_path(
        &mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> FindItResult<()> {
        self.store.save_path(name, path)
    }

    /// Drops every loaded template.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Matches every loaded template against `target`.
    pub fn find(
        &self,
        target_name: impl Into<String>,
        target: ImageView<'_, u8>,
        extras: &ExecuteOptions<'_>,
    ) -> FindItResult<MatchResult> {
        let target_name = target_name.into();
        if self.store.is_empty() {
            return Err(FindItError::EmptyTemplate);
        }
        let _span = trace_span!(
            "find",
            target = target_name.as_str(),
            templates = self.store.len(),
            engines = self.engine_names.len()
        )
        .entered();

        let engines = self
            .engine_names
            .iter()
            .map(|name| self.registry.build(name, &self.options))
            .collect::<FindItResult<Vec<Box<dyn Engine>>>>()?;

        let mut data = Vec::with_capacity(self.store.len());
        for loaded in self.store.load() {
            let loaded = loaded?;
            let mut results = Vec::with_capacity(engines.len());
            for (name, engine) in self.engine_names.iter().zip(&engines) {
                let template = engine.requires_template().then(|| loaded.image.view());
                let response = engine.execute(template, target, extras)?;
                results.push(EngineResult {
                    engine: name.clone(),
                    response: response.into_view(self.verbosity),
                });
            }
            data.push(TemplateResult {
                name: loaded.name.to_string(),
                engines: results,
            });
        }

        trace_event!("find_done", templates = data.len());
        Ok(MatchResult {
            target_name,
            target_path: None,
            data,
        })
    }

    /// Decodes `path` as greyscale and matches against it.
    #[cfg(feature = "image-io")]
    pub fn find_path(
        &self,
        target_name: impl Into<String>,
        path: impl AsRef<Path>,
        extras: &ExecuteOptions<'_>,
    ) -> FindItResult<MatchResult> {
        let path = path.as_ref();
        let target = crate::image::io::load_gray_image(path)?;
        let mut result = self.find(target_name, target.view(), extras)?;
        result.target_path = Some(path.display().to_string());
        Ok(result)
    }
}
