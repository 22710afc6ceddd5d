//! Uniform engine result envelope.

use crate::util::{FindItError, FindItResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which partition of a response callers receive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Only entries marked important.
    #[default]
    Brief,
    /// Every entry.
    Full,
}

impl Verbosity {
    /// `Full` when `pro_mode` is set.
    pub fn from_pro_mode(pro_mode: bool) -> Self {
        if pro_mode {
            Self::Full
        } else {
            Self::Brief
        }
    }
}

/// Ordered key/value result with a brief and a full partition.
///
/// Important entries land in both partitions; everything else only in the
/// full content. Re-appending a key overwrites it in place.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EngineResponse {
    brief: Map<String, Value>,
    content: Map<String, Value>,
}

impl EngineResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` under `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<Value>, important: bool) {
        let key = key.into();
        let value = value.into();
        if important {
            self.brief.insert(key.clone(), value.clone());
        } else {
            // an earlier important entry must not outlive its replacement
            self.brief.shift_remove(&key);
        }
        self.content.insert(key, value);
    }

    /// Serialises `value` and records it under `key`.
    pub fn append_serialize<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
        important: bool,
    ) -> FindItResult<()> {
        let value = serde_json::to_value(value).map_err(|e| FindItError::Serialization {
            reason: e.to_string(),
        })?;
        self.append(key, value, important);
        Ok(())
    }

    pub fn get_brief(&self) -> &Map<String, Value> {
        &self.brief
    }

    pub fn get_content(&self) -> &Map<String, Value> {
        &self.content
    }

    /// Returns the partition selected by `verbosity`.
    pub fn view(&self, verbosity: Verbosity) -> &Map<String, Value> {
        match verbosity {
            Verbosity::Brief => &self.brief,
            Verbosity::Full => &self.content,
        }
    }

    /// Consumes the response, keeping the partition selected by `verbosity`.
    pub fn into_view(self, verbosity: Verbosity) -> Map<String, Value> {
        match verbosity {
            Verbosity::Brief => self.brief,
            Verbosity::Full => self.content,
        }
    }

    /// Looks a key up in the full content.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }

    /// Value of the `ok` entry, `false` when absent.
    pub fn is_ok(&self) -> bool {
        self.content
            .get("ok")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
