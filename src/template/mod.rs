//! Template storage and planning utilities.
//!
//! A [`TemplateStore`] holds named templates in insertion order. Entries are
//! either decoded rasters or file paths; path entries are decoded lazily,
//! every time [`TemplateStore::load`] is iterated.

use crate::image::RasterBuffer;
use crate::util::{FindItError, FindItResult};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

mod plan;

pub use plan::SurfacePlan;

/// Where a template's pixels come from.
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateSource {
    /// Already decoded greyscale raster.
    Raster(RasterBuffer),
    /// Image file decoded on access.
    Path(PathBuf),
}

impl From<RasterBuffer> for TemplateSource {
    fn from(raster: RasterBuffer) -> Self {
        Self::Raster(raster)
    }
}

impl From<PathBuf> for TemplateSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for TemplateSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// A named template entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    name: String,
    source: TemplateSource,
}

impl Template {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Returns the file path for path-backed templates.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            TemplateSource::Path(path) => Some(path),
            TemplateSource::Raster(_) => None,
        }
    }

    fn decode(&self) -> FindItResult<Cow<'_, RasterBuffer>> {
        match &self.source {
            TemplateSource::Raster(raster) => Ok(Cow::Borrowed(raster)),
            TemplateSource::Path(path) => decode_path(path).map(Cow::Owned),
        }
    }
}

#[cfg(feature = "image-io")]
fn decode_path(path: &Path) -> FindItResult<RasterBuffer> {
    crate::image::io::load_gray_image(path)
}

#[cfg(not(feature = "image-io"))]
fn decode_path(path: &Path) -> FindItResult<RasterBuffer> {
    Err(FindItError::ImageIo {
        reason: format!(
            "{}: decoding requires the `image-io` feature",
            path.display()
        ),
    })
}

/// A decoded template yielded by [`TemplateIter`].
#[derive(Debug)]
pub struct LoadedTemplate<'a> {
    pub name: &'a str,
    pub image: Cow<'a, RasterBuffer>,
}

/// Ordered collection of uniquely named templates.
#[derive(Clone, Debug, Default)]
pub struct TemplateStore {
    templates: Vec<Template>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a template under `name`.
    ///
    /// Fails with [`FindItError::DuplicateName`] when the name is taken; the
    /// existing entry is left untouched.
    pub fn save(
        &mut self,
        name: impl Into<String>,
        source: impl Into<TemplateSource>,
    ) -> FindItResult<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(FindItError::DuplicateName { name });
        }
        self.templates.push(Template {
            name,
            source: source.into(),
        });
        Ok(())
    }

    /// Records a decoded raster.
    pub fn save_raster(
        &mut self,
        name: impl Into<String>,
        raster: RasterBuffer,
    ) -> FindItResult<()> {
        self.save(name, TemplateSource::Raster(raster))
    }

    /// Records an image path; decoding is deferred until [`load`](Self::load).
    pub fn save_path(
        &mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> FindItResult<()> {
        self.save(name, TemplateSource::Path(path.as_ref().to_path_buf()))
    }

    /// Iterates `(name, raster)` pairs in insertion order.
    ///
    /// The iterator is lazy and can be recreated at will; decode failures
    /// are yielded per entry.
    pub fn load(&self) -> TemplateIter<'_> {
        TemplateIter {
            inner: self.templates.iter(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.templates.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Discards every entry.
    pub fn clear(&mut self) {
        self.templates.clear();
    }
}

/// Lazy iterator over decoded templates.
pub struct TemplateIter<'a> {
    inner: std::slice::Iter<'a, Template>,
}

impl<'a> Iterator for TemplateIter<'a> {
    type Item = FindItResult<LoadedTemplate<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let template = self.inner.next()?;
        Some(template.decode().map(|image| LoadedTemplate {
            name: template.name(),
            image,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for TemplateIter<'_> {}
