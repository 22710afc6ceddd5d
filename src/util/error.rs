//! Error types for findit.

use thiserror::Error;

/// Result alias for findit operations.
pub type FindItResult<T> = std::result::Result<T, FindItError>;

/// Coarse classification of [`FindItError`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected configuration; fix the setup, retrying will not help.
    Configuration,
    /// Nothing to match (no templates, or no scale fits the target).
    EmptyInput,
    /// Malformed buffers or parameters handed to a single call.
    Input,
    /// Failure inside an external collaborator (decoder, recogniser).
    External,
}

/// Errors that can occur when running findit engines.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FindItError {
    /// Image dimensions are invalid (zero or overflow).
    #[error("invalid dimensions: width={width}, height={height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the image width.
    #[error("invalid stride: width={width}, stride={stride}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is too small for the requested view.
    #[error("buffer too small: needed={needed}, got={got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The input data is invalid for this call.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// Engine options could not be parsed.
    #[error("invalid engine options: {reason}")]
    InvalidOptions { reason: String },
    /// A value could not be converted to JSON.
    #[error("serialisation failed: {reason}")]
    Serialization { reason: String },
    /// A template with this name is already registered.
    #[error("template `{name}` is already registered")]
    DuplicateName { name: String },
    /// The correlation method name is not supported.
    #[error("unsupported correlation method: {name}")]
    UnsupportedMethod { name: String },
    /// No engine is registered under this name.
    #[error("unknown engine: {name}")]
    UnknownEngine { name: String },
    /// The matcher was configured without any engine.
    #[error("engine list is empty")]
    EmptyEngineList,
    /// `find` was called before any template was loaded.
    #[error("template is empty")]
    EmptyTemplate,
    /// The template does not fit the target at any configured scale.
    #[error(
        "template ({template_width}x{template_height}) is larger than target \
         ({target_width}x{target_height}) at every configured scale"
    )]
    NoCandidateScale {
        template_width: usize,
        template_height: usize,
        target_width: usize,
        target_height: usize,
    },
    /// The engine needs a template but none was provided.
    #[error("engine `{engine}` requires a template")]
    MissingTemplate { engine: &'static str },
    /// Image decoding failed.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
    /// The external text recogniser failed.
    #[error("text recognition failed: {reason}")]
    Recognition { reason: String },
}

impl FindItError {
    /// Returns the coarse category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateName { .. }
            | Self::UnsupportedMethod { .. }
            | Self::UnknownEngine { .. }
            | Self::EmptyEngineList
            | Self::InvalidConfig(_)
            | Self::InvalidOptions { .. } => ErrorCategory::Configuration,
            Self::EmptyTemplate | Self::NoCandidateScale { .. } | Self::MissingTemplate { .. } => {
                ErrorCategory::EmptyInput
            }
            Self::InvalidDimensions { .. }
            | Self::InvalidStride { .. }
            | Self::BufferTooSmall { .. }
            | Self::InvalidInput(_)
            | Self::Serialization { .. } => ErrorCategory::Input,
            Self::ImageIo { .. } | Self::Recognition { .. } => ErrorCategory::External,
        }
    }
}
