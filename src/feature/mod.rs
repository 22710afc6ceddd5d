//! Scale- and rotation-invariant local features.
//!
//! Keypoints are determinant-of-Hessian maxima over a box-filter scale
//! space; each carries a dominant orientation and a 64-float descriptor
//! built from Haar wavelet responses. Matching uses a ratio test and the
//! matched target points are summarised with k-means.

use crate::image::integral::IntegralImage;
use crate::image::ImageView;
use crate::util::{FindItError, FindItResult};
use serde::{Deserialize, Serialize};

mod describe;
mod hessian;
pub mod kmeans;
pub mod matching;

pub use kmeans::{effective_k, kmeans, Cluster, Clustering};
pub use matching::{ratio_test_matches, FeatureMatch};

/// Length of a feature descriptor.
pub const DESCRIPTOR_LEN: usize = 64;

/// Feature descriptor vector.
pub type Descriptor = [f32; DESCRIPTOR_LEN];

/// Detector configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HessianConfig {
    /// Minimum determinant response; higher keeps fewer, stronger keypoints.
    pub min_hessian: f64,
    /// Number of octaves (each doubles filter size and sampling step).
    pub octaves: usize,
    /// Layers per octave that can host keypoints.
    pub octave_layers: usize,
}

impl Default for HessianConfig {
    fn default() -> Self {
        Self {
            min_hessian: 200.0,
            octaves: 4,
            octave_layers: 3,
        }
    }
}

impl HessianConfig {
    pub fn validate(&self) -> FindItResult<()> {
        if !self.min_hessian.is_finite() || self.min_hessian < 0.0 {
            return Err(FindItError::InvalidConfig("min_hessian must be >= 0"));
        }
        if self.octaves == 0 || self.octaves > 8 {
            return Err(FindItError::InvalidConfig("octaves must be in 1..=8"));
        }
        if self.octave_layers == 0 {
            return Err(FindItError::InvalidConfig("octave_layers must be >= 1"));
        }
        Ok(())
    }
}

/// A detected keypoint.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keypoint {
    /// Pixel x coordinate.
    pub x: f64,
    /// Pixel y coordinate.
    pub y: f64,
    /// Box filter size that produced the response.
    pub size: f64,
    /// Gaussian-equivalent scale, `1.2 · size / 9`.
    pub scale: f64,
    pub response: f64,
    /// Orientation in radians, `[0, 2π)`.
    pub angle: f64,
    pub octave: usize,
}

/// A keypoint with its descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub keypoint: Keypoint,
    pub descriptor: Descriptor,
}

/// Detects keypoints without computing descriptors.
pub fn detect_keypoints(image: ImageView<'_, u8>, cfg: &HessianConfig) -> Vec<Keypoint> {
    let integral = IntegralImage::new(image);
    hessian::detect(&integral, cfg)
}

/// Detects keypoints and computes their orientations and descriptors.
pub fn detect_and_describe(image: ImageView<'_, u8>, cfg: &HessianConfig) -> Vec<Feature> {
    let integral = IntegralImage::new(image);
    hessian::detect(&integral, cfg)
        .into_iter()
        .map(|mut keypoint| {
            keypoint.angle = describe::orientation(&integral, &keypoint);
            let descriptor = describe::descriptor(&integral, &keypoint);
            Feature {
                keypoint,
                descriptor,
            }
        })
        .collect()
}
