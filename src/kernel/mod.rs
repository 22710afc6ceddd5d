//! Correlation methods and the kernels that evaluate them.
//!
//! Every kernel accumulates the same three masked sums per placement
//! (`Σ w·t·i`, `Σ w·i`, `Σ w·i²`) and hands them to
//! [`CorrMethod::finish`], so backends differ only in how they walk the
//! template window.

use crate::image::ImageView;
use crate::template::SurfacePlan;
use crate::util::{FindItError, FindItResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

// Dense kernel used by `compute_surface` - SIMD when available
#[cfg(not(feature = "simd"))]
use scalar::CorrScalar as DenseKernel;
#[cfg(feature = "simd")]
use simd::CorrSimd as DenseKernel;

/// Normalisation below this magnitude yields a zero score.
pub(crate) const DENOM_EPS: f64 = 1e-12;

/// Sliding-window correlation method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrMethod {
    /// Raw cross-correlation `Σ t·i`.
    Ccorr,
    /// Cross-correlation normalised by both energies.
    #[default]
    CcorrNormed,
    /// Cross-correlation of the zero-mean signals.
    Ccoeff,
    /// Zero-mean normalised cross-correlation.
    CcoeffNormed,
}

impl CorrMethod {
    /// Parses a method name.
    ///
    /// Accepts `cv2.TM_CCORR_NORMED`, `TM_CCORR_NORMED` and `ccorr_normed`
    /// spellings (any case). Squared-difference methods are rejected.
    pub fn from_name(name: &str) -> FindItResult<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let key = lowered
            .strip_prefix("cv2.")
            .unwrap_or(&lowered)
            .trim_start_matches("tm_");
        match key {
            "ccorr" => Ok(Self::Ccorr),
            "ccorr_normed" => Ok(Self::CcorrNormed),
            "ccoeff" => Ok(Self::Ccoeff),
            "ccoeff_normed" => Ok(Self::CcoeffNormed),
            _ => Err(FindItError::UnsupportedMethod {
                name: name.to_string(),
            }),
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ccorr => "ccorr",
            Self::CcorrNormed => "ccorr_normed",
            Self::Ccoeff => "ccoeff",
            Self::CcoeffNormed => "ccoeff_normed",
        }
    }

    /// Whether the template is centred on its (masked) mean before scoring.
    pub fn zero_mean(self) -> bool {
        matches!(self, Self::Ccoeff | Self::CcoeffNormed)
    }

    /// Turns accumulated window sums into a score.
    ///
    /// `dot` is `Σ w·t·i` over the plan's (possibly zero-mean) template
    /// values; `sum_i` and `sum_i2` are the masked image sums.
    #[inline]
    pub fn finish(self, plan: &SurfacePlan, dot: f64, sum_i: f64, sum_i2: f64) -> f64 {
        match self {
            Self::Ccorr | Self::Ccoeff => dot,
            Self::CcorrNormed => {
                let denom = (plan.energy() * sum_i2).sqrt();
                if denom <= DENOM_EPS {
                    0.0
                } else {
                    dot / denom
                }
            }
            Self::CcoeffNormed => {
                let var_i = sum_i2 - sum_i * sum_i / plan.weight_sum();
                let denom = (plan.energy() * var_i.max(0.0)).sqrt();
                if denom <= DENOM_EPS {
                    0.0
                } else {
                    dot / denom
                }
            }
        }
    }
}

impl FromStr for CorrMethod {
    type Err = FindItError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for CorrMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dense grid of scores, one per top-left placement.
#[derive(Clone, Debug)]
pub struct CorrelationSurface {
    width: usize,
    height: usize,
    scores: Vec<f64>,
}

/// Extreme values of a surface with their first row-major locations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceExtremes {
    pub min_val: f64,
    pub max_val: f64,
    pub min_loc: (usize, usize),
    pub max_loc: (usize, usize),
}

impl CorrelationSurface {
    pub(crate) fn new(width: usize, height: usize, scores: Vec<f64>) -> FindItResult<Self> {
        if width == 0 || height == 0 {
            return Err(FindItError::InvalidDimensions { width, height });
        }
        if scores.len() != width * height {
            return Err(FindItError::BufferTooSmall {
                needed: width * height,
                got: scores.len(),
            });
        }
        Ok(Self {
            width,
            height,
            scores,
        })
    }

    /// Number of placements along x.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of placements along y.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major scores.
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Score at a top-left placement.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores.get(y * self.width + x).copied()
    }

    /// Minimum and maximum with the first location of each (row-major).
    pub fn extremes(&self) -> SurfaceExtremes {
        let mut ext = SurfaceExtremes {
            min_val: f64::INFINITY,
            max_val: f64::NEG_INFINITY,
            min_loc: (0, 0),
            max_loc: (0, 0),
        };
        for (idx, &score) in self.scores.iter().enumerate() {
            let loc = (idx % self.width, idx / self.width);
            if score < ext.min_val {
                ext.min_val = score;
                ext.min_loc = loc;
            }
            if score > ext.max_val {
                ext.max_val = score;
                ext.max_loc = loc;
            }
        }
        ext
    }

    /// Every placement scoring at least `threshold`, in row-major order.
    pub fn locations_at_least(&self, threshold: f64) -> Vec<(usize, usize)> {
        self.scores
            .iter()
            .enumerate()
            .filter(|(_, &score)| score >= threshold)
            .map(|(idx, _)| (idx % self.width, idx / self.width))
            .collect()
    }
}

/// Kernel trait for scoring and scan operations.
pub trait Kernel {
    /// Computes the score at a single placement (top-left coordinates).
    fn score_at(image: ImageView<'_, u8>, plan: &SurfacePlan, x: usize, y: usize) -> f64;

    /// Scores every placement of the plan's template inside `image`.
    fn scan_full(image: ImageView<'_, u8>, plan: &SurfacePlan)
        -> FindItResult<CorrelationSurface>;
}

/// Returns the placement grid size, or an error when the template does not fit.
pub(crate) fn placement_grid(
    image: ImageView<'_, u8>,
    plan: &SurfacePlan,
) -> FindItResult<(usize, usize)> {
    if image.width() < plan.width() || image.height() < plan.height() {
        return Err(FindItError::NoCandidateScale {
            template_width: plan.width(),
            template_height: plan.height(),
            target_width: image.width(),
            target_height: image.height(),
        });
    }
    Ok((
        image.width() - plan.width() + 1,
        image.height() - plan.height() + 1,
    ))
}

/// Computes a surface with the fastest backend compiled in.
///
/// `parallel` selects the row-parallel kernel when the `rayon` feature is
/// enabled and is ignored otherwise.
pub fn compute_surface(
    image: ImageView<'_, u8>,
    plan: &SurfacePlan,
    parallel: bool,
) -> FindItResult<CorrelationSurface> {
    #[cfg(feature = "rayon")]
    if parallel {
        return self::rayon::scan_full_par(image, plan);
    }
    #[cfg(not(feature = "rayon"))]
    let _ = parallel;

    <DenseKernel as Kernel>::scan_full(image, plan)
}
