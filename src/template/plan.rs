//! Template plan precomputation for correlation scans.

use crate::image::ImageView;
use crate::kernel::CorrMethod;
use crate::util::{FindItError, FindItResult};

/// Precomputed template values, mask weights and energy for one scale.
///
/// Masked-out pixels carry weight 0 and value 0. For zero-mean methods the
/// values are centred on the masked mean so that `Σ w·t'·i` equals the
/// zero-mean cross term directly.
#[derive(Clone, Debug)]
pub struct SurfacePlan {
    width: usize,
    height: usize,
    method: CorrMethod,
    values: Vec<f64>,
    weights: Vec<f64>,
    weight_sum: f64,
    energy: f64,
}

impl SurfacePlan {
    /// Builds a plan from a template view without a mask.
    pub fn from_view(tpl: ImageView<'_, u8>, method: CorrMethod) -> FindItResult<Self> {
        Self::build(tpl, None, method)
    }

    /// Builds a plan from a template view and a mask of identical size.
    ///
    /// Mask pixels equal to zero are excluded from every sum.
    pub fn with_mask(
        tpl: ImageView<'_, u8>,
        mask: ImageView<'_, u8>,
        method: CorrMethod,
    ) -> FindItResult<Self> {
        if mask.width() != tpl.width() || mask.height() != tpl.height() {
            return Err(FindItError::InvalidInput("mask size differs from template"));
        }
        Self::build(tpl, Some(mask), method)
    }

    fn build(
        tpl: ImageView<'_, u8>,
        mask: Option<ImageView<'_, u8>>,
        method: CorrMethod,
    ) -> FindItResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(FindItError::InvalidDimensions { width, height })?;

        let mut values = Vec::with_capacity(count);
        let mut weights = Vec::with_capacity(count);
        for y in 0..height {
            let row = tpl.row(y).ok_or(FindItError::BufferTooSmall {
                needed: count,
                got: tpl.as_slice().len(),
            })?;
            let mask_row = match mask {
                Some(m) => Some(m.row(y).ok_or(FindItError::InvalidInput("mask row"))?),
                None => None,
            };
            for (x, &value) in row.iter().enumerate() {
                let w = match mask_row {
                    Some(m) if m[x] == 0 => 0.0,
                    _ => 1.0,
                };
                weights.push(w);
                values.push(f64::from(value) * w);
            }
        }

        let weight_sum: f64 = weights.iter().sum();
        if weight_sum == 0.0 {
            return Err(FindItError::InvalidInput("mask excludes every template pixel"));
        }

        if method.zero_mean() {
            let mean = values.iter().sum::<f64>() / weight_sum;
            for (v, &w) in values.iter_mut().zip(weights.iter()) {
                *v = (*v - mean) * w;
            }
        }
        let energy = values.iter().map(|v| v * v).sum();

        Ok(Self {
            width,
            height,
            method,
            values,
            weights,
            weight_sum,
            energy,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Template values (zero-mean for `Ccoeff*`) in row-major order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mask weights (0 or 1) in row-major order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of included pixels.
    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    /// `Σ w·t²` over the plan values.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Converts accumulated window sums into a score for this plan.
    #[inline]
    pub fn finish(&self, dot: f64, sum_i: f64, sum_i2: f64) -> f64 {
        self.method.finish(self, dot, sum_i, sum_i2)
    }
}

#[cfg(test)]
mod tests {
    use super::SurfacePlan;
    use crate::image::ImageView;
    use crate::kernel::CorrMethod;
    use crate::util::FindItError;

    #[test]
    fn zero_mean_plan_sums_to_zero() {
        let data = [10u8, 20, 30, 40];
        let view = ImageView::from_slice(&data, 2, 2).unwrap();
        let plan = SurfacePlan::from_view(view, CorrMethod::CcoeffNormed).unwrap();
        let sum: f64 = plan.values().iter().sum();
        assert!(sum.abs() < 1e-9);
        assert!((plan.energy() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn mask_zeroes_excluded_pixels() {
        let data = [10u8, 20, 30, 40];
        let mask = [255u8, 0, 255, 255];
        let tpl = ImageView::from_slice(&data, 2, 2).unwrap();
        let mask = ImageView::from_slice(&mask, 2, 2).unwrap();
        let plan = SurfacePlan::with_mask(tpl, mask, CorrMethod::CcorrNormed).unwrap();
        assert_eq!(plan.values(), &[10.0, 0.0, 30.0, 40.0]);
        assert_eq!(plan.weight_sum(), 3.0);
    }

    #[test]
    fn empty_mask_is_rejected() {
        let data = [10u8, 20];
        let mask = [0u8, 0];
        let tpl = ImageView::from_slice(&data, 2, 1).unwrap();
        let mask = ImageView::from_slice(&mask, 2, 1).unwrap();
        assert!(matches!(
            SurfacePlan::with_mask(tpl, mask, CorrMethod::Ccorr),
            Err(FindItError::InvalidInput(_))
        ));
    }
}
