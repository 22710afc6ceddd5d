//! Summed-area tables for constant-time box sums.

use crate::image::ImageView;

/// Summed-area table with a zero first row and column.
///
/// `box_sum` clamps rectangles to the image, so samples outside the image
/// contribute zero.
pub(crate) struct IntegralImage {
    width: usize,
    height: usize,
    sums: Vec<f64>,
}

impl IntegralImage {
    /// Builds the table over raw intensities.
    pub(crate) fn new(image: ImageView<'_, u8>) -> Self {
        Self::build(image, |v| f64::from(v))
    }

    /// Builds the table over squared intensities.
    pub(crate) fn squared(image: ImageView<'_, u8>) -> Self {
        Self::build(image, |v| {
            let v = f64::from(v);
            v * v
        })
    }

    /// Builds the table over the product of two equally sized images.
    pub(crate) fn product(a: ImageView<'_, u8>, b: ImageView<'_, u8>) -> Self {
        let width = a.width().min(b.width());
        let height = a.height().min(b.height());
        let stride = width + 1;
        let mut sums = vec![0.0f64; stride * (height + 1)];
        for y in 0..height {
            let (Some(row_a), Some(row_b)) = (a.row(y), b.row(y)) else {
                break;
            };
            let mut row_sum = 0.0;
            for x in 0..width {
                row_sum += f64::from(row_a[x]) * f64::from(row_b[x]);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }
        Self {
            width,
            height,
            sums,
        }
    }

    fn build(image: ImageView<'_, u8>, f: impl Fn(u8) -> f64) -> Self {
        let width = image.width();
        let height = image.height();
        let stride = width + 1;
        let mut sums = vec![0.0f64; stride * (height + 1)];
        for (y, row) in image.rows().enumerate() {
            let mut row_sum = 0.0;
            for (x, &value) in row.iter().enumerate() {
                row_sum += f(value);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }
        Self {
            width,
            height,
            sums,
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    /// Sum over `[x0, x1) x [y0, y1)`, clamped to the image.
    pub(crate) fn box_sum(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> f64 {
        let w = self.width as i64;
        let h = self.height as i64;
        let x0 = x0.clamp(0, w) as usize;
        let x1 = x1.clamp(0, w) as usize;
        let y0 = y0.clamp(0, h) as usize;
        let y1 = y1.clamp(0, h) as usize;
        if x1 <= x0 || y1 <= y0 {
            return 0.0;
        }
        let stride = self.width + 1;
        let a = self.sums[y0 * stride + x0];
        let b = self.sums[y0 * stride + x1];
        let c = self.sums[y1 * stride + x0];
        let d = self.sums[y1 * stride + x1];
        d - b - c + a
    }

    /// Horizontal Haar wavelet response (right half minus left half) of a
    /// `size`-wide square centred on `(x, y)`.
    pub(crate) fn haar_x(&self, x: i64, y: i64, size: i64) -> f64 {
        let half = (size / 2).max(1);
        let right = self.box_sum(x, y - half, x + half, y + half);
        let left = self.box_sum(x - half, y - half, x, y + half);
        right - left
    }

    /// Vertical Haar wavelet response (bottom half minus top half).
    pub(crate) fn haar_y(&self, x: i64, y: i64, size: i64) -> f64 {
        let half = (size / 2).max(1);
        let bottom = self.box_sum(x - half, y, x + half, y + half);
        let top = self.box_sum(x - half, y - half, x + half, y);
        bottom - top
    }
}
