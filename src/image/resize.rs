//! Resampling of greyscale images.
//!
//! Three interpolation modes are provided:
//! - area averaging (exact fractional footprints) for shrinking,
//! - bilinear sampling with pixel-centre alignment for growing,
//! - nearest neighbour for binary masks, which must stay binary.
//!
//! All outputs round to the nearest integer and clamp to `[0, 255]`.

use crate::image::{ImageView, RasterBuffer};
use crate::util::{FindItError, FindItResult};

/// Returns the aspect-preserving size of an image scaled by `scale`.
///
/// The width is scaled and rounded first; the height follows the width's
/// effective ratio. Both axes are at least one pixel.
pub fn scaled_size(width: usize, height: usize, scale: f64) -> (usize, usize) {
    let new_width = ((width as f64 * scale).round() as usize).max(1);
    let ratio = new_width as f64 / width as f64;
    let new_height = ((height as f64 * ratio).round() as usize).max(1);
    (new_width, new_height)
}

/// Resizes with area averaging when shrinking and bilinear otherwise.
pub fn resize(src: ImageView<'_, u8>, width: usize, height: usize) -> FindItResult<RasterBuffer> {
    if width == src.width() && height == src.height() {
        return RasterBuffer::from_view(src);
    }
    if width <= src.width() && height <= src.height() {
        resize_area(src, width, height)
    } else {
        resize_bilinear(src, width, height)
    }
}

/// Bilinear resize using pixel-centre alignment.
pub fn resize_bilinear(
    src: ImageView<'_, u8>,
    width: usize,
    height: usize,
) -> FindItResult<RasterBuffer> {
    check_size(width, height)?;
    let xs = bilinear_taps(src.width(), width);
    let ys = bilinear_taps(src.height(), height);
    let mut out = Vec::with_capacity(width * height);

    for &(y0, y1, fy) in &ys {
        let row0 = src.row(y0).ok_or(FindItError::InvalidInput("row out of bounds"))?;
        let row1 = src.row(y1).ok_or(FindItError::InvalidInput("row out of bounds"))?;
        for &(x0, x1, fx) in &xs {
            let a = f64::from(row0[x0]);
            let b = f64::from(row0[x1]);
            let c = f64::from(row1[x0]);
            let d = f64::from(row1[x1]);
            let top = a + (b - a) * fx;
            let bottom = c + (d - c) * fx;
            let value = top + (bottom - top) * fy;
            out.push(value.round().clamp(0.0, 255.0) as u8);
        }
    }

    RasterBuffer::new(out, width, height)
}

/// Area-average resize; every source pixel contributes proportionally to
/// the overlap of its footprint with the destination pixel.
pub fn resize_area(
    src: ImageView<'_, u8>,
    width: usize,
    height: usize,
) -> FindItResult<RasterBuffer> {
    check_size(width, height)?;
    let xs = area_taps(src.width(), width);
    let ys = area_taps(src.height(), height);
    let mut out = Vec::with_capacity(width * height);
    let mut acc = vec![0.0f64; width];

    for taps_y in &ys {
        acc.iter_mut().for_each(|v| *v = 0.0);
        let mut weight_y = 0.0;
        for &(sy, wy) in taps_y {
            let row = src.row(sy).ok_or(FindItError::InvalidInput("row out of bounds"))?;
            weight_y += wy;
            for (dx, taps_x) in xs.iter().enumerate() {
                let mut sum = 0.0;
                for &(sx, wx) in taps_x {
                    sum += f64::from(row[sx]) * wx;
                }
                acc[dx] += sum * wy;
            }
        }
        for (dx, taps_x) in xs.iter().enumerate() {
            let weight_x: f64 = taps_x.iter().map(|&(_, w)| w).sum();
            let value = acc[dx] / (weight_x * weight_y);
            out.push(value.round().clamp(0.0, 255.0) as u8);
        }
    }

    RasterBuffer::new(out, width, height)
}

/// Nearest-neighbour resize; keeps the value set of the source (masks).
pub fn resize_nearest(
    src: ImageView<'_, u8>,
    width: usize,
    height: usize,
) -> FindItResult<RasterBuffer> {
    check_size(width, height)?;
    let sx = src.width() as f64 / width as f64;
    let sy = src.height() as f64 / height as f64;
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let src_y = ((y as f64 * sy) as usize).min(src.height() - 1);
        let row = src
            .row(src_y)
            .ok_or(FindItError::InvalidInput("row out of bounds"))?;
        for x in 0..width {
            let src_x = ((x as f64 * sx) as usize).min(src.width() - 1);
            out.push(row[src_x]);
        }
    }
    RasterBuffer::new(out, width, height)
}

fn check_size(width: usize, height: usize) -> FindItResult<()> {
    if width == 0 || height == 0 {
        return Err(FindItError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Per destination index: (lower source index, upper source index, weight).
fn bilinear_taps(src_len: usize, dst_len: usize) -> Vec<(usize, usize, f64)> {
    let scale = src_len as f64 / dst_len as f64;
    let max = (src_len - 1) as f64;
    (0..dst_len)
        .map(|i| {
            let pos = ((i as f64 + 0.5) * scale - 0.5).clamp(0.0, max);
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(src_len - 1);
            (lo, hi, pos - lo as f64)
        })
        .collect()
}

/// Per destination index: the source indices it covers with overlap weights.
fn area_taps(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f64)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|i| {
            let start = i as f64 * scale;
            let end = ((i + 1) as f64 * scale).min(src_len as f64);
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len).max(first + 1);
            (first..last)
                .filter_map(|s| {
                    let overlap = end.min((s + 1) as f64) - start.max(s as f64);
                    (overlap > 1e-12).then_some((s, overlap))
                })
                .collect()
        })
        .collect()
}
