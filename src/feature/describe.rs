//! Keypoint orientation and 64-dimensional Haar descriptors.
//!
//! Sample offsets are rounded relative to the keypoint before being added
//! to its pixel position, so a translated image yields identical
//! descriptors. Haar samples whose box leaves the image are skipped.

use crate::feature::{Descriptor, Keypoint, DESCRIPTOR_LEN};
use crate::image::integral::IntegralImage;
use crate::util::math::gaussian;
use std::f64::consts::{FRAC_PI_3, PI, TAU};

/// Radius of the orientation disc in units of the keypoint scale.
const ORI_RADIUS: i64 = 6;
const ORI_SIGMA: f64 = 2.5;
/// Angular step of the sliding orientation window.
const ORI_SEARCH_INC: f64 = 5.0 * PI / 180.0;
const DESC_SIGMA: f64 = 3.3;
/// Descriptor window side in units of the keypoint scale.
const PATCH_SIZE: usize = 20;
const SUB_REGIONS: usize = 4;
const SUB_SAMPLES: usize = PATCH_SIZE / SUB_REGIONS;

#[inline]
fn round_offset(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Haar responses of a `size` square centred on `(x, y)`, if it fits.
fn haar_at(integral: &IntegralImage, x: i64, y: i64, size: i64) -> Option<(f64, f64)> {
    let half = (size / 2).max(1);
    if x - half < 0
        || y - half < 0
        || x + half > integral.width() as i64
        || y + half > integral.height() as i64
    {
        return None;
    }
    Some((
        integral.haar_x(x, y, 2 * half),
        integral.haar_y(x, y, 2 * half),
    ))
}

/// Dominant gradient direction around a keypoint, in `[0, 2π)`.
pub(crate) fn orientation(integral: &IntegralImage, kp: &Keypoint) -> f64 {
    let s = kp.scale;
    let (kx, ky) = (kp.x.round() as i64, kp.y.round() as i64);
    let wavelet = 2 * round_offset(2.0 * s).max(1);

    let mut samples: Vec<(f64, f64, f64)> = Vec::new();
    for j in -ORI_RADIUS..=ORI_RADIUS {
        for i in -ORI_RADIUS..=ORI_RADIUS {
            if i * i + j * j >= ORI_RADIUS * ORI_RADIUS {
                continue;
            }
            let (ox, oy) = (i as f64 * s, j as f64 * s);
            let (x, y) = (kx + round_offset(ox), ky + round_offset(oy));
            let Some((dx, dy)) = haar_at(integral, x, y, wavelet) else {
                continue;
            };
            let w = gaussian(ox, oy, ORI_SIGMA * s);
            let (dx, dy) = (dx * w, dy * w);
            if dx == 0.0 && dy == 0.0 {
                continue;
            }
            samples.push((dx, dy, dy.atan2(dx).rem_euclid(TAU)));
        }
    }
    if samples.is_empty() {
        return 0.0;
    }

    let mut best_mag = -1.0;
    let mut best_angle = 0.0;
    let windows = (TAU / ORI_SEARCH_INC).round() as usize;
    for k in 0..windows {
        let start = k as f64 * ORI_SEARCH_INC;
        let (mut sx, mut sy) = (0.0, 0.0);
        for &(dx, dy, angle) in &samples {
            let rel = (angle - start).rem_euclid(TAU);
            if rel < FRAC_PI_3 {
                sx += dx;
                sy += dy;
            }
        }
        let mag = sx * sx + sy * sy;
        if mag > best_mag {
            best_mag = mag;
            best_angle = sy.atan2(sx).rem_euclid(TAU);
        }
    }
    best_angle
}

/// Orientation-aligned 4x4x4 Haar descriptor, L2-normalised.
pub(crate) fn descriptor(integral: &IntegralImage, kp: &Keypoint) -> Descriptor {
    let s = kp.scale;
    let (kx, ky) = (kp.x.round() as i64, kp.y.round() as i64);
    let (sin, cos) = kp.angle.sin_cos();
    let wavelet = 2 * round_offset(s).max(1);
    let half_patch = PATCH_SIZE as f64 / 2.0;

    let mut desc = [0.0f32; DESCRIPTOR_LEN];
    for by in 0..SUB_REGIONS {
        for bx in 0..SUB_REGIONS {
            let mut acc = [0.0f64; 4];
            for sy in 0..SUB_SAMPLES {
                for sx in 0..SUB_SAMPLES {
                    let u = (bx * SUB_SAMPLES + sx) as f64 - half_patch + 0.5;
                    let v = (by * SUB_SAMPLES + sy) as f64 - half_patch + 0.5;
                    let ox = (u * cos - v * sin) * s;
                    let oy = (u * sin + v * cos) * s;
                    let Some((hx, hy)) =
                        haar_at(integral, kx + round_offset(ox), ky + round_offset(oy), wavelet)
                    else {
                        continue;
                    };
                    let w = gaussian(u * s, v * s, DESC_SIGMA * s);
                    let rx = (hx * cos + hy * sin) * w;
                    let ry = (hy * cos - hx * sin) * w;
                    acc[0] += rx;
                    acc[1] += ry;
                    acc[2] += rx.abs();
                    acc[3] += ry.abs();
                }
            }
            let base = (by * SUB_REGIONS + bx) * 4;
            for (slot, value) in desc[base..base + 4].iter_mut().zip(acc) {
                *slot = value as f32;
            }
        }
    }

    let norm = desc.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        desc.iter_mut().for_each(|v| *v /= norm);
    }
    desc
}
