//! Convenience helpers for loading images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::RasterBuffer;
use crate::util::{FindItError, FindItResult};
use std::path::Path;

/// Creates an owned raster from a greyscale image buffer.
pub fn raster_from_gray_image(img: &image::GrayImage) -> FindItResult<RasterBuffer> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    RasterBuffer::new(img.as_raw().clone(), width, height)
}

/// Converts a dynamic image (any colour layout) to a greyscale raster.
pub fn raster_from_dynamic_image(img: &image::DynamicImage) -> FindItResult<RasterBuffer> {
    let gray = img.to_luma8();
    raster_from_gray_image(&gray)
}

/// Loads an image from disk and converts it to a greyscale raster.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> FindItResult<RasterBuffer> {
    let img = image::open(path.as_ref()).map_err(|err| FindItError::ImageIo {
        reason: format!("{}: {err}", path.as_ref().display()),
    })?;
    raster_from_dynamic_image(&img)
}

/// Decodes an in-memory encoded image (PNG/JPEG) to a greyscale raster.
pub fn decode_gray_image(bytes: &[u8]) -> FindItResult<RasterBuffer> {
    let img = image::load_from_memory(bytes).map_err(|err| FindItError::ImageIo {
        reason: err.to_string(),
    })?;
    raster_from_dynamic_image(&img)
}
