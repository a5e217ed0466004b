//! Convenience helpers for loading stereo pairs and saving depth maps via the
//! `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{DepthMap, OwnedRgba};
use crate::util::{DepthError, DepthResult};
use std::path::Path;

/// Creates an owned packed RGBA image from a decoded dynamic image.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> DepthResult<OwnedRgba> {
    let rgba = img.to_rgba8();
    let width = rgba.width() as usize;
    let height = rgba.height() as usize;
    OwnedRgba::new(rgba.into_raw(), width, height)
}

/// Loads an image from disk and converts it to packed RGBA.
pub fn load_rgba_image<P: AsRef<Path>>(path: P) -> DepthResult<OwnedRgba> {
    let img = image::open(path).map_err(|err| DepthError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&img)
}

/// Converts a depth map into an 8-bit grayscale image buffer.
pub fn depth_to_gray_image(depth: &DepthMap) -> DepthResult<image::GrayImage> {
    let width = u32::try_from(depth.width()).map_err(|_| DepthError::InvalidDimensions {
        width: depth.width(),
        height: depth.height(),
    })?;
    let height = u32::try_from(depth.height()).map_err(|_| DepthError::InvalidDimensions {
        width: depth.width(),
        height: depth.height(),
    })?;
    image::GrayImage::from_raw(width, height, depth.data().to_vec()).ok_or(
        DepthError::BufferTooSmall {
            needed: depth.width() * depth.height(),
            got: depth.data().len(),
        },
    )
}

/// Encodes a depth map as a grayscale image; the format follows the extension.
pub fn save_depth_map<P: AsRef<Path>>(path: P, depth: &DepthMap) -> DepthResult<()> {
    depth_to_gray_image(depth)?
        .save(path)
        .map_err(|err| DepthError::ImageIo {
            reason: err.to_string(),
        })
}
