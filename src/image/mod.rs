//! Image views and owned buffers.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. `OwnedImage` is the
//! contiguous buffer every pipeline stage produces; `RgbaView` borrows the
//! packed 4-byte input pixels.

use crate::util::alloc::{area, try_filled};
use crate::util::{DepthError, DepthResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod pyramid;

/// Single-channel luminance image.
pub type LumaImage = OwnedImage<f32>;

/// 8-bit disparity or depth image.
pub type DepthMap = OwnedImage<u8>;

/// Disparity maps produced by one correlation pass.
///
/// `left` holds, for each left-image anchor, the disparity of its best match in
/// the right image; `right` holds the same for right-image anchors. Both are 0
/// where nothing was matched.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthMapPair {
    /// Left-anchored disparities.
    pub left: DepthMap,
    /// Right-anchored disparities.
    pub right: DepthMap,
}

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> DepthResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> DepthResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(DepthError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        self.data.get(start..start + self.width)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> DepthResult<usize> {
    if width == 0 || height == 0 {
        return Err(DepthError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(DepthError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(DepthError::InvalidDimensions { width, height })
}

/// Owned contiguous single-channel image buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Clone> OwnedImage<T> {
    /// Wraps a row-major buffer whose length is exactly `width * height`.
    pub fn new(data: Vec<T>, width: usize, height: usize) -> DepthResult<Self> {
        let needed = area(width, height)?;
        if data.len() < needed {
            return Err(DepthError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(DepthError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Allocates an image filled with `value`, reporting allocation failure.
    pub(crate) fn filled(
        width: usize,
        height: usize,
        value: T,
        context: &'static str,
    ) -> DepthResult<Self> {
        let len = area(width, height)?;
        Ok(Self {
            data: try_filled(len, value, context)?,
            width,
            height,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major pixel buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns row `y`, or `None` past the last row.
    pub fn row(&self, y: usize) -> Option<&[T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.data.get(start..start + self.width)
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}

impl<T: Copy> OwnedImage<T> {
    /// Returns the pixel at `(x, y)`.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }
}

/// Borrowed packed RGBA image (4 bytes per pixel, alpha ignored).
#[derive(Copy, Clone)]
pub struct RgbaView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> RgbaView<'a> {
    /// Creates a view over `width * height * 4` bytes.
    pub fn new(data: &'a [u8], width: usize, height: usize) -> DepthResult<Self> {
        let needed = area(width, height)?
            .checked_mul(4)
            .ok_or(DepthError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(DepthError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data: &data[..needed],
            width,
            height,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the packed bytes of row `y` (`width * 4` bytes).
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width * 4;
        self.data.get(start..start + self.width * 4)
    }
}

/// Owned packed RGBA image, as produced by the decoder.
#[derive(Clone, Debug)]
pub struct OwnedRgba {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedRgba {
    /// Wraps `width * height * 4` packed bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> DepthResult<Self> {
        RgbaView::new(&data, width, height)?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns a borrowed view of the pixels.
    pub fn view(&self) -> RgbaView<'_> {
        RgbaView {
            data: &self.data,
            width: self.width,
            height: self.height,
        }
    }
}
