//! Per-scanline block statistics.
//!
//! For every block center `x` on the active scanline the cache holds the
//! block's `block_x * block_y` mean-subtracted samples and the norm
//! `sqrt(sum of squared deviations)`. Blocks are stored back to back: the
//! block centered at `x` occupies `samples[(x - bx/2) * n..][..n]` with
//! `n = block_x * block_y`, rows in top-to-bottom order, so matching two
//! blocks is a single straight-line dot product.

use crate::image::ImageView;
use crate::util::alloc::try_filled;
use crate::util::{DepthError, DepthResult};

/// Mean-subtracted blocks and deviation norms for one scanline.
pub struct BlockCache {
    width: usize,
    block_x: usize,
    block_y: usize,
    column_sums: Vec<f32>,
    means: Vec<f32>,
    norms: Vec<f32>,
    samples: Vec<f32>,
}

impl BlockCache {
    /// Allocates a cache for images of the given width.
    ///
    /// Block sides must be odd and greater than one.
    pub fn new(width: usize, block_x: usize, block_y: usize) -> DepthResult<Self> {
        if block_x % 2 == 0 || block_y % 2 == 0 || block_x < 3 || block_y < 3 {
            return Err(DepthError::InvalidBlockSize { block_x, block_y });
        }
        let block_count = (width + 1).saturating_sub(block_x);
        let samples_len = block_count
            .checked_mul(block_x * block_y)
            .ok_or(DepthError::InvalidDimensions { width, height: block_y })?;
        Ok(Self {
            width,
            block_x,
            block_y,
            column_sums: try_filled(width, 0.0, "block cache column sums")?,
            means: try_filled(width, 0.0, "block cache means")?,
            norms: try_filled(width, 0.0, "block cache norms")?,
            samples: try_filled(samples_len, 0.0, "block cache samples")?,
        })
    }

    /// Block width in pixels.
    pub fn block_x(&self) -> usize {
        self.block_x
    }

    /// Number of samples in one block.
    pub fn block_len(&self) -> usize {
        self.block_x * self.block_y
    }

    /// Recomputes every block centered on `scanline`.
    ///
    /// `scanline` must leave `block_y / 2` rows above and below it.
    pub fn rebuild(&mut self, image: ImageView<'_, f32>, scanline: usize) -> DepthResult<()> {
        let by_half = self.block_y / 2;
        if image.width() != self.width
            || scanline < by_half
            || scanline + by_half >= image.height()
        {
            return Err(DepthError::InvalidDimensions {
                width: image.width(),
                height: image.height(),
            });
        }
        let top = scanline - by_half;
        let bottom = scanline + by_half + 1;
        let bx_half = self.block_x / 2;
        let n = self.block_len();

        self.column_sums.fill(0.0);
        for y in top..bottom {
            let row = image.row(y).ok_or(DepthError::InvalidDimensions {
                width: image.width(),
                height: image.height(),
            })?;
            for (sum, &v) in self.column_sums.iter_mut().zip(row) {
                *sum += v;
            }
        }

        let inv_area = 1.0 / n as f32;
        for x in bx_half..self.width.saturating_sub(bx_half) {
            let sum: f32 = self.column_sums[x - bx_half..=x + bx_half].iter().sum();
            self.means[x] = sum * inv_area;
        }

        for x in bx_half..self.width.saturating_sub(bx_half) {
            let mean = self.means[x];
            let start = (x - bx_half) * n;
            let block = &mut self.samples[start..start + n];
            let mut squared = 0.0f32;
            for (dst_row, y) in block.chunks_exact_mut(self.block_x).zip(top..bottom) {
                let row = image.row(y).ok_or(DepthError::InvalidDimensions {
                    width: image.width(),
                    height: image.height(),
                })?;
                for (dst, &v) in dst_row.iter_mut().zip(&row[x - bx_half..=x + bx_half]) {
                    let d = v - mean;
                    *dst = d;
                    squared += d * d;
                }
            }
            self.norms[x] = squared.sqrt();
        }
        Ok(())
    }

    /// Mean-subtracted samples of the block centered at `x`.
    ///
    /// # Panics
    /// Panics if `x` is closer than `block_x / 2` to either edge.
    #[inline]
    pub fn block(&self, x: usize) -> &[f32] {
        let n = self.block_len();
        let start = (x - self.block_x / 2) * n;
        &self.samples[start..start + n]
    }

    /// Mean of the block centered at `x`.
    #[inline]
    pub fn mean(&self, x: usize) -> f32 {
        self.means[x]
    }

    /// Deviation norm of the block centered at `x`.
    #[inline]
    pub fn norm(&self, x: usize) -> f32 {
        self.norms[x]
    }
}
