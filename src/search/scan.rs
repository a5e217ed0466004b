//! Two-way ZNCC scanline matching.
//!
//! One scan over (left anchor, disparity) pairs yields both depth maps: every
//! pair `(x, d)` is also the pair `(x - d, d)` seen from the right image, so a
//! per-scanline tracker of the best score per right anchor builds the
//! right-referenced map from the very same scores.

use crate::image::{DepthMap, DepthMapPair, ImageView, LumaImage};
use crate::kernel::{BlockCache, DefaultKernel, DotKernel};
use crate::parallel::{row_batches, Execution};
use crate::range::DisparityRanges;
use crate::trace::{trace_event, trace_span};
use crate::util::alloc::try_filled;
use crate::util::{DepthError, DepthResult};

/// Matches two luminance images over the given per-pixel ranges.
pub fn match_pair(
    left: &LumaImage,
    right: &LumaImage,
    ranges: &DisparityRanges,
    block_x: usize,
    block_y: usize,
    exec: &Execution,
) -> DepthResult<DepthMapPair> {
    match_pair_with::<DefaultKernel>(left, right, ranges, block_x, block_y, exec)
}

/// [`match_pair`] with an explicit dot-product kernel.
pub fn match_pair_with<K: DotKernel>(
    left: &LumaImage,
    right: &LumaImage,
    ranges: &DisparityRanges,
    block_x: usize,
    block_y: usize,
    exec: &Execution,
) -> DepthResult<DepthMapPair> {
    let width = left.width();
    let height = left.height();
    if right.width() != width || right.height() != height {
        return Err(DepthError::DimensionMismatch {
            left_width: width,
            left_height: height,
            right_width: right.width(),
            right_height: right.height(),
        });
    }
    if ranges.width() != width || ranges.height() != height {
        return Err(DepthError::InvalidDimensions {
            width: ranges.width(),
            height: ranges.height(),
        });
    }
    if width < block_x || height < block_y {
        return Err(DepthError::ImageTooSmall {
            width,
            height,
            block_x,
            block_y,
        });
    }
    let _span = trace_span!("match_pair", width = width, height = height).entered();

    let mut out_left = DepthMap::filled(width, height, 0, "left depth map")?;
    let mut out_right = DepthMap::filled(width, height, 0, "right depth map")?;
    let rows = exec.rows_per_batch(height);
    let batches: Vec<(&mut [u8], &mut [u8])> = row_batches(out_left.data_mut(), width, rows)
        .into_iter()
        .zip(row_batches(out_right.data_mut(), width, rows))
        .collect();

    let by_half = block_y / 2;
    let left_view = left.view();
    let right_view = right.view();
    exec.run(
        batches,
        || ScanlineScratch::new(width, block_x, block_y),
        |scratch, idx, (left_rows, right_rows)| {
            let row_pairs = left_rows
                .chunks_mut(width)
                .zip(right_rows.chunks_mut(width));
            for (r, (left_row, right_row)) in row_pairs.enumerate() {
                let y = idx * rows + r;
                if y < by_half || y + by_half >= height {
                    continue;
                }
                scratch.match_scanline::<K>(
                    left_view, right_view, ranges, y, left_row, right_row,
                )?;
            }
            Ok(())
        },
    )?;

    trace_event!("match_pair_done", rows = height.saturating_sub(2 * by_half));
    Ok(DepthMapPair {
        left: out_left,
        right: out_right,
    })
}

/// Worker-private state for matching one scanline at a time.
pub struct ScanlineScratch {
    left: BlockCache,
    right: BlockCache,
    best_right: Vec<f32>,
}

impl ScanlineScratch {
    /// Allocates caches and the right-anchor tracker for one worker.
    pub fn new(width: usize, block_x: usize, block_y: usize) -> DepthResult<Self> {
        Ok(Self {
            left: BlockCache::new(width, block_x, block_y)?,
            right: BlockCache::new(width, block_x, block_y)?,
            best_right: try_filled(width, f32::NEG_INFINITY, "right-anchor scores")?,
        })
    }

    /// Fills row `y` of both depth maps.
    ///
    /// Scores that are not finite (flat blocks) never win. Ties keep the
    /// smallest disparity for left anchors and the first left anchor seen
    /// for right anchors.
    pub fn match_scanline<K: DotKernel>(
        &mut self,
        left: ImageView<'_, f32>,
        right: ImageView<'_, f32>,
        ranges: &DisparityRanges,
        y: usize,
        out_left: &mut [u8],
        out_right: &mut [u8],
    ) -> DepthResult<()> {
        self.left.rebuild(left, y)?;
        self.right.rebuild(right, y)?;
        self.best_right.fill(f32::NEG_INFINITY);

        let width = left.width();
        let range_row = ranges.row(y).ok_or(DepthError::InvalidDimensions {
            width: ranges.width(),
            height: ranges.height(),
        })?;
        let bx_half = self.left.block_x() / 2;

        for x in bx_half..width - bx_half {
            let range = range_row[x];
            let block = self.left.block(x);
            let norm = self.left.norm(x);
            let max_d = usize::from(range.max)
                .min(x - bx_half)
                .min(usize::from(u8::MAX));

            let mut best = f32::NEG_INFINITY;
            let mut best_d = 0u8;
            for d in usize::from(range.min)..=max_d {
                let xr = x - d;
                let score = K::dot(block, self.right.block(xr)) / (norm * self.right.norm(xr));
                if !score.is_finite() {
                    continue;
                }
                if score > best {
                    best = score;
                    best_d = d as u8;
                }
                if score > self.best_right[xr] {
                    self.best_right[xr] = score;
                    out_right[xr] = d as u8;
                }
            }
            out_left[x] = best_d;
        }
        Ok(())
    }
}
