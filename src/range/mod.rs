//! Per-pixel disparity search ranges.
//!
//! A [`DisparityRanges`] table bounds the correlation search at every anchor.
//! Pixels closer than half a block to any edge keep the default `[0, 0]` range
//! and are skipped by the matcher.

use crate::util::alloc::{area, try_filled};
use crate::util::DepthResult;

mod propagate;

pub use propagate::propagate_2x2;

/// Inclusive disparity interval searched at one anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisparityRange {
    /// Smallest disparity tried.
    pub min: u16,
    /// Largest disparity tried.
    pub max: u16,
}

impl DisparityRange {
    /// Creates a range; `min` must not exceed `max`.
    pub fn new(min: u16, max: u16) -> Self {
        debug_assert!(min <= max);
        Self { min, max }
    }
}

/// Row-major table of disparity ranges.
#[derive(Clone, Debug, PartialEq)]
pub struct DisparityRanges {
    data: Vec<DisparityRange>,
    width: usize,
    height: usize,
}

impl DisparityRanges {
    /// Allocates a table with every range at `[0, 0]`.
    pub fn zeroed(width: usize, height: usize) -> DepthResult<Self> {
        let len = area(width, height)?;
        Ok(Self {
            data: try_filled(len, DisparityRange::default(), "disparity ranges")?,
            width,
            height,
        })
    }

    /// Full search range `[0, min(limit, x - block_x/2)]` for every matched anchor.
    ///
    /// The upper bound shrinks near the left edge so the candidate block never
    /// starts before column 0.
    pub fn full(
        width: usize,
        height: usize,
        block_x: usize,
        block_y: usize,
        limit: u16,
    ) -> DepthResult<Self> {
        let mut table = Self::zeroed(width, height)?;
        let bx_half = block_x / 2;
        let by_half = block_y / 2;
        for y in by_half..height.saturating_sub(by_half) {
            let row = &mut table.data[y * width..(y + 1) * width];
            for (x, range) in row
                .iter_mut()
                .enumerate()
                .take(width.saturating_sub(bx_half))
                .skip(bx_half)
            {
                let max = (x - bx_half).min(usize::from(limit)) as u16;
                *range = DisparityRange::new(0, max);
            }
        }
        Ok(table)
    }

    /// Returns the table width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the table height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the range at `(x, y)`.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize) -> DisparityRange {
        self.data[y * self.width + x]
    }

    /// Returns the ranges of row `y`.
    pub fn row(&self, y: usize) -> Option<&[DisparityRange]> {
        if y >= self.height {
            return None;
        }
        self.data.get(y * self.width..(y + 1) * self.width)
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, range: DisparityRange) {
        self.data[y * self.width + x] = range;
    }
}
