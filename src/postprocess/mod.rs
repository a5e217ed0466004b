//! Left-right consistency check and hole filling.
//!
//! A left disparity is kept only when the right map, looked up at the pixel it
//! points to, agrees within one step. Kept disparities are rescaled to the
//! full 8-bit range; rejected pixels become 0 and are then filled from their
//! neighbors.

mod consistency;
mod fill;

pub use consistency::{consistency_check, rescale_disparity};
pub use fill::fill_holes;

use crate::image::{DepthMap, DepthMapPair};
use crate::util::DepthResult;

/// Default number of hole-fill passes.
pub const DEFAULT_FILL_PASSES: usize = 2;

/// Runs the consistency check followed by `passes` hole-fill passes.
pub fn postprocess(pair: &DepthMapPair, limit: u16, passes: usize) -> DepthResult<DepthMap> {
    let checked = consistency_check(pair, limit)?;
    fill_holes(checked, passes)
}
