//! Coarse-to-fine propagation of disparity ranges.

use crate::image::DepthMapPair;
use crate::range::{DisparityRange, DisparityRanges};
use crate::trace::trace_span;
use crate::util::DepthResult;

/// Offset of the two extra coarse samples taken beside the seed.
const EDGE_PROBE: usize = 2;

/// Derives full-resolution search ranges from a half-resolution depth pair.
///
/// `width`, `height` and `limit` describe the full-resolution level. The seed
/// is the coarse left disparity under the pixel; an unmatched seed (0) widens
/// to `limit - 1`. The range is widened by one step on each side, by the left
/// map two coarse pixels away on either side, and by the right map over the
/// seed's own disparity span, then clipped so the candidate block stays inside
/// the image and the disparity stays within `limit`.
pub fn propagate_2x2(
    coarse: &DepthMapPair,
    width: usize,
    height: usize,
    block_x: usize,
    block_y: usize,
    limit: u16,
) -> DepthResult<DisparityRanges> {
    let _span = trace_span!("propagate_2x2", width = width, height = height).entered();

    let mut ranges = DisparityRanges::zeroed(width, height)?;
    let bx_half = block_x / 2;
    let by_half = block_y / 2;
    let coarse_width = coarse.left.width();
    let limit = i32::from(limit);

    for y in by_half..height.saturating_sub(by_half) {
        let (Some(left), Some(right)) = (coarse.left.row(y / 2), coarse.right.row(y / 2)) else {
            continue;
        };
        for x in bx_half..width.saturating_sub(bx_half) {
            let hx = x / 2;
            if hx >= coarse_width {
                continue;
            }

            let mut val = i32::from(left[hx]);
            if val == 0 {
                val = (limit - 1).max(0);
            }
            // TODO: measure whether this +-1 step still matters now that the
            // neighbor probes below widen the range as well.
            let mut max = val + 1;
            let mut min = if val > 0 { val - 1 } else { val };

            let probes = [
                hx.checked_sub(EDGE_PROBE),
                Some(hx + EDGE_PROBE).filter(|&px| px < coarse_width),
            ];
            for px in probes.into_iter().flatten() {
                let v = i32::from(left[px]);
                max = max.max(v);
                min = min.min(v);
            }

            for i in 0..=val as usize {
                let Some(px) = hx.checked_sub(i) else {
                    break;
                };
                let v = i32::from(right[px]);
                max = max.max(v);
                min = min.min(v);
            }

            let bound = ((x - bx_half) as i32 / 2).min(limit / 2);
            min = min.min(bound);
            max = max.min(bound);
            ranges.set(x, y, DisparityRange::new((min * 2) as u16, (max * 2) as u16));
        }
    }

    Ok(ranges)
}
