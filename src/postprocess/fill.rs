//! Hole filling from valid 4-neighbors.

use crate::image::DepthMap;
use crate::trace::trace_span;
use crate::util::DepthResult;

/// Fills zero pixels from their non-zero 4-neighbors.
///
/// Each pass starts from a copy of the previous result, so border pixels and
/// non-zero pixels pass through unchanged. An interior zero takes the average
/// of its non-zero neighbors (rounded half up) and stays 0 when all four are
/// zero. Neighbors are always read from the previous pass.
pub fn fill_holes(map: DepthMap, passes: usize) -> DepthResult<DepthMap> {
    if passes == 0 {
        return Ok(map);
    }
    let width = map.width();
    let height = map.height();
    let _span = trace_span!("fill_holes", passes = passes).entered();

    let mut src = map;
    let mut dst = DepthMap::filled(width, height, 0, "hole fill buffer")?;
    for _ in 0..passes {
        dst.data_mut().copy_from_slice(src.data());
        let prev = src.data();
        let next = dst.data_mut();
        for y in 1..height.saturating_sub(1) {
            for x in 1..width.saturating_sub(1) {
                let idx = y * width + x;
                if prev[idx] != 0 {
                    continue;
                }
                let neighbors = [
                    prev[idx - width],
                    prev[idx + width],
                    prev[idx - 1],
                    prev[idx + 1],
                ];
                let (sum, count) = neighbors
                    .iter()
                    .filter(|&&v| v != 0)
                    .fold((0u32, 0u32), |(s, c), &v| (s + u32::from(v), c + 1));
                if count > 0 {
                    next[idx] = ((sum + count / 2) / count) as u8;
                }
            }
        }
        std::mem::swap(&mut src, &mut dst);
    }
    Ok(src)
}
