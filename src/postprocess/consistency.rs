//! Consistency check between the two disparity maps and rescaling to 8 bits.

use crate::image::{DepthMap, DepthMapPair};
use crate::trace::{trace_event, trace_span};
use crate::util::{DepthError, DepthResult};

/// Maps a disparity in `0..=limit` onto `0..=255`.
///
/// Computes `floor(d * 255.5 / limit + 0.5)` (round half up), saturating at
/// 255. `limit` must be non-zero.
#[inline]
pub fn rescale_disparity(d: u8, limit: u16) -> u8 {
    let scaled = (f32::from(d) * 255.5 / f32::from(limit) + 0.5).floor();
    scaled.min(255.0) as u8
}

/// Keeps left disparities confirmed by the right map, rescaled to 8 bits.
///
/// For `l = left[x, y]` the right map is read at `x - l`; the pixel survives
/// when `|l - right[x - l, y]| <= 1` and becomes 0 otherwise.
pub fn consistency_check(pair: &DepthMapPair, limit: u16) -> DepthResult<DepthMap> {
    let width = pair.left.width();
    let height = pair.left.height();
    if pair.right.width() != width || pair.right.height() != height {
        return Err(DepthError::DimensionMismatch {
            left_width: width,
            left_height: height,
            right_width: pair.right.width(),
            right_height: pair.right.height(),
        });
    }
    if limit == 0 {
        return Err(DepthError::InvalidDisparityLimit { limit: 0 });
    }
    let _span = trace_span!("consistency_check", width = width, height = height).entered();

    let mut out = DepthMap::filled(width, height, 0, "consistency output")?;
    let mut rejected = 0usize;
    let rows = pair
        .left
        .data()
        .chunks_exact(width)
        .zip(pair.right.data().chunks_exact(width))
        .zip(out.data_mut().chunks_exact_mut(width));
    for ((left, right), dst) in rows {
        for (x, (&l, d)) in left.iter().zip(dst.iter_mut()).enumerate() {
            let agrees = x
                .checked_sub(usize::from(l))
                .map(|xr| right[xr].abs_diff(l) <= 1)
                .unwrap_or(false);
            if agrees {
                *d = rescale_disparity(l, limit);
            } else {
                rejected += 1;
            }
        }
    }
    trace_event!("consistency_check", rejected = rejected);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{consistency_check, rescale_disparity};
    use crate::image::{DepthMap, DepthMapPair};

    #[test]
    fn rescale_spans_full_range() {
        assert_eq!(rescale_disparity(0, 65), 0);
        assert_eq!(rescale_disparity(65, 65), 255);
        assert_eq!(rescale_disparity(255, 255), 255);
        // 5 * 255.5 / 16 = 79.84
        assert_eq!(rescale_disparity(5, 16), 80);
        // Above the limit saturates instead of wrapping.
        assert_eq!(rescale_disparity(40, 16), 255);
    }

    #[test]
    fn rescale_rounds_half_up() {
        // 2 * 255.5 / 7 = 73.0 exactly.
        assert_eq!(rescale_disparity(2, 7), 73);
        assert_eq!(rescale_disparity(1, 1), 255);
        // 1 * 255.5 / 73 = 3.5 exactly, rounds up.
        assert_eq!(rescale_disparity(1, 73), 4);
    }

    #[test]
    fn keeps_only_consistent_pixels() {
        let width = 6;
        let left = DepthMap::new(vec![0, 1, 2, 2, 3, 9], width, 1).unwrap();
        // right[x - l]: x=1 -> right[0]=1 ok; x=2 -> right[0]=1 ok (|2-1|<=1);
        // x=3 -> right[1]=5 reject; x=4 -> right[1]=5 reject (|3-5|=2);
        // x=5, l=9 points before column 0 -> reject.
        let right = DepthMap::new(vec![1, 5, 0, 0, 0, 0], width, 1).unwrap();
        let pair = DepthMapPair { left, right };
        let out = consistency_check(&pair, 10).unwrap();
        let expected = [
            0, // x=0, l=0, right[0]=1 agrees, rescale(0)=0
            rescale_disparity(1, 10),
            rescale_disparity(2, 10),
            0,
            0,
            0,
        ];
        assert_eq!(out.data(), &expected);
    }
}
