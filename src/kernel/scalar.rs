//! Scalar dot-product kernels.

use crate::kernel::DotKernel;

const LANES: usize = 4;

/// Four independent accumulators combined at the end.
///
/// Breaking the add chain lets the CPU overlap the multiplies; the result
/// differs from a sequential sum only by float rounding.
pub struct LaneDot;

impl DotKernel for LaneDot {
    #[inline]
    fn dot(left: &[f32], right: &[f32]) -> f32 {
        let n = left.len().min(right.len());
        let left = &left[..n];
        let right = &right[..n];

        let mut lanes = [0.0f32; LANES];
        let mut left_chunks = left.chunks_exact(LANES);
        let mut right_chunks = right.chunks_exact(LANES);
        for (l, r) in (&mut left_chunks).zip(&mut right_chunks) {
            lanes[0] += l[0] * r[0];
            lanes[1] += l[1] * r[1];
            lanes[2] += l[2] * r[2];
            lanes[3] += l[3] * r[3];
        }

        let mut sum = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);
        for (l, r) in left_chunks.remainder().iter().zip(right_chunks.remainder()) {
            sum += l * r;
        }
        sum
    }
}

/// Plain left-to-right accumulation, the reference for the faster kernels.
pub struct SequentialDot;

impl DotKernel for SequentialDot {
    #[inline]
    fn dot(left: &[f32], right: &[f32]) -> f32 {
        left.iter().zip(right).fold(0.0f32, |acc, (l, r)| acc + l * r)
    }
}
