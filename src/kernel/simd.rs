//! SIMD dot-product kernel using the `wide` crate.
//!
//! Eight lanes are accumulated with `f32x8` and reduced once at the end; the
//! tail that does not fill a vector is summed in scalar code.

use crate::kernel::DotKernel;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f32 {
    let arr = v.to_array();
    ((arr[0] + arr[1]) + (arr[2] + arr[3])) + ((arr[4] + arr[5]) + (arr[6] + arr[7]))
}

/// SIMD-accelerated dot product.
pub struct SimdDot;

impl DotKernel for SimdDot {
    #[inline]
    fn dot(left: &[f32], right: &[f32]) -> f32 {
        let n = left.len().min(right.len());
        let simd_end = n / LANES * LANES;

        let mut acc = f32x8::ZERO;
        let mut i = 0;
        while i < simd_end {
            acc += load_f32x8(&left[i..]) * load_f32x8(&right[i..]);
            i += LANES;
        }

        let mut sum = hsum(acc);
        while i < n {
            sum += left[i] * right[i];
            i += 1;
        }
        sum
    }
}
