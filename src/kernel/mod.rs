//! Block statistics and dot-product kernels for ZNCC matching.
//!
//! [`BlockCache`] turns one scanline of a luminance image into mean-subtracted
//! blocks and their deviation norms. A [`DotKernel`] multiplies two such
//! blocks; the score of a candidate is `dot / (norm_left * norm_right)`.

pub mod cache;
pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

pub use cache::BlockCache;

/// Dot product of two equally sized sample runs.
pub trait DotKernel {
    /// Returns `sum(left[i] * right[i])` over the shorter of the two slices.
    fn dot(left: &[f32], right: &[f32]) -> f32;
}

/// Kernel used by the matcher in this build.
#[cfg(not(feature = "simd"))]
pub type DefaultKernel = scalar::LaneDot;

/// Kernel used by the matcher in this build.
#[cfg(feature = "simd")]
pub type DefaultKernel = simd::SimdDot;
