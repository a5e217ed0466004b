//! corrdepth computes dense disparity maps from rectified stereo pairs.
//!
//! Both images are reduced to quarter-size luminance, matched block by block
//! with zero-mean normalized cross-correlation (ZNCC), and the resulting left
//! and right disparity maps are cross-checked and hole-filled. The default
//! hierarchical search matches an eighth-size level first and narrows the
//! per-pixel search range before the fine pass. Rows are distributed over
//! scoped worker threads, or the rayon pool with the `rayon` feature; the
//! `simd` feature switches the correlation kernel to `wide` vectors.

pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod parallel;
pub mod postprocess;
pub mod range;
pub mod search;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use image::io;
pub use image::{DepthMap, DepthMapPair, ImageView, LumaImage, OwnedImage, OwnedRgba, RgbaView};
pub use parallel::{Backend, WorkPlan};
pub use search::{generate_depthmap, DepthConfig, DepthEstimator, Method};
pub use util::{DepthError, DepthResult};
