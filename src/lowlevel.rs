//! Low-level building blocks for custom depth pipelines.
//!
//! These expose the individual stages behind [`crate::generate_depthmap`]:
//! pyramid reduction, range tables, block statistics, the two-way matcher,
//! post-processing and the batch scheduler. Most users should prefer the
//! top-level `DepthEstimator`.

pub use crate::image::pyramid::{blend_4x4_luma, halve_2x2, LumaPyramid};
pub use crate::kernel::scalar::{LaneDot, SequentialDot};
#[cfg(feature = "simd")]
pub use crate::kernel::simd::SimdDot;
pub use crate::kernel::{BlockCache, DefaultKernel, DotKernel};
pub use crate::parallel::{run_batches, BatchCursor, Execution};
#[cfg(feature = "rayon")]
pub use crate::parallel::rayon::run_batches_par;
pub use crate::postprocess::{consistency_check, fill_holes, postprocess, rescale_disparity};
pub use crate::range::{propagate_2x2, DisparityRange, DisparityRanges};
pub use crate::search::scan::{match_pair, match_pair_with, ScanlineScratch};
