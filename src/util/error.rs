//! Error types for corrdepth.

use thiserror::Error;

/// Result alias for corrdepth operations.
pub type DepthResult<T> = std::result::Result<T, DepthError>;

/// Errors that can occur while generating a depth map.
///
/// Every variant is reported before any output is handed back; the pipeline
/// never returns a partial depth map.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DepthError {
    /// Width or height is zero or overflows the address space.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The pyramid only accepts images whose sides are multiples of 4.
    #[error("dimensions {width}x{height} are not multiples of 4")]
    NotMultipleOfFour { width: usize, height: usize },
    /// Left and right images differ in size.
    #[error("image sizes differ: {left_width}x{left_height} vs {right_width}x{right_height}")]
    DimensionMismatch {
        left_width: usize,
        left_height: usize,
        right_width: usize,
        right_height: usize,
    },
    /// The backing buffer is shorter than the declared dimensions require.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Block sides must be odd and greater than one.
    #[error("block size {block_x}x{block_y} must be odd and greater than 1 on both axes")]
    InvalidBlockSize { block_x: usize, block_y: usize },
    /// Disparities are stored in 8 bits and the limit divides the rescale.
    #[error("disparity limit {limit} must be within 1..=255")]
    InvalidDisparityLimit { limit: usize },
    /// A pyramid level is smaller than one matching block.
    #[error("image {width}x{height} is smaller than block {block_x}x{block_y}")]
    ImageTooSmall {
        width: usize,
        height: usize,
        block_x: usize,
        block_y: usize,
    },
    /// Work batches must contain at least one row.
    #[error("batch size must be at least one row")]
    InvalidBatchSize,
    /// An intermediate buffer could not be allocated.
    #[error("allocation of {bytes} bytes failed for {context}")]
    AllocationFailed { bytes: usize, context: &'static str },
    /// A worker thread panicked while processing rows.
    #[error("worker thread panicked")]
    WorkerPanicked,
    /// The requested feature was not compiled in.
    #[error("not supported: {0}")]
    NotSupported(&'static str),
    /// Image decoding or encoding failed.
    #[error("image io failed: {reason}")]
    ImageIo { reason: String },
}
