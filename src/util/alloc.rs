//! Fallible buffer allocation.
//!
//! Every intermediate buffer of the pipeline goes through these helpers so an
//! out-of-memory condition surfaces as [`DepthError::AllocationFailed`]
//! instead of aborting the process.

use crate::util::{DepthError, DepthResult};

/// Allocates a vector of `len` copies of `value`.
pub(crate) fn try_filled<T: Clone>(
    len: usize,
    value: T,
    context: &'static str,
) -> DepthResult<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| DepthError::AllocationFailed {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
            context,
        })?;
    buf.resize(len, value);
    Ok(buf)
}

/// Returns `width * height`, rejecting empty or overflowing sizes.
pub(crate) fn area(width: usize, height: usize) -> DepthResult<usize> {
    if width == 0 || height == 0 {
        return Err(DepthError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(DepthError::InvalidDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::{area, try_filled};
    use crate::util::DepthError;

    #[test]
    fn try_filled_reports_impossible_sizes() {
        let err = try_filled::<u64>(usize::MAX / 4, 0, "test buffer")
            .err()
            .unwrap();
        assert!(matches!(
            err,
            DepthError::AllocationFailed {
                context: "test buffer",
                ..
            }
        ));
    }

    #[test]
    fn area_rejects_zero_sides() {
        assert_eq!(
            area(0, 3),
            Err(DepthError::InvalidDimensions {
                width: 0,
                height: 3
            })
        );
        assert_eq!(area(4, 3), Ok(12));
    }
}
