//! Luminance pyramid for stereo matching.
//!
//! The first level averages every 4x4 block of the packed RGBA input (integer
//! mean per channel, truncated) and converts it to luminance with Rec. 709
//! weights. The optional coarse level is a plain 2x2 float mean of the first.

use crate::image::{LumaImage, RgbaView};
use crate::parallel::{row_batches, Execution};
use crate::trace::trace_span;
use crate::util::{DepthError, DepthResult};

const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// Downsamples an RGBA image by 4 on both axes into a luminance image.
pub fn blend_4x4_luma(rgba: RgbaView<'_>, exec: &Execution) -> DepthResult<LumaImage> {
    let width = rgba.width();
    let height = rgba.height();
    if width % 4 != 0 || height % 4 != 0 {
        return Err(DepthError::NotMultipleOfFour { width, height });
    }
    let _span = trace_span!("blend_4x4", width = width, height = height).entered();

    let out_width = width / 4;
    let out_height = height / 4;
    let mut out = LumaImage::filled(out_width, out_height, 0.0, "quarter-size luminance")?;
    let rows = exec.rows_per_batch(out_height);
    let batches = row_batches(out.data_mut(), out_width, rows);
    exec.run(
        batches,
        || Ok(()),
        |_, idx, batch| {
            for (r, dst) in batch.chunks_mut(out_width).enumerate() {
                blend_row(rgba, idx * rows + r, dst)?;
            }
            Ok(())
        },
    )?;
    Ok(out)
}

fn blend_row(rgba: RgbaView<'_>, y: usize, dst: &mut [f32]) -> DepthResult<()> {
    let mut src: [&[u8]; 4] = [&[]; 4];
    for (j, row) in src.iter_mut().enumerate() {
        *row = rgba.row(y * 4 + j).ok_or(DepthError::InvalidDimensions {
            width: rgba.width(),
            height: rgba.height(),
        })?;
    }

    for (x, out) in dst.iter_mut().enumerate() {
        let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);
        for row in &src {
            for px in row[x * 16..x * 16 + 16].chunks_exact(4) {
                r += u32::from(px[0]);
                g += u32::from(px[1]);
                b += u32::from(px[2]);
            }
        }
        *out = LUMA_R * (r >> 4) as f32 + LUMA_G * (g >> 4) as f32 + LUMA_B * (b >> 4) as f32;
    }
    Ok(())
}

/// Halves a luminance image with an unweighted 2x2 mean.
///
/// Odd trailing rows and columns are dropped.
pub fn halve_2x2(src: &LumaImage, exec: &Execution) -> DepthResult<LumaImage> {
    let out_width = src.width() / 2;
    let out_height = src.height() / 2;
    let _span = trace_span!("halve_2x2", width = out_width, height = out_height).entered();

    let mut out = LumaImage::filled(out_width, out_height, 0.0, "half-size luminance")?;
    let rows = exec.rows_per_batch(out_height);
    let batches = row_batches(out.data_mut(), out_width, rows);
    let src_width = src.width();
    let data = src.data();
    exec.run(
        batches,
        || Ok(()),
        |_, idx, batch| {
            for (r, dst) in batch.chunks_mut(out_width).enumerate() {
                let y = idx * rows + r;
                let top = &data[2 * y * src_width..(2 * y + 1) * src_width];
                let bottom = &data[(2 * y + 1) * src_width..(2 * y + 2) * src_width];
                for (x, out) in dst.iter_mut().enumerate() {
                    let sum = top[2 * x] + top[2 * x + 1] + bottom[2 * x] + bottom[2 * x + 1];
                    *out = sum / 4.0;
                }
            }
            Ok(())
        },
    )?;
    Ok(out)
}

/// Luminance levels of one stereo image.
pub struct LumaPyramid {
    quarter: LumaImage,
    eighth: Option<LumaImage>,
}

impl LumaPyramid {
    /// Builds the quarter-size level and, if requested, its 2x2 reduction.
    pub fn build(rgba: RgbaView<'_>, with_coarse: bool, exec: &Execution) -> DepthResult<Self> {
        let quarter = blend_4x4_luma(rgba, exec)?;
        let eighth = if with_coarse {
            Some(halve_2x2(&quarter, exec)?)
        } else {
            None
        };
        Ok(Self { quarter, eighth })
    }

    /// Matching level at 1/4 of the input resolution.
    pub fn fine(&self) -> &LumaImage {
        &self.quarter
    }

    /// Coarse level at 1/8 of the input resolution, if built.
    pub fn coarse(&self) -> Option<&LumaImage> {
        self.eighth.as_ref()
    }

    /// Drops the coarse level once the coarse pass has consumed it.
    pub fn release_coarse(&mut self) {
        self.eighth = None;
    }
}
