//! Depth map generation.
//!
//! [`generate_depthmap`] runs the full pipeline: luminance pyramid, optional
//! coarse pass with range propagation, fine two-way matching, then the
//! consistency check and hole fill. The scan module holds the matcher itself.

pub mod scan;

use crate::image::pyramid::LumaPyramid;
use crate::image::{DepthMap, DepthMapPair, RgbaView};
use crate::parallel::{Backend, Execution, WorkPlan, DEFAULT_BATCH_ROWS};
use crate::postprocess::{postprocess, DEFAULT_FILL_PASSES};
use crate::range::{propagate_2x2, DisparityRanges};
use crate::trace::{trace_event, trace_span, StageTimer};
use crate::util::{DepthError, DepthResult};

use self::scan::match_pair;

/// Disparity search strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Method {
    /// Search the full range at every pixel of the quarter-size level.
    Brute,
    /// Match the eighth-size level first and search a narrow band around
    /// the doubled coarse result.
    #[default]
    Hierarchic,
}

/// Configuration for depth map generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepthConfig {
    /// Block width in pixels; odd and greater than 1.
    pub block_x: usize,
    /// Block height in pixels; odd and greater than 1.
    pub block_y: usize,
    /// Largest disparity searched at the quarter-size level, 1..=255.
    pub disp_limit: u16,
    /// Search strategy.
    pub method: Method,
    /// Worker count; 0 uses the available parallelism.
    pub threads: usize,
    /// Rows per work batch.
    pub batch_rows: usize,
    /// Number of hole-fill passes after the consistency check.
    pub fill_passes: usize,
    /// Where row batches run.
    pub backend: Backend,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            block_x: 9,
            block_y: 9,
            disp_limit: 65,
            method: Method::Hierarchic,
            threads: 0,
            batch_rows: DEFAULT_BATCH_ROWS,
            fill_passes: DEFAULT_FILL_PASSES,
            backend: Backend::Threads,
        }
    }
}

impl DepthConfig {
    /// Checks every parameter that does not depend on the input images.
    pub fn validate(&self) -> DepthResult<()> {
        let odd = |v: usize| v > 1 && v % 2 == 1;
        if !odd(self.block_x) || !odd(self.block_y) {
            return Err(DepthError::InvalidBlockSize {
                block_x: self.block_x,
                block_y: self.block_y,
            });
        }
        if self.disp_limit == 0 || self.disp_limit > 255 {
            return Err(DepthError::InvalidDisparityLimit {
                limit: usize::from(self.disp_limit),
            });
        }
        if self.batch_rows == 0 {
            return Err(DepthError::InvalidBatchSize);
        }
        Ok(())
    }

    /// Backend and work plan derived from this configuration.
    pub fn execution(&self) -> DepthResult<Execution> {
        Ok(Execution {
            backend: self.backend,
            plan: WorkPlan::new(self.threads, self.batch_rows)?,
        })
    }
}

/// Reusable depth map generator.
#[derive(Clone, Debug, Default)]
pub struct DepthEstimator {
    cfg: DepthConfig,
}

impl DepthEstimator {
    /// Creates an estimator with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: DepthConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &DepthConfig {
        &self.cfg
    }

    /// Computes the final depth map of a rectified stereo pair.
    ///
    /// The result is a quarter of the input size in each dimension.
    pub fn generate(&self, left: RgbaView<'_>, right: RgbaView<'_>) -> DepthResult<DepthMap> {
        let _span = trace_span!(
            "generate_depthmap",
            width = left.width(),
            height = left.height()
        )
        .entered();
        let total = StageTimer::start("total");
        let pair = self.generate_pair(left, right)?;

        let timer = StageTimer::start("postprocess");
        let depth = postprocess(&pair, self.cfg.disp_limit, self.cfg.fill_passes)?;
        timer.finish();
        total.finish();
        Ok(depth)
    }

    /// Computes the unfiltered left and right disparity maps of the fine pass.
    pub fn generate_pair(
        &self,
        left: RgbaView<'_>,
        right: RgbaView<'_>,
    ) -> DepthResult<DepthMapPair> {
        let cfg = &self.cfg;
        cfg.validate()?;
        check_inputs(left, right, cfg)?;
        let exec = cfg.execution()?;
        let hierarchic = cfg.method == Method::Hierarchic;

        let timer = StageTimer::start("pyramid");
        let mut left_pyr = LumaPyramid::build(left, hierarchic, &exec)?;
        let mut right_pyr = LumaPyramid::build(right, hierarchic, &exec)?;
        timer.finish();

        let fine_w = left_pyr.fine().width();
        let fine_h = left_pyr.fine().height();
        let ranges = match (left_pyr.coarse(), right_pyr.coarse()) {
            (Some(coarse_left), Some(coarse_right)) => {
                let timer = StageTimer::start("coarse_match");
                let coarse_ranges = DisparityRanges::full(
                    coarse_left.width(),
                    coarse_left.height(),
                    cfg.block_x,
                    cfg.block_y,
                    cfg.disp_limit / 2,
                )?;
                let coarse = match_pair(
                    coarse_left,
                    coarse_right,
                    &coarse_ranges,
                    cfg.block_x,
                    cfg.block_y,
                    &exec,
                )?;
                timer.finish();

                let timer = StageTimer::start("propagate");
                let ranges = propagate_2x2(
                    &coarse,
                    fine_w,
                    fine_h,
                    cfg.block_x,
                    cfg.block_y,
                    cfg.disp_limit,
                )?;
                timer.finish();
                ranges
            }
            _ => DisparityRanges::full(fine_w, fine_h, cfg.block_x, cfg.block_y, cfg.disp_limit)?,
        };
        left_pyr.release_coarse();
        right_pyr.release_coarse();

        let timer = StageTimer::start("fine_match");
        let pair = match_pair(
            left_pyr.fine(),
            right_pyr.fine(),
            &ranges,
            cfg.block_x,
            cfg.block_y,
            &exec,
        )?;
        timer.finish();
        trace_event!("depth_pair", width = fine_w, height = fine_h);
        Ok(pair)
    }
}

/// Computes the depth map of `left` and `right` with `cfg`.
pub fn generate_depthmap(
    left: RgbaView<'_>,
    right: RgbaView<'_>,
    cfg: &DepthConfig,
) -> DepthResult<DepthMap> {
    DepthEstimator::new()
        .with_config(cfg.clone())
        .generate(left, right)
}

/// Rejects inputs the pipeline cannot process before any work starts.
fn check_inputs(left: RgbaView<'_>, right: RgbaView<'_>, cfg: &DepthConfig) -> DepthResult<()> {
    let (width, height) = (left.width(), left.height());
    if right.width() != width || right.height() != height {
        return Err(DepthError::DimensionMismatch {
            left_width: width,
            left_height: height,
            right_width: right.width(),
            right_height: right.height(),
        });
    }
    if width % 4 != 0 || height % 4 != 0 {
        return Err(DepthError::NotMultipleOfFour { width, height });
    }
    let scale = match cfg.method {
        Method::Brute => 4,
        Method::Hierarchic => 8,
    };
    if width / scale < cfg.block_x || height / scale < cfg.block_y {
        return Err(DepthError::ImageTooSmall {
            width: width / scale,
            height: height / scale,
            block_x: cfg.block_x,
            block_y: cfg.block_y,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{generate_depthmap, DepthConfig, Method};
    use crate::image::OwnedRgba;
    use crate::util::DepthError;

    fn gray(width: usize, height: usize) -> OwnedRgba {
        let data = (0..width * height)
            .flat_map(|i| {
                let v = ((i * 31 + i / width * 17) % 251) as u8;
                [v, v, v, 255]
            })
            .collect();
        OwnedRgba::new(data, width, height).unwrap()
    }

    #[test]
    fn default_config_values() {
        let cfg = DepthConfig::default();
        assert_eq!((cfg.block_x, cfg.block_y), (9, 9));
        assert_eq!(cfg.disp_limit, 65);
        assert_eq!(cfg.method, Method::Hierarchic);
        assert_eq!(cfg.fill_passes, 2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        let even = DepthConfig {
            block_x: 8,
            ..DepthConfig::default()
        };
        assert!(matches!(
            even.validate(),
            Err(DepthError::InvalidBlockSize { .. })
        ));
        let one = DepthConfig {
            block_y: 1,
            ..DepthConfig::default()
        };
        assert!(one.validate().is_err());
        for limit in [0u16, 256] {
            let cfg = DepthConfig {
                disp_limit: limit,
                ..DepthConfig::default()
            };
            assert_eq!(
                cfg.validate(),
                Err(DepthError::InvalidDisparityLimit {
                    limit: usize::from(limit)
                })
            );
        }
        let rows = DepthConfig {
            batch_rows: 0,
            ..DepthConfig::default()
        };
        assert_eq!(rows.validate(), Err(DepthError::InvalidBatchSize));
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let left = gray(128, 128);
        let right = gray(128, 96);
        let err = generate_depthmap(left.view(), right.view(), &DepthConfig::default())
            .unwrap_err();
        assert!(matches!(err, DepthError::DimensionMismatch { .. }));
    }

    #[test]
    fn coarse_level_must_hold_a_block() {
        // 64 / 8 = 8 < 9
        let img = gray(64, 64);
        let err =
            generate_depthmap(img.view(), img.view(), &DepthConfig::default()).unwrap_err();
        assert_eq!(
            err,
            DepthError::ImageTooSmall {
                width: 8,
                height: 8,
                block_x: 9,
                block_y: 9
            }
        );
        let brute = DepthConfig {
            method: Method::Brute,
            ..DepthConfig::default()
        };
        let depth = generate_depthmap(img.view(), img.view(), &brute).unwrap();
        assert_eq!((depth.width(), depth.height()), (16, 16));
    }
}
