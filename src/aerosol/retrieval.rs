use crate::config::Config;
use crate::correction::{LambertianKernel, ViewingConditions};
use crate::lut::{LutError, AOT_GRID, NAOT_VALS};
use crate::satellite::{BandPolicy, Satellite};

use super::minimizer::parabolic_minimum;
use super::pixel::{PixelInputs, RetrievalResult};

// Refined AOT values outside this window are discarded in favour of the
// best grid point.
const RAOT_MIN_VALID: f64 = 0.01;
const RAOT_MAX_VALID: f64 = 4.0;

// How far below the best bracket index the next pixel's search starts.
const WARM_START_BACKOFF: usize = 3;

/// Per-pixel AOT search over the 550 nm grid.
///
/// The retriever walks the AOT grid from a warm-start index, correcting
/// every participating band at each candidate and accumulating the
/// inter-band ratio residual. While the residual keeps falling it carries a
/// two-deep bracket history; once it rises (or a band drops below its
/// plausibility threshold, or the grid runs out) the bracket is refined
/// with a parabolic fit and the best candidate wins.
#[derive(Debug, Clone)]
pub struct AerosolRetriever<K> {
    satellite: Satellite,
    all_sentinel_bands: bool,
    kernel: K,
}

struct ResidualSample {
    residual: f64,
    testth: bool,
}

impl<K: LambertianKernel> AerosolRetriever<K> {
    pub fn new(satellite: Satellite, all_sentinel_bands: bool, kernel: K) -> Self {
        AerosolRetriever {
            satellite,
            all_sentinel_bands,
            kernel,
        }
    }

    pub fn from_config(config: &Config, kernel: K) -> Self {
        AerosolRetriever::new(config.satellite(), config.process_all_sentinel_bands(), kernel)
    }

    pub fn satellite(&self) -> Satellite {
        self.satellite
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Retrieves the AOT-550 nm for one pixel.
    ///
    /// `warm_start` is the grid index to begin at, normally the `iaots` of
    /// the previous pixel's result. Only the legacy kernel can fail, and
    /// only on a LUT read failure.
    pub fn retrieve(
        &self,
        pixel: &PixelInputs,
        view: &ViewingConditions,
        warm_start: usize,
    ) -> Result<RetrievalResult, LutError> {
        assert_eq!(
            pixel.band_count(),
            self.satellite.band_count(self.all_sentinel_bands),
            "pixel band arrays do not match the {} band set",
            self.satellite
        );
        let policy = self
            .satellite
            .band_policy(pixel.water, self.all_sentinel_bands);

        let warm_start = warm_start.min(NAOT_VALS - 1);
        let mut iaot = warm_start;
        let mut residual1 = 2000.0;
        let mut residual2 = 1000.0;
        let mut iaot1 = 0usize;
        let mut iaot2 = 0usize;
        let mut raot1 = 1.0e-4;
        let mut raot2 = 1.0e-6;
        let mut raot550 = AOT_GRID[iaot];

        let sample = self.residual_at(pixel, view, &policy, raot550)?;
        let mut residual = sample.residual;
        let mut testth = sample.testth;

        // Walk up the grid while the residual keeps falling and every band
        // stays above its plausibility floor.
        iaot += 1;
        while iaot < NAOT_VALS && residual < residual1 && !testth {
            residual2 = residual1;
            iaot2 = iaot1;
            raot2 = raot1;
            residual1 = residual;
            raot1 = raot550;
            iaot1 = iaot;

            raot550 = AOT_GRID[iaot];
            let sample = self.residual_at(pixel, view, &policy, raot550)?;
            residual = sample.residual;
            testth = sample.testth;
            iaot += 1;
        }

        // No local minimum was bracketed; report the starting grid value
        // and leave the warm-start hint alone.
        if iaot == 1 {
            return Ok(RetrievalResult {
                raot: raot550,
                residual,
                iaots: warm_start,
            });
        }

        // Refine with the parabola through the bracket, falling back to the
        // stopping grid value when the fit degenerates or leaves the
        // trusted window.
        let raot_saved = raot550;
        let raot_min = parabolic_minimum((raot2, residual2), (raot1, residual1), (raot550, residual))
            .filter(|x| (RAOT_MIN_VALID..=RAOT_MAX_VALID).contains(x))
            .unwrap_or(raot550);

        let refined = self.residual_at(pixel, view, &policy, raot_min)?;
        let mut residualm = refined.residual;
        let mut raot = raot_min;

        // Keep whichever candidate carries the smallest residual.
        if residualm > residual {
            residualm = residual;
            raot = raot_saved;
        }
        if residualm > residual1 {
            residualm = residual1;
            raot = raot1;
        }
        if residualm > residual2 {
            residualm = residual2;
            raot = raot2;
        }

        let iaots = if pixel.water && iaot == 1 {
            0
        } else {
            iaot2.saturating_sub(WARM_START_BACKOFF)
        };

        Ok(RetrievalResult {
            raot,
            residual: residualm,
            iaots,
        })
    }

    /// RMS residual over the participating bands at one AOT candidate.
    ///
    /// Over land every weighted band except the driver contributes its
    /// distance to the ratio prediction `erelc * ros1`; over water the
    /// corrected reflectances themselves are the errors and the driver band
    /// takes part. A non-finite reflectance is treated like a fired
    /// plausibility test with the band dropped from the sum.
    fn residual_at(
        &self,
        pixel: &PixelInputs,
        view: &ViewingConditions,
        policy: &BandPolicy,
        aot550: f64,
    ) -> Result<ResidualSample, LutError> {
        let mut testth = false;

        let ros1 = self.kernel.surface_reflectance(
            pixel.iband1,
            aot550,
            view,
            pixel.troatm[pixel.iband1],
            pixel.eps,
        )?;
        if !ros1.is_finite() {
            return Ok(ResidualSample {
                residual: f64::MAX,
                testth: true,
            });
        }
        if ros1 - policy.tth[pixel.iband1] < 0.0 {
            testth = true;
        }

        let mut sum = 0.0;
        let mut nbval = 0usize;
        for ib in policy.start_band..=policy.end_band {
            if pixel.erelc[ib] <= 0.0 {
                continue;
            }

            if pixel.water {
                let roslamb = if ib == pixel.iband1 {
                    ros1
                } else {
                    self.kernel
                        .surface_reflectance(ib, aot550, view, pixel.troatm[ib], pixel.eps)?
                };
                if !roslamb.is_finite() {
                    testth = true;
                    continue;
                }
                if roslamb - policy.tth[ib] < 0.0 {
                    testth = true;
                }
                sum += roslamb * roslamb;
                nbval += 1;
            } else {
                if ib == pixel.iband1 {
                    continue;
                }
                let roslamb = self.kernel.surface_reflectance(
                    ib,
                    aot550,
                    view,
                    pixel.troatm[ib],
                    pixel.eps,
                )?;
                if !roslamb.is_finite() {
                    testth = true;
                    continue;
                }
                if roslamb - policy.tth[ib] < 0.0 {
                    testth = true;
                }
                let point_error = roslamb - pixel.erelc[ib] * ros1;
                sum += point_error * point_error;
                nbval += 1;
            }
        }

        if nbval == 0 {
            return Ok(ResidualSample {
                residual: f64::MAX,
                testth: true,
            });
        }

        let residual = sum.sqrt() / nbval as f64;
        if !residual.is_finite() {
            return Ok(ResidualSample {
                residual: f64::MAX,
                testth: true,
            });
        }

        Ok(ResidualSample { residual, testth })
    }
}
