use serde::Deserialize;
use std::fmt::Display;

/// Number of Landsat-8/9 reflective bands (bands 1-7 plus the cirrus band).
pub const LANDSAT_BAND_COUNT: usize = 8;
/// Number of Sentinel-2 reflective bands when all bands are processed.
pub const SENTINEL_BAND_COUNT: usize = 13;
/// Number of Sentinel-2 reflective bands with bands 9 and 10 excluded.
pub const SENTINEL_REDUCED_BAND_COUNT: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Satellite {
    #[serde(rename(deserialize = "landsat-8"))]
    Landsat8,
    #[serde(rename(deserialize = "landsat-9"))]
    Landsat9,
    #[serde(rename(deserialize = "sentinel-2"))]
    Sentinel2,
}

/// Band range and minimum-reflectance thresholds driving one retrieval.
///
/// The thresholds are the per-band surface reflectance floors below which a
/// corrected pixel fails the plausibility test and stops the AOT search.
#[derive(Debug, Clone, Copy)]
pub struct BandPolicy {
    pub start_band: usize,
    pub end_band: usize,
    pub tth: &'static [f64],
}

static LANDSAT_TTH: [f64; LANDSAT_BAND_COUNT] =
    [1.0e-3, 1.0e-3, 0.0, 1.0e-3, 0.0, 0.0, 1.0e-4, 0.0];
static LANDSAT_TTH_WATER: [f64; LANDSAT_BAND_COUNT] =
    [1.0e-3, 1.0e-3, 0.0, 1.0e-3, 1.0e-3, 0.0, 1.0e-4, 0.0];

static SENTINEL_TTH: [f64; SENTINEL_REDUCED_BAND_COUNT] =
    [1.0e-3, 1.0e-3, 0.0, 1.0e-3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0e-4];
static SENTINEL_TTH_ALL: [f64; SENTINEL_BAND_COUNT] = [
    1.0e-3, 1.0e-3, 0.0, 1.0e-3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0e-4,
];

// Over-water thresholds hit bands 1, 4, 8a and 12. The historical set
// inherited from the FORTRAN coefficients is kept behind a feature for
// comparison runs against older products.
#[cfg(not(feature = "legacy-sentinel-water-tth"))]
static SENTINEL_TTH_WATER: [f64; SENTINEL_REDUCED_BAND_COUNT] =
    [1.0e-3, 0.0, 0.0, 1.0e-3, 0.0, 0.0, 0.0, 0.0, 1.0e-3, 0.0, 1.0e-4];
#[cfg(not(feature = "legacy-sentinel-water-tth"))]
static SENTINEL_TTH_WATER_ALL: [f64; SENTINEL_BAND_COUNT] = [
    1.0e-3, 0.0, 0.0, 1.0e-3, 0.0, 0.0, 0.0, 0.0, 1.0e-3, 0.0, 0.0, 0.0, 1.0e-4,
];

#[cfg(feature = "legacy-sentinel-water-tth")]
static SENTINEL_TTH_WATER: [f64; SENTINEL_REDUCED_BAND_COUNT] =
    [1.0e-3, 1.0e-3, 0.0, 1.0e-3, 1.0e-3, 0.0, 1.0e-4, 0.0, 0.0, 0.0, 0.0];
#[cfg(feature = "legacy-sentinel-water-tth")]
static SENTINEL_TTH_WATER_ALL: [f64; SENTINEL_BAND_COUNT] = [
    1.0e-3, 1.0e-3, 0.0, 1.0e-3, 1.0e-3, 0.0, 1.0e-4, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

impl Satellite {
    /// Number of reflective bands in the pixel arrays for this satellite.
    pub fn band_count(&self, all_sentinel_bands: bool) -> usize {
        match self {
            Satellite::Landsat8 | Satellite::Landsat9 => LANDSAT_BAND_COUNT,
            Satellite::Sentinel2 => {
                if all_sentinel_bands {
                    SENTINEL_BAND_COUNT
                } else {
                    SENTINEL_REDUCED_BAND_COUNT
                }
            }
        }
    }

    /// Band range and threshold table used by the aerosol retrieval.
    pub fn band_policy(&self, water: bool, all_sentinel_bands: bool) -> BandPolicy {
        match self {
            Satellite::Landsat8 | Satellite::Landsat9 => BandPolicy {
                start_band: 0,
                end_band: 6,
                tth: if water {
                    &LANDSAT_TTH_WATER
                } else {
                    &LANDSAT_TTH
                },
            },
            Satellite::Sentinel2 => {
                if all_sentinel_bands {
                    BandPolicy {
                        start_band: 0,
                        end_band: 12,
                        tth: if water {
                            &SENTINEL_TTH_WATER_ALL
                        } else {
                            &SENTINEL_TTH_ALL
                        },
                    }
                } else {
                    BandPolicy {
                        start_band: 0,
                        end_band: 10,
                        tth: if water {
                            &SENTINEL_TTH_WATER
                        } else {
                            &SENTINEL_TTH
                        },
                    }
                }
            }
        }
    }
}

impl Display for Satellite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Satellite::Landsat8 => write!(f, "Landsat-8"),
            Satellite::Landsat9 => write!(f, "Landsat-9"),
            Satellite::Sentinel2 => write!(f, "Sentinel-2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landsat_band_policy() {
        for sat in [Satellite::Landsat8, Satellite::Landsat9] {
            let land = sat.band_policy(false, false);
            assert_eq!(land.start_band, 0);
            assert_eq!(land.end_band, 6);
            assert_eq!(land.tth.len(), LANDSAT_BAND_COUNT);
            assert_eq!(land.tth[6], 1.0e-4);
            assert_eq!(land.tth[4], 0.0);

            let water = sat.band_policy(true, false);
            assert_eq!(water.tth[4], 1.0e-3);
        }
    }

    #[test]
    fn test_sentinel_band_policy_skips_bands_9_and_10() {
        let policy = Satellite::Sentinel2.band_policy(false, false);
        assert_eq!(policy.end_band, 10);
        assert_eq!(policy.tth.len(), SENTINEL_REDUCED_BAND_COUNT);
        // The last index maps to band 12 once bands 9 and 10 are dropped.
        assert_eq!(policy.tth[10], 1.0e-4);

        let all = Satellite::Sentinel2.band_policy(false, true);
        assert_eq!(all.end_band, 12);
        assert_eq!(all.tth.len(), SENTINEL_BAND_COUNT);
        assert_eq!(all.tth[12], 1.0e-4);
    }

    #[cfg(not(feature = "legacy-sentinel-water-tth"))]
    #[test]
    fn test_sentinel_water_thresholds_hit_bands_1_4_8a_12() {
        let policy = Satellite::Sentinel2.band_policy(true, true);
        let nonzero: Vec<usize> = (0..policy.tth.len())
            .filter(|&ib| policy.tth[ib] > 0.0)
            .collect();
        assert_eq!(nonzero, vec![0, 3, 8, 12]);
    }

    #[test]
    fn test_thresholds_align_with_band_count() {
        for sat in [
            Satellite::Landsat8,
            Satellite::Landsat9,
            Satellite::Sentinel2,
        ] {
            for all in [false, true] {
                for water in [false, true] {
                    let policy = sat.band_policy(water, all);
                    assert_eq!(policy.tth.len(), sat.band_count(all));
                    assert!(policy.end_band < sat.band_count(all));
                }
            }
        }
    }

    #[test]
    fn test_deserialize_names() {
        let sat: Satellite = serde_json::from_str("\"sentinel-2\"").unwrap();
        assert_eq!(sat, Satellite::Sentinel2);
        let sat: Satellite = serde_json::from_str("\"landsat-9\"").unwrap();
        assert_eq!(sat, Satellite::Landsat9);
    }
}
